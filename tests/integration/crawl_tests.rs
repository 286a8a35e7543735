//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small bookshop and run the full
//! crawl cycle end-to-end over HTTP, including persistence and reporting.

use rust_decimal::Decimal;
use shelf_crawler::config::{
    Config, CrawlerConfig, ListingFailurePolicy, OutputConfig, UserAgentConfig,
};
use shelf_crawler::crawler::{crawl, ProgressCallback};
use shelf_crawler::output::{build_report, format_markdown_report, generate_markdown_report};
use shelf_crawler::storage::{SqliteStorage, Storage};
use shelf_crawler::RunState;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with no pacing delays
fn create_test_config(base_url: &str, max_pages: u32, db_path: &str, report_path: &str) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: Some(format!("{}/szukaj", base_url)),
            search_url: None,
            max_pages,
            request_delay: 0,
            page_delay: 0,
            listing_failure: ListingFailurePolicy::Abort,
        },
        user_agent: UserAgentConfig {
            name: "ShelfCrawlerTest/1.0".to_string(),
        },
        output: OutputConfig {
            database_path: db_path.to_string(),
            report_path: report_path.to_string(),
            report_limit: 5,
        },
    }
}

fn listing_page(books: &[(&str, &str, &str)], next: Option<&str>) -> String {
    let mut html = String::from("<html><body><div class=\"products\">");
    for (href, name, price) in books {
        html.push_str(&format!(
            r#"<a class="ecommerce-datalayer" href="{}" data-name="{}" data-price="{}">{}</a>"#,
            href, name, price, name
        ));
    }
    html.push_str("</div>");
    if let Some(next) = next {
        html.push_str(&format!(
            r#"<ul class="pagination"><li class="next"><a href="{}">Następna</a></li></ul>"#,
            next
        ));
    }
    html.push_str("</body></html>");
    html
}

fn detail_page(author: &str, publisher: &str, year: &str) -> String {
    format!(
        r#"<html><body>
        <div class="product-info-author">Autor: {}</div>
        <table>
          <tr><th>Wydawnictwo</th><td>{}</td></tr>
          <tr><th>Rok wydania</th><td>{}</td></tr>
        </table>
        </body></html>"#,
        author, publisher, year
    )
}

async fn mount_html(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Two listing pages, four distinct books, one repeated, one without author
async fn mount_shop(server: &MockServer) {
    mount_html(
        server,
        "/szukaj",
        listing_page(
            &[
                ("/solaris-p-1.html", "Solaris", "39,90"),
                ("/eden-p-2.html", "Eden", "29,90"),
                ("/kalendarz-p-3.html", "Kalendarz 2025", "15,00"),
            ],
            Some("/szukaj/2"),
        ),
    )
    .await;

    mount_html(
        server,
        "/szukaj/2",
        listing_page(
            &[
                ("/solaris-p-1.html", "Solaris", "39,90"),
                ("/diuna-p-4.html", "Diuna", "59,00"),
            ],
            Some("/szukaj/3"),
        ),
    )
    .await;

    mount_html(
        server,
        "/solaris-p-1.html",
        detail_page("Stanisław Lem", "Wydawnictwo Literackie", "2021"),
    )
    .await;
    mount_html(
        server,
        "/eden-p-2.html",
        detail_page("Stanisław Lem", "Wydawnictwo Literackie", "2016"),
    )
    .await;
    mount_html(
        server,
        "/kalendarz-p-3.html",
        detail_page("Nieznany", "Kalendarze", "2024"),
    )
    .await;
    mount_html(
        server,
        "/diuna-p-4.html",
        detail_page("Frank Herbert", "Rebis", "2022"),
    )
    .await;
}

#[tokio::test]
async fn test_full_crawl_over_two_pages() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_shop(&mock_server).await;

    let config = create_test_config(&base_url, 2, "unused.db", "unused.md");
    let seed = format!("{}/szukaj", base_url);

    let outcome = crawl(&config, &seed, CancellationToken::new(), None)
        .await
        .expect("crawl should start");

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.stats.pages_processed, 2);
    assert_eq!(outcome.stats.total_found, 5);
    assert_eq!(outcome.stats.duplicates_rejected, 1);
    assert_eq!(outcome.stats.missing_author_rejected, 1);
    assert_eq!(outcome.stats.unique_added, 3);

    let titles: Vec<&str> = outcome.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Solaris", "Eden", "Diuna"]);

    let solaris = &outcome.items[0];
    assert_eq!(solaris.url, format!("{}/solaris-p-1.html", base_url));
    assert_eq!(solaris.authors, vec!["Stanisław Lem"]);
    assert_eq!(solaris.price, Some(Decimal::new(3990, 2)));
    assert_eq!(solaris.publisher.as_deref(), Some("Wydawnictwo Literackie"));
    assert_eq!(solaris.year, Some(2021));

    // The budget stops the crawl before the third listing page
    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert!(requests.iter().all(|r| r.url.path() != "/szukaj/3"));
}

#[tokio::test]
async fn test_listing_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_shop(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/szukaj/3"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, 5, "unused.db", "unused.md");
    let seed = format!("{}/szukaj", base_url);

    let outcome = crawl(&config, &seed, CancellationToken::new(), None)
        .await
        .expect("crawl should start");

    assert_eq!(outcome.state, RunState::Aborted);
    assert_eq!(outcome.stats.pages_processed, 3);
    assert_eq!(outcome.stats.listing_fetch_failures, 1);
    // Items gathered before the failure are kept
    assert_eq!(outcome.items.len(), 3);
}

#[tokio::test]
async fn test_detail_failure_keeps_listing_data() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/szukaj",
        listing_page(
            &[
                ("/solaris-p-1.html", "Solaris", "39,90"),
                ("/zaginiona-p-9.html", "Zaginiona", "10,00"),
            ],
            None,
        ),
    )
    .await;
    mount_html(
        &mock_server,
        "/solaris-p-1.html",
        detail_page("Stanisław Lem", "Wydawnictwo Literackie", "2021"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/zaginiona-p-9.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, 2, "unused.db", "unused.md");
    let seed = format!("{}/szukaj", base_url);

    let outcome = crawl(&config, &seed, CancellationToken::new(), None)
        .await
        .expect("crawl should start");

    // No next link: the frontier runs dry before the budget
    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.stats.pages_processed, 1);
    assert_eq!(outcome.stats.detail_fetch_failures, 1);
    // Without a detail page there is no author, so the filter drops it
    assert_eq!(outcome.stats.missing_author_rejected, 1);
    assert_eq!(outcome.items.len(), 1);
}

#[tokio::test]
async fn test_progress_messages_are_delivered() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_shop(&mock_server).await;

    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let progress: ProgressCallback = Arc::new(move |message: &str| {
        sink.lock().unwrap().push(message.to_string());
    });

    let config = create_test_config(&base_url, 1, "unused.db", "unused.md");
    let seed = format!("{}/szukaj", base_url);

    crawl(&config, &seed, CancellationToken::new(), Some(progress))
        .await
        .expect("crawl should start");

    let messages = messages.lock().unwrap();
    assert!(messages.first().unwrap().starts_with("Starting crawl of"));
    assert!(messages.iter().any(|m| m == "Added: Solaris"));
    assert!(messages.last().unwrap().starts_with("Crawl completed"));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_shop(&mock_server).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = create_test_config(&base_url, 2, "unused.db", "unused.md");
    let seed = format!("{}/szukaj", base_url);

    let outcome = crawl(&config, &seed, cancel, None)
        .await
        .expect("crawl should start");

    assert_eq!(outcome.state, RunState::Cancelled);
    assert!(outcome.items.is_empty());
    assert_eq!(outcome.stats.pages_processed, 0);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let config = create_test_config("http://127.0.0.1:9", 2, "unused.db", "unused.md");

    let result = crawl(&config, "not a url", CancellationToken::new(), None).await;
    assert!(result.is_err());

    let result = crawl(&config, "ftp://shop.test/list", CancellationToken::new(), None).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_crawl_persists_and_reports() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_shop(&mock_server).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("shelf.db");
    let report_path = temp_dir.path().join("report.md");

    let config = create_test_config(
        &base_url,
        2,
        db_path.to_str().unwrap(),
        report_path.to_str().unwrap(),
    );
    let seed = format!("{}/szukaj", base_url);

    let mut storage = SqliteStorage::new(&db_path).expect("Failed to open database");
    let run_id = storage
        .create_run("test-hash", &seed, config.crawler.max_pages)
        .unwrap();

    let outcome = crawl(&config, &seed, CancellationToken::new(), None)
        .await
        .expect("crawl should start");

    assert_eq!(storage.save_items(run_id, &outcome.items).unwrap(), 3);
    storage
        .finish_run(run_id, outcome.state, &outcome.stats)
        .unwrap();

    let run = storage.get_latest_run().unwrap().expect("run should exist");
    assert_eq!(run.id, run_id);
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.stats, outcome.stats);
    assert_eq!(storage.count_items().unwrap(), 3);

    let most_expensive = storage.most_expensive(1).unwrap();
    assert_eq!(most_expensive.lines, vec!["Diuna - Frank Herbert (59.00 PLN)"]);

    let report = build_report(&storage, &run, None, config.output.report_limit).unwrap();
    generate_markdown_report(&report, &report_path).unwrap();

    let written = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(written, format_markdown_report(&report));
    assert!(written.contains("- **State**: completed"));
    assert!(written.contains("| Items added | 3 |"));
    assert!(written.contains("## Items (3)"));
    assert!(written.contains("### Top authors"));
}

#[tokio::test]
async fn test_second_run_updates_existing_items() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    mount_shop(&mock_server).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("shelf.db");
    let config = create_test_config(&base_url, 2, db_path.to_str().unwrap(), "unused.md");
    let seed = format!("{}/szukaj", base_url);

    let mut storage = SqliteStorage::new(&db_path).expect("Failed to open database");

    for _ in 0..2 {
        let run_id = storage.create_run("test-hash", &seed, 2).unwrap();
        let outcome = crawl(&config, &seed, CancellationToken::new(), None)
            .await
            .expect("crawl should start");
        storage.save_items(run_id, &outcome.items).unwrap();
        storage
            .finish_run(run_id, outcome.state, &outcome.stats)
            .unwrap();
    }

    // Upserts by URL: the second run adds no new rows
    assert_eq!(storage.count_items().unwrap(), 3);
    assert_eq!(storage.get_latest_run().unwrap().unwrap().id, 2);
}
