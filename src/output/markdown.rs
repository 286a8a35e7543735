//! Markdown report generation
//!
//! This module renders a run report as markdown: run parameters, statistics,
//! one section per analysis and a table of items.

use crate::catalog::Item;
use crate::output::traits::{OutputResult, RunReport};
use crate::storage::{format_price, AnalysisResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes a markdown report to a file
///
/// # Arguments
///
/// * `report` - The report data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn generate_markdown_report(report: &RunReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a run report as markdown
///
/// # Arguments
///
/// * `report` - The report data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_report(report: &RunReport) -> String {
    let mut md = String::new();

    md.push_str("# Shelf-Crawler Report\n\n");
    md.push_str(&format!(
        "Generated {}\n\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    // Run parameters
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed URL**: {}\n", report.seed_url));
    md.push_str(&format!("- **Page Budget**: {}\n", report.max_pages));
    md.push_str(&format!("- **State**: {}\n\n", report.state));

    // Statistics
    md.push_str("## Statistics\n\n");
    md.push_str("| Statistic | Value |\n");
    md.push_str("|-----------|-------|\n");
    for (label, value) in &report.stats {
        md.push_str(&format!("| {} | {} |\n", label, escape_cell(value)));
    }
    md.push('\n');

    // Analyses
    if !report.analyses.is_empty() {
        md.push_str("## Analyses\n\n");
        for analysis in &report.analyses {
            push_analysis(&mut md, analysis);
        }
    }

    // Items
    md.push_str(&format!("## Items ({})\n\n", report.items.len()));
    if report.items.is_empty() {
        md.push_str("_No items._\n");
    } else {
        md.push_str("| # | Title | Authors | Price | Publisher | Year |\n");
        md.push_str("|---|-------|---------|-------|-----------|------|\n");
        for (idx, item) in report.items.iter().enumerate() {
            md.push_str(&item_row(idx + 1, item));
        }
    }

    md
}

fn push_analysis(md: &mut String, analysis: &AnalysisResult) {
    md.push_str(&format!("### {}\n\n", analysis.name));
    if let Some(parameter) = &analysis.parameter {
        md.push_str(&format!("_Parameter: {}_\n\n", parameter));
    }

    if analysis.lines.is_empty() {
        md.push_str("_No results._\n\n");
        return;
    }

    for (idx, line) in analysis.lines.iter().enumerate() {
        md.push_str(&format!("{}. {}\n", idx + 1, line));
    }
    md.push('\n');
}

fn item_row(position: usize, item: &Item) -> String {
    let missing = || "-".to_string();

    format!(
        "| {} | [{}]({}) | {} | {} | {} | {} |\n",
        position,
        escape_cell(&item.title),
        item.url,
        item.authors_display()
            .map(|authors| escape_cell(&authors))
            .unwrap_or_else(missing),
        item.price.map(format_price).unwrap_or_else(missing),
        item.publisher
            .as_deref()
            .map(escape_cell)
            .unwrap_or_else(missing),
        item.year.map(|y| y.to_string()).unwrap_or_else(missing),
    )
}

/// Escapes characters that would break a table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
