//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `RunState`: The lifecycle of a crawl run (idle, running, completed, aborted, cancelled)
//! - `CrawlStats`: The counters a run accumulates

mod run_state;
mod stats;

// Re-export main types
pub use run_state::RunState;
pub use stats::CrawlStats;
