//! Pipeline entry points for crawler operations.
//!
//! - `run_pipeline`: Crawl every enabled source, drop expired jobs, persist,
//!   then backfill missing emails
//! - `run_reconcile`: Backfill missing emails for already stored jobs

pub mod crawl;
pub mod pipeline;
pub mod reconcile;

pub use crawl::{CrawlOutcome, SourceCrawl, crawl_all, crawl_source};
pub use pipeline::{RunOptions, RunSummary, run_pipeline};
pub use reconcile::run_reconcile;
