//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Per-portal extraction (`sources`)
//! - Listing traversal (`Paginator`)
//! - Concurrent detail fetching (`DetailHarvester`)
//! - Expired-job filtering (`DeadlineFilter`)
//! - Email backfill (`EmailReconciler`)

pub mod deadline;
pub mod sources;

mod harvester;
mod paginator;
mod reconciler;

pub use deadline::{DeadlineFilter, parse_deadline};
pub use harvester::{DetailHarvester, HarvestOutcome};
pub use paginator::Paginator;
pub use reconciler::{EmailReconciler, ReconcileSummary};
pub use sources::{SourceExtractor, SourceRegistry};
