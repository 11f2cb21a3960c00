// src/models/mod.rs

//! Domain models for the job crawler.

mod config;
mod job;

pub use config::{
    Config, CrawlerConfig, CyberparkFeedConfig, InfoparkConfig, RemoteConfig, SourcesConfig,
    StorageConfig, TechnoparkConfig, UlCyberparkConfig,
};
pub use job::{
    JobDetails, JobField, JobRecord, JobSummary, ListingPage, NextPage, PageCursor, Source,
};
