//! Remote job table behind a Supabase (PostgREST) endpoint.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::{JobField, JobRecord, RemoteConfig};
use crate::storage::JobSink;

/// Links per existence query; keeps the request line short.
const LINK_CHUNK: usize = 50;

#[derive(Debug, Deserialize)]
struct LinkRow {
    link: String,
}

pub struct RemoteStore {
    client: Client,
    endpoint: String,
}

impl RemoteStore {
    /// Build the store when both URL and key are configured.
    ///
    /// A partial or unusable remote setup disables remote writes with a
    /// warning; it never fails the caller.
    pub fn from_config(config: &RemoteConfig, timeout_secs: u64) -> Option<Self> {
        let url = config.url.as_deref().map(str::trim).unwrap_or_default();
        if url.is_empty() {
            return None;
        }
        let Some(key) = config.key.as_deref().map(str::trim).filter(|k| !k.is_empty()) else {
            log::warn!("Remote store URL set without a key; remote writes disabled");
            return None;
        };
        match Self::new(url, key, &config.table, Duration::from_secs(timeout_secs)) {
            Ok(store) => Some(store),
            Err(e) => {
                log::warn!("Remote store unavailable ({}); remote writes disabled", e);
                None
            }
        }
    }

    pub fn new(base_url: &str, key: &str, table: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key).map_err(|_| AppError::config("invalid remote store key"))?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|_| AppError::config("invalid remote store key"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: table_endpoint(base_url, table),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Which of `links` the remote table already holds.
    async fn existing_links(&self, links: &[&str]) -> Result<HashSet<String>> {
        let mut found = HashSet::new();
        for chunk in links.chunks(LINK_CHUNK) {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("select", "link".to_string()), ("link", in_filter(chunk))])
                .send()
                .await?;
            let rows: Vec<LinkRow> = check(response).await?.json().await?;
            found.extend(rows.into_iter().map(|row| row.link));
        }
        Ok(found)
    }
}

fn table_endpoint(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

/// PostgREST `in.(...)` filter with every value double-quoted.
fn in_filter(values: &[&str]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("in.({})", quoted.join(","))
}

/// Turn a non-2xx response into an error carrying its body.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(AppError::remote(format!("{status}: {body}")))
}

#[async_trait]
impl JobSink for RemoteStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn insert_or_ignore(&self, records: &[JobRecord]) -> Result<usize> {
        let mut seen = HashSet::new();
        let unique: Vec<&JobRecord> = records
            .iter()
            .filter(|r| seen.insert(r.link.as_str()))
            .collect();
        if unique.is_empty() {
            return Ok(0);
        }

        let links: Vec<&str> = unique.iter().map(|r| r.link.as_str()).collect();
        let existing = self.existing_links(&links).await?;
        let fresh: Vec<&JobRecord> = unique
            .into_iter()
            .filter(|r| !existing.contains(&r.link))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header("Prefer", "return=minimal")
            .json(&fresh)
            .send()
            .await?;
        check(response).await?;
        Ok(fresh.len())
    }

    async fn update_field(&self, link: &str, field: JobField, value: &str) -> Result<bool> {
        let mut body = serde_json::Map::new();
        body.insert(field.column().to_string(), value.into());

        let response = self
            .client
            .patch(&self.endpoint)
            .query(&[("link", format!("eq.{link}"))])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = check(response).await?.json().await?;
        Ok(!rows.is_empty())
    }
}
