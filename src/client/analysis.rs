//! Client for the external analysis service.
//!
//! `GET {base_url}{path}?token=<token>&method=<ml|nltk>` returns
//! `{ "profile": {...}, "insights": [...] }`. A missing or `null` `insights`
//! field is an empty list.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::{describe_error, normalize_base_url, probe};
use crate::config::schema::{AnalysisConfig, Method};
use crate::insights::{InsightRecord, lenient_records};

/// Decoded analysis response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisPayload {
    /// Raw profile as returned by the service. Display code prefers the
    /// graph client's profile; this is kept for offline reports.
    #[serde(default)]
    pub profile: Option<Value>,
    #[serde(default, deserialize_with = "lenient_records")]
    pub insights: Vec<InsightRecord>,
}

impl AnalysisPayload {
    /// Decode a saved payload. Accepts either the full response object or a
    /// bare array of records.
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("invalid JSON")?;
        if value.is_array() {
            return Ok(Self {
                profile: None,
                insights: crate::insights::parse_records(value),
            });
        }
        serde_json::from_value(value).context("unexpected analysis payload shape")
    }
}

/// Synchronous analysis service client.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    base_url: String,
    endpoint: String,
    method: Method,
    timeout: Duration,
}

impl AnalysisClient {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let base_url = normalize_base_url(&config.base_url);
        let path = config.path.trim_start_matches('/');
        Self {
            endpoint: format!("{base_url}/{path}"),
            base_url,
            method: config.method,
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Fetch and decode the user's insight records.
    pub fn fetch(&self, token: &str) -> Result<AnalysisPayload> {
        let resp = ureq::get(&self.endpoint)
            .timeout(self.timeout)
            .query("token", token)
            .query("method", &self.method.to_string())
            .call()
            .map_err(|e| describe_error("insight analysis", e))?;

        let body = resp
            .into_string()
            .context("failed to read insight analysis response")?;

        AnalysisPayload::from_json(&body).context("failed to parse insight analysis response")
    }

    /// Whether the service answers at all.
    pub fn is_reachable(&self) -> bool {
        probe(&self.base_url)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
