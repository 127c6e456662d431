// src/triage/types.rs
//! The strict output contract for one triage call, and the typed error
//! taxonomy the retry policy classifies against.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::types::Item;

/// One scored entry returned by the model. Every field is required in the
/// wire schema; `published_utc` may be null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RankedResult {
    pub id: String,
    pub title: String,
    pub link: String,
    pub source: String,
    pub published_utc: Option<String>,
    pub score: f64,
    pub why: String,
    pub tags: Vec<String>,
}

/// One triage call's response. Deserialization is strict: unknown fields and
/// missing fields are contract violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriageBatchResponse {
    pub week_of: String,
    pub notes: String,
    pub ranked: Vec<RankedResult>,
}

/// Union across all batches, deduplicated by item id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub week_of: String,
    pub notes: String,
    pub ranked: Vec<RankedResult>,
}

/// Lean projection sent to the model; bounds request size.
#[derive(Debug, Clone, Serialize)]
pub struct LeanItem {
    pub id: String,
    pub source: String,
    pub title: String,
    pub link: String,
    pub published_utc: Option<String>,
    pub summary: String,
}

impl LeanItem {
    pub fn from_item(it: &Item, summary_max_chars: usize) -> Self {
        Self {
            id: it.id.clone(),
            source: it.source.clone(),
            title: it.title.clone(),
            link: it.link.clone(),
            published_utc: it.published_utc.clone(),
            summary: it.summary.chars().take(summary_max_chars).collect(),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum TriageError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("rate limited by backend")]
    RateLimited,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("backend returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("response violated the output contract: {0}")]
    Schema(String),
}

impl TriageError {
    /// Retryable error kinds; everything else propagates immediately.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TriageError::Timeout(_) | TriageError::Connection(_) | TriageError::RateLimited
        )
    }
}

/// Deserialize and validate one raw response body. Any deviation from the
/// contract is a `Schema` error, which is fatal for the run.
pub fn parse_batch_response(raw: &str) -> Result<TriageBatchResponse, TriageError> {
    let resp: TriageBatchResponse =
        serde_json::from_str(raw).map_err(|e| TriageError::Schema(e.to_string()))?;
    for r in &resp.ranked {
        if r.id.trim().is_empty() {
            return Err(TriageError::Schema("ranked entry with empty id".into()));
        }
        if !r.score.is_finite() || !(0.0..=1.0).contains(&r.score) {
            return Err(TriageError::Schema(format!(
                "score {} out of [0,1] for id {}",
                r.score, r.id
            )));
        }
        if r.why.trim().is_empty() {
            return Err(TriageError::Schema(format!("empty why for id {}", r.id)));
        }
    }
    Ok(resp)
}
