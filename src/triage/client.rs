// src/triage/client.rs
//! Triage backend seam plus the OpenAI implementation. The core owns
//! retry/backoff and schema expectations; the backend owns the transport.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::interests::Interests;
use crate::triage::types::{LeanItem, TriageError};

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// One triage request/response boundary. Implementations return the raw
/// structured-output JSON text; parsing and validation stay in the core.
#[async_trait]
pub trait TriageBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, TriageError>;
    /// Backend name for diagnostics.
    fn name(&self) -> &'static str;
}

/// OpenAI chat-completions backend with a strict `json_schema` response
/// format. Requires a valid API key (validated at startup by `Config`).
pub struct OpenAiBackend {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: &str, model: &str) -> Self {
        // Read timeout is generously large: structured generation over a
        // full batch can take minutes.
        let http = reqwest::Client::builder()
            .user_agent("toc-digest/0.1")
            .connect_timeout(Duration::from_secs(30))
            .read_timeout(Duration::from_secs(300))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl TriageBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> Result<String, TriageError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            response_format: serde_json::Value,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            response_format: response_format(),
        };

        debug!(model = %self.model, "sending triage request");

        let resp = match self
            .http
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(TriageError::Timeout(e.to_string())),
            Err(e) => return Err(TriageError::Connection(e.to_string())),
        };

        let status = resp.status().as_u16();
        if status == 429 {
            return Err(TriageError::RateLimited);
        }
        if status == 401 || status == 403 {
            return Err(TriageError::Auth(
                "invalid API key or insufficient permissions".into(),
            ));
        }
        if status != 200 {
            let message = resp.text().await.unwrap_or_default();
            return Err(TriageError::Api { status, message });
        }

        let body: Resp = match resp.json().await {
            Ok(b) => b,
            Err(e) if e.is_timeout() => return Err(TriageError::Timeout(e.to_string())),
            Err(e) if e.is_decode() => {
                return Err(TriageError::Schema(format!("malformed response: {e}")))
            }
            Err(e) => return Err(TriageError::Connection(e.to_string())),
        };

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(TriageError::Schema("empty completion content".into()));
        }
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Wire schema for `TriageBatchResponse`. Every ranked field is required;
/// `published_utc` may be null.
fn batch_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "week_of": {"type": "string"},
            "notes": {"type": "string"},
            "ranked": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "id": {"type": "string"},
                        "title": {"type": "string"},
                        "link": {"type": "string"},
                        "source": {"type": "string"},
                        "published_utc": {"type": ["string", "null"]},
                        "score": {"type": "number"},
                        "why": {"type": "string"},
                        "tags": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["id", "title", "link", "source", "published_utc", "score", "why", "tags"]
                }
            }
        },
        "required": ["week_of", "notes", "ranked"]
    })
}

fn response_format() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "weekly_toc_digest",
            "strict": true,
            "schema": batch_schema()
        }
    })
}

/// Assemble the triage prompt for one batch.
pub fn build_prompt(interests: &Interests, items: &[LeanItem]) -> String {
    let keywords = serde_json::to_string(&interests.keywords).unwrap_or_else(|_| "[]".to_string());
    let items_json = serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string());
    format!(
        "You are triaging weekly journal table-of-contents RSS items for a researcher.\n\
         Use the user's interests below as the basis for relevance.\n\
         \n\
         Output rules:\n\
         - Return JSON strictly matching the schema.\n\
         - score in [0,1]\n\
         - \"why\": 1-2 concrete sentences grounded in title/summary (no hallucinations)\n\
         - \"tags\": short (e.g., EEG, aperiodic, timescales, HMM, ECG, clinical, state dynamics)\n\
         - Rank highest score first.\n\
         \n\
         Interests keywords (high weight):\n\
         {keywords}\n\
         \n\
         Interests context (brief):\n\
         {narrative}\n\
         \n\
         RSS items:\n\
         {items_json}",
        narrative = interests.narrative,
    )
}
