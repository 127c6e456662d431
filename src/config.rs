// src/config.rs
//! Runtime configuration. Every knob is an environment override with a
//! documented default, read once at startup into an explicit struct that is
//! threaded through the pipeline.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Result};

// --- env names ---
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MAX_ITEMS_PER_FEED: &str = "MAX_ITEMS_PER_FEED";
pub const ENV_MAX_TOTAL_ITEMS: &str = "MAX_TOTAL_ITEMS";
pub const ENV_LOOKBACK_DAYS: &str = "LOOKBACK_DAYS";
pub const ENV_INTERESTS_MAX_CHARS: &str = "INTERESTS_MAX_CHARS";
pub const ENV_SUMMARY_MAX_CHARS: &str = "SUMMARY_MAX_CHARS";
pub const ENV_PREFILTER_KEEP_TOP: &str = "PREFILTER_KEEP_TOP";
pub const ENV_PREFILTER_MIN_MATCHED: &str = "PREFILTER_MIN_MATCHED";
pub const ENV_BATCH_SIZE: &str = "BATCH_SIZE";
pub const ENV_MIN_SCORE_READ: &str = "MIN_SCORE_READ";
pub const ENV_MAX_RETURNED: &str = "MAX_RETURNED";
pub const ENV_FEEDS_PATH: &str = "FEEDS_PATH";
pub const ENV_INTERESTS_PATH: &str = "INTERESTS_PATH";
pub const ENV_DIGEST_PATH: &str = "DIGEST_PATH";

#[derive(Debug, Clone)]
pub struct Config {
    /// Model identifier for the triage backend.
    pub model: String,
    /// OpenAI credential; validated before any network activity.
    pub api_key: String,
    /// Per-feed entry cap applied before any filtering.
    pub max_items_per_feed: usize,
    /// Global item cap after dedup and sorting.
    pub max_total_items: usize,
    /// Lookback window in days for the fetch cutoff.
    pub lookback_days: i64,
    /// Char budget for the interests narrative.
    pub interests_max_chars: usize,
    /// Char budget for item summaries (fetch time and lean projection).
    pub summary_max_chars: usize,
    /// How many items the prefilter passes to triage.
    pub prefilter_keep_top: usize,
    /// Fallback floor: fewer matches than min(this, keep_top) bypasses the
    /// prefilter entirely. A tunable, not a law.
    pub prefilter_min_matched: usize,
    /// Items per triage call.
    pub batch_size: usize,
    /// Inclusion threshold for the rendered digest.
    pub min_score_read: f64,
    /// Cap on rendered digest entries.
    pub max_returned: usize,
    pub feeds_path: PathBuf,
    pub interests_path: PathBuf,
    pub digest_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_key: String::new(),
            max_items_per_feed: 50,
            max_total_items: 400,
            lookback_days: 7,
            interests_max_chars: 3000,
            summary_max_chars: 500,
            prefilter_keep_top: 200,
            prefilter_min_matched: 50,
            batch_size: 50,
            min_score_read: 0.65,
            max_returned: 40,
            feeds_path: PathBuf::from("feeds.txt"),
            interests_path: PathBuf::from("interests.md"),
            digest_path: PathBuf::from("digest.md"),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_i64(name: &str, default: i64) -> i64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse an optional float env value and clamp it into <0.0..=1.0>.
fn env_score(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .map(|v| v.clamp(0.0, 1.0))
        .unwrap_or(default)
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Build the config from the environment. The credential is checked here,
    /// before any network activity; everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();
        let api_key = env::var(ENV_API_KEY).unwrap_or_default().trim().to_string();
        if api_key.is_empty() || !api_key.starts_with("sk-") {
            bail!("OPENAI_API_KEY is missing or invalid (expected to start with 'sk-')");
        }

        Ok(Self {
            model: env_string(ENV_MODEL, &defaults.model),
            api_key,
            max_items_per_feed: env_usize(ENV_MAX_ITEMS_PER_FEED, defaults.max_items_per_feed),
            max_total_items: env_usize(ENV_MAX_TOTAL_ITEMS, defaults.max_total_items),
            lookback_days: env_i64(ENV_LOOKBACK_DAYS, defaults.lookback_days),
            interests_max_chars: env_usize(ENV_INTERESTS_MAX_CHARS, defaults.interests_max_chars),
            summary_max_chars: env_usize(ENV_SUMMARY_MAX_CHARS, defaults.summary_max_chars),
            prefilter_keep_top: env_usize(ENV_PREFILTER_KEEP_TOP, defaults.prefilter_keep_top),
            prefilter_min_matched: env_usize(
                ENV_PREFILTER_MIN_MATCHED,
                defaults.prefilter_min_matched,
            ),
            batch_size: env_usize(ENV_BATCH_SIZE, defaults.batch_size).max(1),
            min_score_read: env_score(ENV_MIN_SCORE_READ, defaults.min_score_read),
            max_returned: env_usize(ENV_MAX_RETURNED, defaults.max_returned),
            feeds_path: PathBuf::from(env_string(ENV_FEEDS_PATH, "feeds.txt")),
            interests_path: PathBuf::from(env_string(ENV_INTERESTS_PATH, "interests.md")),
            digest_path: PathBuf::from(env_string(ENV_DIGEST_PATH, "digest.md")),
        })
    }
}
