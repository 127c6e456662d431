// src/digest.rs
//! Deterministic markdown rendering of the aggregate triage result, plus the
//! atomic digest write. Selection here is a pure filter + cap, never a
//! re-rank.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::ingest::types::Item;
use crate::triage::types::AggregateResult;

/// Render the digest for an aggregate result. Entries below `min_score_read`
/// are dropped, the rest are kept in descending-score order up to
/// `max_returned`. A ranked id with no corresponding item just loses its
/// collapsible summary block.
pub fn render_digest(
    result: &AggregateResult,
    items_by_id: &HashMap<String, Item>,
    min_score_read: f64,
    max_returned: usize,
) -> String {
    let notes = result.notes.trim();
    let kept: Vec<_> = result
        .ranked
        .iter()
        .filter(|r| r.score >= min_score_read)
        .take(max_returned)
        .collect();

    let mut lines: Vec<String> = vec![
        format!("# Weekly ToC Digest (week of {})", result.week_of),
        String::new(),
    ];
    if !notes.is_empty() {
        lines.push(notes.to_string());
        lines.push(String::new());
    }

    lines.push(format!(
        "**Included:** {} (score ≥ {:.2})  ",
        kept.len(),
        min_score_read
    ));
    lines.push(format!("**Scored:** {} total items", result.ranked.len()));
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());

    if kept.is_empty() {
        lines.push("_No items met the relevance threshold this week._".to_string());
        lines.push(String::new());
        return lines.join("\n");
    }

    for r in kept {
        lines.push(format!("## [{}]({})", r.title, r.link));
        lines.push(format!("*{}*  ", r.source));
        match &r.published_utc {
            Some(ts) => lines.push(format!("Score: **{:.2}**  \nPublished: {}", r.score, ts)),
            None => lines.push(format!("Score: **{:.2}**", r.score)),
        }
        if !r.tags.is_empty() {
            lines.push(format!("Tags: {}", r.tags.join(", ")));
        }
        lines.push(String::new());
        lines.push(r.why.trim().to_string());
        lines.push(String::new());

        let summary = items_by_id
            .get(&r.id)
            .map(|it| it.summary.trim())
            .unwrap_or_default();
        if !summary.is_empty() {
            lines.push("<details>".to_string());
            lines.push("<summary>RSS summary</summary>".to_string());
            lines.push(String::new());
            lines.push(summary.to_string());
            lines.push(String::new());
            lines.push("</details>".to_string());
            lines.push(String::new());
        }

        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.join("\n")
}

/// Minimal digest for a run that fetched nothing; the triage pipeline is
/// bypassed entirely in that case.
pub fn render_empty_digest(week_of: &str, lookback_days: i64) -> String {
    format!(
        "# Weekly ToC Digest (week of {week_of})\n\n_No RSS items found in the last {lookback_days} days._\n"
    )
}

/// Atomic write: temp file in place, then rename over the target. The prior
/// digest survives any failure before the rename.
pub fn write_digest(path: &Path, content: &str) -> Result<()> {
    let tmp = path.with_extension("md.tmp");
    fs::write(&tmp, content).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("moving digest into place at {}", path.display()))?;
    Ok(())
}
