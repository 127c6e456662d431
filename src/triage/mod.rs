// src/triage/mod.rs
//! The triage stage: partition items into bounded batches, run one retried
//! LLM call per batch sequentially, then merge and rank across batches.

pub mod client;
pub mod retry;
pub mod types;

use std::collections::{HashMap, HashSet};

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use tracing::info;

use crate::ingest::types::Item;
use crate::interests::Interests;
use crate::triage::client::{build_prompt, TriageBackend};
use crate::triage::retry::{retry_transient, MAX_ATTEMPTS};
use crate::triage::types::{
    parse_batch_response, AggregateResult, LeanItem, RankedResult, TriageBatchResponse,
    TriageError,
};

/// Aggregate notes budget.
const NOTES_MAX_CHARS: usize = 1000;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("triage_batches_total", "Triage calls completed.");
        describe_counter!("triage_ranked_total", "Ranked results after merging.");
    });
}

/// One retried triage call for a single batch.
async fn triage_batch(
    backend: &dyn TriageBackend,
    interests: &Interests,
    batch: &[Item],
    summary_max_chars: usize,
) -> Result<TriageBatchResponse, TriageError> {
    let lean: Vec<LeanItem> = batch
        .iter()
        .map(|it| LeanItem::from_item(it, summary_max_chars))
        .collect();
    let prompt = build_prompt(interests, &lean);
    let raw = retry_transient(MAX_ATTEMPTS, |_| backend.complete(&prompt)).await?;
    parse_batch_response(&raw)
}

/// Sequential batched triage over all items. Batches are contiguous chunks in
/// input order, covering every item exactly once; one in-flight request at a
/// time. A batch that exhausts its retries aborts the whole run.
pub async fn triage_in_batches(
    backend: &dyn TriageBackend,
    interests: &Interests,
    items: &[Item],
    batch_size: usize,
    summary_max_chars: usize,
) -> Result<AggregateResult, TriageError> {
    ensure_metrics_described();
    let week_of = chrono::Utc::now().date_naive().to_string();
    let batch_size = batch_size.max(1);
    let total_batches = items.len().div_ceil(batch_size);

    let mut parts = Vec::with_capacity(total_batches);
    for (i, batch) in items.chunks(batch_size).enumerate() {
        info!(
            batch = i + 1,
            total = total_batches,
            items = batch.len(),
            backend = backend.name(),
            "triage batch"
        );
        let res = triage_batch(backend, interests, batch, summary_max_chars).await?;
        counter!("triage_batches_total").increment(1);
        parts.push(res);
    }

    Ok(merge_batches(week_of, parts))
}

/// Merge per-batch results. Notes: trimmed, empties dropped, exact duplicates
/// removed first-seen, joined by one space, hard-capped. Ranked: dedup by id
/// keeping the strictly higher score (ties keep first-seen), then a global
/// descending sort, since batch-local order does not survive merging.
pub fn merge_batches(week_of: String, parts: Vec<TriageBatchResponse>) -> AggregateResult {
    let mut notes_parts: Vec<String> = Vec::new();
    let mut seen_notes: HashSet<String> = HashSet::new();
    let mut ranked: Vec<RankedResult> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for part in parts {
        let note = part.notes.trim().to_string();
        if !note.is_empty() && seen_notes.insert(note.clone()) {
            notes_parts.push(note);
        }
        for r in part.ranked {
            match index.get(&r.id) {
                Some(&i) => {
                    if r.score > ranked[i].score {
                        ranked[i] = r;
                    }
                }
                None => {
                    index.insert(r.id.clone(), ranked.len());
                    ranked.push(r);
                }
            }
        }
    }

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    counter!("triage_ranked_total").increment(ranked.len() as u64);

    AggregateResult {
        week_of,
        notes: notes_parts.join(" ").chars().take(NOTES_MAX_CHARS).collect(),
        ranked,
    }
}
