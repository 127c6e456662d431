// src/ingest/mod.rs
pub mod feeds;
pub mod types;

use std::collections::HashSet;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::ingest::types::Item;

/// One-time metrics registration (so series show up if an exporter is wired).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_items_total", "Items kept after dedup, sort, and cap.");
        describe_counter!(
            "ingest_dedup_total",
            "Entries removed by identity-hash deduplication."
        );
        describe_counter!("ingest_feed_errors_total", "Feed fetch/parse errors.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!("ingest_last_run_ts", "Unix ts when ingest last ran.");
    });
}

/// Normalize an entry summary: decode HTML entities, strip tags, collapse
/// whitespace, then cap at `max_chars` with an ellipsis marker.
pub fn normalize_summary(s: &str, max_chars: usize) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 4) Length cap with truncation marker
    truncate_chars(&out, max_chars)
}

/// Char-based truncation with a `…` marker appended when over budget.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut t: String = s.chars().take(max_chars).collect();
        t.push('…');
        t
    } else {
        s.to_string()
    }
}

/// Deduplicate by identity hash (first-seen wins), sort newest-first with
/// unknown timestamps last, then cap the total item count.
pub fn dedup_sort_cap(raw: Vec<Item>, max_total: usize) -> Vec<Item> {
    ensure_metrics_described();

    let mut seen: HashSet<String> = HashSet::new();
    let mut items = Vec::with_capacity(raw.len());
    let mut dedup_out = 0usize;
    for it in raw {
        if !seen.insert(it.id.clone()) {
            dedup_out += 1;
            continue;
        }
        items.push(it);
    }

    // RFC 3339 strings sort chronologically; None sorts below Some, so the
    // descending comparison puts unknown timestamps last.
    items.sort_by(|a, b| b.published_utc.cmp(&a.published_utc));
    items.truncate(max_total);

    counter!("ingest_items_total").increment(items.len() as u64);
    counter!("ingest_dedup_total").increment(dedup_out as u64);
    gauge!("ingest_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

    items
}
