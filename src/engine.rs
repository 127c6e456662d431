// src/engine.rs
//! One-shot pipeline orchestration: fetch → prefilter → batched triage →
//! aggregate → render. Fatal errors abort the run with the prior digest file
//! untouched; the write happens only on success.

use std::collections::HashMap;
use std::fs;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::digest::{render_digest, render_empty_digest, write_digest};
use crate::ingest::feeds::{load_feed_urls, FeedFetcher};
use crate::ingest::types::Item;
use crate::interests::parse_interests;
use crate::prefilter::keyword_prefilter;
use crate::triage::client::OpenAiBackend;
use crate::triage::triage_in_batches;

fn today_utc() -> String {
    chrono::Utc::now().date_naive().to_string()
}

pub async fn run(cfg: &Config) -> Result<()> {
    let feed_urls = load_feed_urls(&cfg.feeds_path)?;
    let interests_doc = fs::read_to_string(&cfg.interests_path)
        .with_context(|| format!("reading interests from {}", cfg.interests_path.display()))?;
    let interests = parse_interests(&interests_doc, cfg.interests_max_chars);
    info!(
        keywords = interests.keywords.len(),
        feeds = feed_urls.len(),
        "loaded interests and feed list"
    );

    let fetcher = FeedFetcher::new(cfg.max_items_per_feed, cfg.summary_max_chars, cfg.lookback_days);
    let raw = fetcher.fetch_all(&feed_urls).await;
    let items = crate::ingest::dedup_sort_cap(raw, cfg.max_total_items);
    info!(count = items.len(), "fetched feed items (pre-filter)");

    if items.is_empty() {
        let md = render_empty_digest(&today_utc(), cfg.lookback_days);
        write_digest(&cfg.digest_path, &md)?;
        info!(path = %cfg.digest_path.display(), "no items in lookback window; wrote minimal digest");
        return Ok(());
    }

    let items = keyword_prefilter(
        &items,
        &interests.keywords,
        cfg.prefilter_keep_top,
        cfg.prefilter_min_matched,
    );
    info!(count = items.len(), "sending items to triage (post-filter)");

    let items_by_id: HashMap<String, Item> =
        items.iter().map(|it| (it.id.clone(), it.clone())).collect();

    let backend = OpenAiBackend::new(&cfg.api_key, &cfg.model);
    let mut result = triage_in_batches(
        &backend,
        &interests,
        &items,
        cfg.batch_size,
        cfg.summary_max_chars,
    )
    .await
    .context("triage failed")?;

    // Enforce score ordering once more; merging across batches does not
    // preserve global order.
    result.ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

    let md = render_digest(&result, &items_by_id, cfg.min_score_read, cfg.max_returned);
    write_digest(&cfg.digest_path, &md)?;
    info!(path = %cfg.digest_path.display(), "wrote digest");
    Ok(())
}
