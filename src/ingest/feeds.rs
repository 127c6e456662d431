// src/ingest/feeds.rs
//! Feed-source boundary: feed-list file, RSS 2.0 / Atom parsing, best-effort
//! timestamp extraction, and the HTTP fetch loop. A failing feed is logged
//! and skipped; only the triage stage may abort a run.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::ingest::types::{item_id, Item};
use crate::ingest::normalize_summary;

/// Read the feed-list file: one URL per line, blank lines and `#` comments
/// ignored.
pub fn load_feed_urls(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading feed list from {}", path.display()))?;
    Ok(parse_feed_list(&content))
}

pub fn parse_feed_list(s: &str) -> Vec<String> {
    s.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/* ----------------------------
Timestamp extraction
---------------------------- */

/// Parse one raw date value into unix seconds. Enumerated fallback order:
/// RFC 2822, RFC 3339, RFC 2822 with obsolete zone names, then two lenient
/// formats seen in the wild. Unparseable values yield `None`.
fn parse_date_value(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc2822) {
        return Some(dt.to_offset(UtcOffset::UTC).unix_timestamp());
    }
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt.to_offset(UtcOffset::UTC).unix_timestamp());
    }
    // `time` rejects obsolete zone names like "GMT"; chrono accepts them.
    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(raw) {
        return Some(dt.timestamp());
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc().timestamp());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
    }
    None
}

/// First parseable candidate wins; the caller enumerates fields in
/// preference order.
fn entry_timestamp(candidates: &[Option<&str>]) -> Option<i64> {
    candidates
        .iter()
        .flatten()
        .find_map(|raw| parse_date_value(raw))
}

fn unix_to_rfc3339(ts: i64) -> Option<String> {
    OffsetDateTime::from_unix_timestamp(ts)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

/* ----------------------------
RSS 2.0 schema
---------------------------- */

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}
#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "dc:date")]
    dc_date: Option<String>,
    description: Option<String>,
}

/* ----------------------------
Atom schema
---------------------------- */

/// Text container tolerating `type="..."` attributes on Atom constructs.
#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text")]
    value: Option<String>,
}

impl TextNode {
    fn text(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<TextNode>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}
#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<TextNode>,
    content: Option<TextNode>,
}
#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// The alternate (or unqualified) link is the entry's canonical page.
fn atom_link(links: &[AtomLink]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .and_then(|l| l.href.clone())
}

/* ----------------------------
Parsing
---------------------------- */

enum FeedKind {
    Rss,
    Atom,
}

fn sniff_feed_kind(xml: &str) -> Option<FeedKind> {
    match (xml.find("<rss"), xml.find("<feed")) {
        (Some(r), Some(a)) => Some(if r < a { FeedKind::Rss } else { FeedKind::Atom }),
        (Some(_), None) => Some(FeedKind::Rss),
        (None, Some(_)) => Some(FeedKind::Atom),
        (None, None) => None,
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse one feed document into Items. Entries are capped at `max_items`,
/// entries missing a title or link are skipped, and entries older than
/// `cutoff_unix` are dropped (unknown timestamps are kept).
pub fn parse_feed(
    xml: &str,
    url: &str,
    max_items: usize,
    summary_max_chars: usize,
    cutoff_unix: i64,
) -> Result<Vec<Item>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let out = match sniff_feed_kind(&xml_clean) {
        Some(FeedKind::Rss) => {
            let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
            let source = rss
                .channel
                .title
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(url)
                .to_string();

            let mut items = Vec::new();
            for it in rss.channel.items.into_iter().take(max_items) {
                let title = it.title.as_deref().unwrap_or_default().trim().to_string();
                let link = it.link.as_deref().unwrap_or_default().trim().to_string();
                if title.is_empty() || link.is_empty() {
                    continue;
                }
                let ts = entry_timestamp(&[it.pub_date.as_deref(), it.dc_date.as_deref()]);
                if let Some(ts) = ts {
                    if ts < cutoff_unix {
                        continue;
                    }
                }
                let summary =
                    normalize_summary(it.description.as_deref().unwrap_or_default(), summary_max_chars);
                items.push(Item {
                    id: item_id(&source, &title, &link),
                    source: source.clone(),
                    title,
                    link,
                    published_utc: ts.and_then(unix_to_rfc3339),
                    summary,
                });
            }
            items
        }
        Some(FeedKind::Atom) => {
            let feed: AtomFeed = from_str(&xml_clean).context("parsing atom xml")?;
            let source = feed
                .title
                .as_ref()
                .map(TextNode::text)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(url)
                .to_string();

            let mut items = Vec::new();
            for e in feed.entries.into_iter().take(max_items) {
                let title = e
                    .title
                    .as_ref()
                    .map(TextNode::text)
                    .unwrap_or_default()
                    .trim()
                    .to_string();
                let link = atom_link(&e.links).unwrap_or_default().trim().to_string();
                if title.is_empty() || link.is_empty() {
                    continue;
                }
                let ts = entry_timestamp(&[e.published.as_deref(), e.updated.as_deref()]);
                if let Some(ts) = ts {
                    if ts < cutoff_unix {
                        continue;
                    }
                }
                let summary_raw = e
                    .summary
                    .as_ref()
                    .map(TextNode::text)
                    .filter(|s| !s.trim().is_empty())
                    .or_else(|| e.content.as_ref().map(TextNode::text))
                    .unwrap_or_default();
                let summary = normalize_summary(summary_raw, summary_max_chars);
                items.push(Item {
                    id: item_id(&source, &title, &link),
                    source: source.clone(),
                    title,
                    link,
                    published_utc: ts.and_then(unix_to_rfc3339),
                    summary,
                });
            }
            items
        }
        None => return Err(anyhow!("unrecognized feed format for {url}")),
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("ingest_parse_ms").record(ms);
    Ok(out)
}

/* ----------------------------
HTTP fetch
---------------------------- */

pub struct FeedFetcher {
    client: reqwest::Client,
    max_items_per_feed: usize,
    summary_max_chars: usize,
    cutoff_unix: i64,
}

impl FeedFetcher {
    pub fn new(max_items_per_feed: usize, summary_max_chars: usize, lookback_days: i64) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("toc-digest/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        let cutoff_unix = (chrono::Utc::now() - chrono::Duration::days(lookback_days)).timestamp();
        Self {
            client,
            max_items_per_feed,
            summary_max_chars,
            cutoff_unix,
        }
    }

    /// Fetch every feed in order. Raw, un-deduplicated items; the caller owns
    /// dedup, global ordering, and the total cap.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<Item> {
        let mut out = Vec::new();
        for url in urls {
            match self.fetch_one(url).await {
                Ok(mut v) => {
                    tracing::debug!(feed = %url, count = v.len(), "feed fetched");
                    out.append(&mut v);
                }
                Err(e) => {
                    tracing::warn!(error = ?e, feed = %url, "feed error");
                    counter!("ingest_feed_errors_total").increment(1);
                }
            }
        }
        out
    }

    async fn fetch_one(&self, url: &str) -> Result<Vec<Item>> {
        let body = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("fetching {url}"))?
            .error_for_status()
            .with_context(|| format!("status for {url}"))?
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;
        parse_feed(
            &body,
            url,
            self.max_items_per_feed,
            self.summary_max_chars,
            self.cutoff_unix,
        )
    }
}
