// src/ingest/types.rs

/// One feed entry normalized into the pipeline's canonical shape.
/// Produced once by fetch, read-only from then on.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Content-derived identity hash, the dedup key throughout the pipeline.
    pub id: String,
    /// Feed title (falls back to the feed URL).
    pub source: String,
    pub title: String,
    pub link: String,
    /// RFC 3339 UTC timestamp; `None` when the feed gave nothing parseable.
    pub published_utc: Option<String>,
    /// Whitespace-normalized, length-capped summary/description.
    pub summary: String,
}

/// Stable identity hash over `source|title|link`.
pub fn item_id(source: &str, title: &str, link: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"|");
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(link.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
