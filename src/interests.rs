// src/interests.rs
//! Interests document parser. Convention: keywords live under a "Keywords"
//! heading (any level, case-insensitive), one per line until the next heading;
//! the narrative is the whole document, hard-truncated to a char budget.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::truncate_chars;

/// Keyword count cap; excess entries are silently dropped.
pub const MAX_KEYWORDS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interests {
    pub keywords: Vec<String>,
    pub narrative: String,
}

static RE_KEYWORDS_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?im)^\s*#{1,6}\s+Keywords\s*$").unwrap());
static RE_NEXT_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?im)^\s*#{1,6}\s+\S").unwrap());
static RE_LIST_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\-\*\+]\s+").unwrap());

/// Parse the interests document. No heading means no keywords; the narrative
/// is produced either way. Pure and idempotent.
pub fn parse_interests(doc: &str, narrative_max_chars: usize) -> Interests {
    let mut keywords = Vec::new();

    if let Some(m) = RE_KEYWORDS_HEADING.find(doc) {
        let rest = &doc[m.end()..];
        let block = match RE_NEXT_HEADING.find(rest) {
            Some(next) => &rest[..next.start()],
            None => rest,
        };
        for line in block.lines() {
            let line = RE_LIST_MARKER.replace(line.trim(), "");
            if !line.is_empty() {
                keywords.push(line.to_string());
            }
        }
        keywords.truncate(MAX_KEYWORDS);
    }

    Interests {
        keywords,
        narrative: truncate_chars(doc.trim(), narrative_max_chars),
    }
}
