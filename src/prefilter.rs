// src/prefilter.rs
//! Local, LLM-free relevance narrowing before triage: count keyword hits over
//! title+summary, keep the best matches, and fall back to recency when too
//! few items match at all.

use crate::ingest::types::Item;

fn hit_count(item: &Item, keywords_lower: &[String]) -> usize {
    let text = format!("{} {}", item.title, item.summary).to_lowercase();
    keywords_lower.iter().filter(|k| text.contains(k.as_str())).count()
}

/// Keep the `keep_top` most keyword-relevant items. When fewer than
/// `min(min_matched, keep_top)` items match any keyword, filtering is bypassed
/// and the first `keep_top` items of the input are returned unchanged; the
/// input must already be newest-first. Blank keywords contribute nothing.
pub fn keyword_prefilter(
    items: &[Item],
    keywords: &[String],
    keep_top: usize,
    min_matched: usize,
) -> Vec<Item> {
    let keywords_lower: Vec<String> = keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .map(|k| k.to_lowercase())
        .collect();

    let scored: Vec<(usize, &Item)> = items
        .iter()
        .map(|it| (hit_count(it, &keywords_lower), it))
        .collect();
    let mut matched: Vec<(usize, &Item)> =
        scored.into_iter().filter(|(hits, _)| *hits > 0).collect();

    // Too few matches: keep the newest N anyway so surprises are not hidden.
    if matched.len() < min_matched.min(keep_top) {
        tracing::debug!(
            matched = matched.len(),
            keep_top,
            "prefilter fallback to recency"
        );
        return items.iter().take(keep_top).cloned().collect();
    }

    matched.sort_by(|a, b| b.0.cmp(&a.0)); // stable: ties keep input order
    matched
        .into_iter()
        .take(keep_top)
        .map(|(_, it)| it.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::item_id;

    fn item(title: &str, summary: &str) -> Item {
        let link = format!("https://example.org/{}", title.replace(' ', "-"));
        Item {
            id: item_id("src", title, &link),
            source: "src".to_string(),
            title: title.to_string(),
            link,
            published_utc: None,
            summary: summary.to_string(),
        }
    }

    fn kw(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn too_few_matches_falls_back_to_input_order() {
        let items = vec![item("EEG study", ""), item("unrelated", "")];
        // One match < min(50, 10): the fallback returns the newest keep_top,
        // which here is both items in original order.
        let out = keyword_prefilter(&items, &kw(&["EEG"]), 10, 50);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].title, "EEG study");
        assert_eq!(out[1].title, "unrelated");
    }

    #[test]
    fn fallback_boundary_is_exact() {
        // min(min_matched, keep_top) = 2. One match: fallback. Two matches: filter.
        let items = vec![
            item("EEG study", ""),
            item("plain paper", ""),
            item("another EEG paper", ""),
        ];
        let out = keyword_prefilter(&items, &kw(&["EEG"]), 2, 2);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|it| it.title.contains("EEG")));

        let one_match = vec![item("EEG study", ""), item("plain paper", "")];
        let out = keyword_prefilter(&one_match, &kw(&["EEG"]), 2, 2);
        // matched_count == 1 < 2: fallback keeps the unmatched item too.
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].title, "plain paper");
    }

    #[test]
    fn matched_count_equal_to_floor_filters() {
        // Exactly at the boundary (matched == min(min_matched, keep_top)):
        // the strict `<` comparison means filtering applies.
        let items = vec![item("EEG a", ""), item("EEG b", ""), item("noise", "")];
        let out = keyword_prefilter(&items, &kw(&["EEG"]), 5, 2);
        let titles: Vec<_> = out.iter().map(|it| it.title.as_str()).collect();
        assert_eq!(titles, vec!["EEG a", "EEG b"]);
    }

    #[test]
    fn sorts_by_hits_descending_with_stable_ties() {
        let items = vec![
            item("EEG once", ""),
            item("EEG and HMM", "timescales too"),
            item("EEG again", ""),
        ];
        let out = keyword_prefilter(&items, &kw(&["EEG", "HMM", "timescales"]), 3, 1);
        assert_eq!(out[0].title, "EEG and HMM");
        // Ties preserve input order.
        assert_eq!(out[1].title, "EEG once");
        assert_eq!(out[2].title, "EEG again");
    }

    #[test]
    fn blank_keywords_are_ignored() {
        let items = vec![item("anything", "")];
        let out = keyword_prefilter(&items, &kw(&["", "   "]), 1, 0);
        // No usable keywords: zero matched, 0 >= min(0, 1) so the matched
        // branch applies and yields nothing matched; fallback floor 0 keeps
        // the filter path, which returns an empty set.
        assert!(out.is_empty());
    }

    #[test]
    fn keep_top_caps_matched_results() {
        let items: Vec<Item> = (0..60).map(|i| item(&format!("EEG {i}"), "")).collect();
        let out = keyword_prefilter(&items, &kw(&["EEG"]), 10, 50);
        assert_eq!(out.len(), 10);
    }
}
