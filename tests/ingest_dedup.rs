// tests/ingest_dedup.rs
use toc_digest::ingest::types::{item_id, Item};
use toc_digest::ingest::dedup_sort_cap;

fn item(source: &str, title: &str, link: &str, published_utc: Option<&str>) -> Item {
    Item {
        id: item_id(source, title, link),
        source: source.to_string(),
        title: title.to_string(),
        link: link.to_string(),
        published_utc: published_utc.map(str::to_string),
        summary: String::new(),
    }
}

#[test]
fn no_two_items_share_an_identity_hash() {
    let raw = vec![
        item("A", "same", "https://x/1", Some("2026-08-01T00:00:00Z")),
        item("A", "same", "https://x/1", Some("2026-08-01T00:00:00Z")),
        item("A", "same", "https://x/2", Some("2026-08-01T00:00:00Z")),
        item("B", "same", "https://x/1", None),
    ];
    let out = dedup_sort_cap(raw, 100);
    assert_eq!(out.len(), 3);
    let mut ids: Vec<_> = out.iter().map(|it| it.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn ordering_is_non_increasing_with_unknown_last() {
    let raw = vec![
        item("A", "mid", "https://x/1", Some("2026-08-02T00:00:00Z")),
        item("A", "unknown", "https://x/2", None),
        item("A", "newest", "https://x/3", Some("2026-08-05T00:00:00Z")),
        item("A", "oldest", "https://x/4", Some("2026-07-20T00:00:00Z")),
    ];
    let out = dedup_sort_cap(raw, 100);
    let titles: Vec<_> = out.iter().map(|it| it.title.as_str()).collect();
    assert_eq!(titles, vec!["newest", "mid", "oldest", "unknown"]);
}

#[test]
fn total_cap_keeps_the_newest() {
    let raw: Vec<Item> = (0..10)
        .map(|i| {
            item(
                "A",
                &format!("t{i}"),
                &format!("https://x/{i}"),
                Some(&format!("2026-08-{:02}T00:00:00Z", i + 1)),
            )
        })
        .collect();
    let out = dedup_sort_cap(raw, 3);
    let titles: Vec<_> = out.iter().map(|it| it.title.as_str()).collect();
    assert_eq!(titles, vec!["t9", "t8", "t7"]);
}
