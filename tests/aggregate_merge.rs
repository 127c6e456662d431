// tests/aggregate_merge.rs
// Cross-batch aggregation: sequential batch coverage, id dedup keeping the
// highest score, notes dedup, and the global re-sort.

use std::sync::Mutex;

use toc_digest::ingest::types::{item_id, Item};
use toc_digest::interests::Interests;
use toc_digest::triage::client::TriageBackend;
use toc_digest::triage::{merge_batches, triage_in_batches};
use toc_digest::triage::types::{RankedResult, TriageBatchResponse, TriageError};

fn ranked(id: &str, score: f64) -> RankedResult {
    RankedResult {
        id: id.to_string(),
        title: format!("title {id}"),
        link: format!("https://example.org/{id}"),
        source: "src".to_string(),
        published_utc: None,
        score,
        why: "keyword match".to_string(),
        tags: vec![],
    }
}

fn response(notes: &str, ranked: Vec<RankedResult>) -> String {
    serde_json::to_string(&TriageBatchResponse {
        week_of: "2026-08-03".to_string(),
        notes: notes.to_string(),
        ranked,
    })
    .unwrap()
}

fn item(title: &str) -> Item {
    let link = format!("https://example.org/{}", title.replace(' ', "-"));
    Item {
        id: item_id("src", title, &link),
        source: "src".to_string(),
        title: title.to_string(),
        link,
        published_utc: None,
        summary: String::new(),
    }
}

/// Replays one canned response per call and records batch sizes as seen in
/// the prompt, so batching behavior is observable from the outside.
struct ReplayBackend {
    responses: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl ReplayBackend {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl TriageBackend for ReplayBackend {
    async fn complete(&self, prompt: &str) -> Result<String, TriageError> {
        self.calls.lock().unwrap().push(prompt.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(TriageError::Schema("no scripted response left".into()));
        }
        Ok(responses.remove(0))
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}

#[tokio::test]
async fn duplicate_id_across_batches_keeps_highest_score() {
    let backend = ReplayBackend::new(vec![
        response("", vec![ranked("x", 0.4)]),
        response("", vec![ranked("x", 0.9)]),
    ]);
    let items = vec![item("one"), item("two")];
    let agg = triage_in_batches(&backend, &Interests { keywords: vec![], narrative: String::new() }, &items, 1, 500)
        .await
        .unwrap();
    assert_eq!(agg.ranked.len(), 1);
    assert_eq!(agg.ranked[0].id, "x");
    assert_eq!(agg.ranked[0].score, 0.9);
}

#[tokio::test]
async fn identical_notes_across_three_batches_appear_once() {
    let backend = ReplayBackend::new(vec![
        response("quiet week", vec![]),
        response("quiet week", vec![]),
        response("quiet week", vec![]),
    ]);
    let items = vec![item("one"), item("two"), item("three")];
    let agg = triage_in_batches(&backend, &Interests { keywords: vec![], narrative: String::new() }, &items, 1, 500)
        .await
        .unwrap();
    assert_eq!(agg.notes, "quiet week");
}

#[tokio::test]
async fn batches_are_contiguous_and_cover_all_items() {
    let backend = ReplayBackend::new(vec![
        response("", vec![]),
        response("", vec![]),
        response("", vec![]),
    ]);
    let items = vec![item("a"), item("b"), item("c"), item("d"), item("e")];
    triage_in_batches(&backend, &Interests { keywords: vec![], narrative: String::new() }, &items, 2, 500)
        .await
        .unwrap();

    let calls = backend.calls.lock().unwrap();
    assert_eq!(calls.len(), 3); // 2 + 2 + 1
    assert!(calls[0].contains("\"title\":\"a\"") && calls[0].contains("\"title\":\"b\""));
    assert!(calls[1].contains("\"title\":\"c\"") && calls[1].contains("\"title\":\"d\""));
    assert!(calls[2].contains("\"title\":\"e\"") && !calls[2].contains("\"title\":\"a\""));
}

#[test]
fn merge_resorts_across_batches() {
    let parts = vec![
        TriageBatchResponse {
            week_of: "w".into(),
            notes: String::new(),
            ranked: vec![ranked("low", 0.2), ranked("high", 0.95)],
        },
        TriageBatchResponse {
            week_of: "w".into(),
            notes: String::new(),
            ranked: vec![ranked("mid", 0.5)],
        },
    ];
    let agg = merge_batches("2026-08-03".into(), parts);
    let ids: Vec<_> = agg.ranked.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["high", "mid", "low"]);
    assert_eq!(agg.week_of, "2026-08-03");
}
