use genjudge::{
    cfg::Config,
    ledger::{GET_GALLERY, GET_LAST_RESULT},
};
use serde_json::json;

use crate::{ACCOUNT, Harness};

#[genjudge_macros::test]
async fn entries_are_ranked_by_total(harness: Harness) {
    harness.set_payload(
        GET_GALLERY,
        json!(
            r#"[
                {"title": "first", "total": 36, "author": "0xaaa", "tags": ["ai"]},
                {"title": "second", "total": 44, "mode": "meme"},
                "garbage",
                {"title": "third", "total": 36},
                {"title": "fourth", "total": "40"}
            ]"#
        ),
    );

    let entries = harness.gallery().list(ACCOUNT).await;

    let titles: Vec<_> = entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["second", "fourth", "first", "third"]);
    assert_eq!(entries[0].mode, "meme");
    assert_eq!(entries[2].mode, "general");
    assert_eq!(entries[2].tags, ["ai"]);
    assert_eq!(entries[2].author, "0xaaa");

    let ledger = harness.ledger();
    assert_eq!(ledger.reads.len(), 1);
    assert_eq!(ledger.reads[0].function, GET_GALLERY);
    assert!(ledger.reads[0].args.is_empty());
}

#[genjudge_macros::test]
async fn non_array_payload_is_empty(harness: Harness) {
    for payload in [json!("{}"), json!("not json"), json!(null), json!({ "rows": [] })] {
        harness.set_payload(GET_GALLERY, payload);
        assert!(harness.gallery().list(ACCOUNT).await.is_empty());
    }
}

#[genjudge_macros::test]
async fn read_failure_is_empty(harness: Harness) {
    // Only the verdict view exists, so reading the gallery fails.
    harness.set_payload(GET_LAST_RESULT, json!("{}"));
    assert!(harness.gallery().list(ACCOUNT).await.is_empty());
}

#[genjudge_macros::test]
async fn session_failure_is_empty(_harness: Harness) {
    let harness = Harness::with_config(Config::default());
    harness.set_payload(GET_GALLERY, json!("[]"));

    assert!(harness.gallery().list(ACCOUNT).await.is_empty());
    assert!(harness.gallery().list("alice").await.is_empty());
    assert!(harness.ledger().reads.is_empty());
}
