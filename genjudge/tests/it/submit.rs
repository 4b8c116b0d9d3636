use std::time::Duration;

use alloy::primitives::TxHash;
use genjudge::{
    error::JudgeError,
    ledger::{GET_LAST_RESULT, JUDGE_CONTENT, TransactionStatus},
    types::{Mode, ScoreBreakdown, SubmissionStage},
};
use serde_json::json;
use tokio::{sync::watch, time::Instant};

use crate::{ACCOUNT, Harness, request};

fn verdict() -> serde_json::Value {
    json!(
        r#"{"mode":"startup","total":38,"scores":{"originality":8,"clarity":7,"value":8,"execution":7,"virality":8},"feedback":"Good","improvements":["Add metrics"],"tags":["ai"],"saved":true,"fallback":false}"#
    )
}

#[genjudge_macros::test]
async fn happy_path(harness: Harness) {
    harness.set_payload(GET_LAST_RESULT, verdict());

    let result = harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::Startup, "X"))
        .await
        .unwrap();

    assert_eq!(result.mode, "startup");
    assert_eq!(result.title, "");
    assert_eq!(result.url, "");
    assert_eq!(result.total, 38);
    assert_eq!(result.feedback, "Good");
    assert_eq!(result.improvements, ["Add metrics"]);
    assert_eq!(result.tags, ["ai"]);
    assert!(result.saved);
    assert!(!result.fallback);
    assert_eq!(
        result.breakdown(),
        ScoreBreakdown {
            originality: 8,
            clarity: 7,
            value: 8,
            execution: 7,
            virality: 8,
        }
    );

    let ledger = harness.ledger();
    assert_eq!(ledger.polls.len(), 1);
    assert_eq!(ledger.reads.len(), 1);
    assert_eq!(ledger.reads[0].function, GET_LAST_RESULT);
    assert_eq!(ledger.reads[0].args, [ACCOUNT]);
}

#[genjudge_macros::test]
async fn writes_the_request_arguments_in_order(harness: Harness) {
    harness.set_payload(GET_LAST_RESULT, verdict());
    let request = request(Mode::Meme, "  Title  ");

    harness.pipeline().submit(ACCOUNT, &request).await.unwrap();

    let ledger = harness.ledger();
    assert_eq!(ledger.writes.len(), 1);
    let (sender, call) = &ledger.writes[0];
    assert_eq!(sender.to_string(), ACCOUNT);
    assert_eq!(call.address.to_string(), crate::CONTRACT);
    assert_eq!(call.function, JUDGE_CONTENT);
    assert_eq!(call.args, ["meme", "Title", "", "A".repeat(50).as_str()]);
    // The transaction that was sent is the one that was polled.
    assert_eq!(ledger.polls, [TxHash::repeat_byte(1)]);
}

#[genjudge_macros::test]
async fn result_that_is_not_json(harness: Harness) {
    harness.set_payload(GET_LAST_RESULT, json!("not json"));

    let err = harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::General, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, JudgeError::InvalidResult(_)), "{err}");
}

#[genjudge_macros::test]
async fn result_that_is_not_an_object(harness: Harness) {
    harness.set_payload(GET_LAST_RESULT, json!("[1, 2, 3]"));

    let err = harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::General, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, JudgeError::InvalidResult(_)), "{err}");
}

#[genjudge_macros::test]
async fn already_decoded_result(harness: Harness) {
    harness.set_payload(
        GET_LAST_RESULT,
        json!({ "total": "41", "saved": 1, "tags": "not a list" }),
    );

    let result = harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::General, ""))
        .await
        .unwrap();
    assert_eq!(result.total, 41);
    assert!(result.saved);
    assert!(result.tags.is_empty());
    assert_eq!(result.mode, "general");
}

#[genjudge_macros::test]
async fn times_out_after_every_attempt(harness: Harness) {
    harness.ledger().default_status = TransactionStatus::Pending;
    let start = Instant::now();

    let err = harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::General, ""))
        .await
        .unwrap_err();

    let JudgeError::FinalityTimeout {
        attempts, waited, ..
    } = &err
    else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(*attempts, 80);
    assert_eq!(*waited, Duration::from_secs(400));

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(400), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(401), "{elapsed:?}");

    let ledger = harness.ledger();
    assert_eq!(ledger.polls.len(), 80);
    // The verdict is never read.
    assert!(ledger.reads.is_empty());
}

#[genjudge_macros::test]
async fn accepted_on_the_last_attempt(harness: Harness) {
    harness.set_payload(GET_LAST_RESULT, verdict());
    {
        let mut ledger = harness.ledger();
        ledger
            .statuses
            .extend(std::iter::repeat_n(TransactionStatus::Proposing, 79));
        ledger.statuses.push_back(TransactionStatus::Accepted);
        ledger.default_status = TransactionStatus::Pending;
    }

    let result = harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::Startup, ""))
        .await
        .unwrap();
    assert_eq!(result.total, 38);
    assert_eq!(harness.ledger().polls.len(), 80);
}

#[genjudge_macros::test]
async fn finalized_counts_as_accepted(harness: Harness) {
    harness.set_payload(GET_LAST_RESULT, verdict());
    harness.ledger().statuses.extend([
        TransactionStatus::Unknown,
        TransactionStatus::Committing,
        TransactionStatus::Finalized,
    ]);

    harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::Startup, ""))
        .await
        .unwrap();
    assert_eq!(harness.ledger().polls.len(), 3);
}

#[genjudge_macros::test]
async fn rejected_transactions_stop_polling(harness: Harness) {
    for rejected in [TransactionStatus::Canceled, TransactionStatus::Undetermined] {
        harness.ledger().statuses.extend([TransactionStatus::Pending, rejected]);
        harness.ledger().polls.clear();

        let err = harness
            .pipeline()
            .submit(ACCOUNT, &request(Mode::General, ""))
            .await
            .unwrap_err();
        assert!(
            matches!(err, JudgeError::Rejected { status, .. } if status == rejected),
            "{err}"
        );
        assert_eq!(harness.ledger().polls.len(), 2);
    }
}

#[genjudge_macros::test]
async fn failed_write(harness: Harness) {
    harness.ledger().fail_writes = true;

    let err = harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::General, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, JudgeError::Submission(_)), "{err}");
    assert!(harness.ledger().polls.is_empty());

    // The cause is reported once, through the source chain.
    assert_eq!(err.to_string(), "submission failed");
    let report = format!("{:#}", anyhow::Error::from(err));
    assert_eq!(
        report,
        "submission failed: failed to send the judging transaction: insufficient funds"
    );
}

#[genjudge_macros::test]
async fn missing_verdict_is_a_submission_error(harness: Harness) {
    let err = harness
        .pipeline()
        .submit(ACCOUNT, &request(Mode::General, ""))
        .await
        .unwrap_err();
    assert!(matches!(err, JudgeError::Submission(_)), "{err}");
}

#[genjudge_macros::test]
async fn progress_reports_every_stage(harness: Harness) {
    harness.set_payload(GET_LAST_RESULT, verdict());
    harness
        .ledger()
        .statuses
        .extend([TransactionStatus::Pending, TransactionStatus::Accepted]);

    let (progress, mut stages) = watch::channel(SubmissionStage::Idle);
    let observer = tokio::spawn(async move {
        let mut seen = vec![];
        while stages.changed().await.is_ok() {
            let stage = *stages.borrow_and_update();
            seen.push(stage);
            if stage.is_terminal() {
                break;
            }
        }
        seen
    });

    let pipeline = harness.pipeline();
    pipeline
        .submit_with_progress(ACCOUNT, &request(Mode::General, ""), &progress)
        .await
        .unwrap();
    drop(progress);

    let seen = observer.await.unwrap();
    // Stages may be coalesced by the channel, but never reordered, and the last one is always observed.
    assert_eq!(seen.last(), Some(&SubmissionStage::Done));
    let order = [
        SubmissionStage::Submitting,
        SubmissionStage::AwaitingFinality,
        SubmissionStage::ReadingResult,
        SubmissionStage::Done,
    ];
    let positions: Vec<_> = seen
        .iter()
        .map(|s| order.iter().position(|o| o == s).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{seen:?}");
}

#[genjudge_macros::test]
async fn progress_ends_in_failure(harness: Harness) {
    harness.ledger().fail_writes = true;
    let (progress, stages) = watch::channel(SubmissionStage::Idle);

    let _ = harness
        .pipeline()
        .submit_with_progress(ACCOUNT, &request(Mode::General, ""), &progress)
        .await;
    assert_eq!(*stages.borrow(), SubmissionStage::Failed);
}
