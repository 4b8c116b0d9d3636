use std::{sync::Arc, time::Duration};

use genjudge::{
    cfg::{CONTRACT_ADDRESS_ENV_VAR, Config},
    error::JudgeError,
};

use crate::{ACCOUNT, CONTRACT, Harness, OTHER_ACCOUNT};

#[genjudge_macros::test]
async fn concurrent_acquires_share_one_session(harness: Harness) {
    harness.ledger().initialization_delay = Duration::from_secs(2);

    let lowercase = ACCOUNT.to_lowercase();
    let accounts = [ACCOUNT, ACCOUNT, lowercase.as_str(), ACCOUNT];
    let sessions: Vec<_> =
        futures::future::join_all(accounts.iter().map(|a| harness.sessions.acquire(a)))
            .await
            .into_iter()
            .map(Result::unwrap)
            .collect();

    assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
    assert!(sessions[0].is_initialized());

    let ledger = harness.ledger();
    assert_eq!(ledger.connects.len(), 1);
    assert_eq!(ledger.initializations, 1);
}

#[genjudge_macros::test]
async fn sequential_acquires_reuse_the_session(harness: Harness) {
    let first = harness.sessions.acquire(ACCOUNT).await.unwrap();
    let shouting = format!("0x{}", ACCOUNT[2..].to_uppercase());
    let second = harness.sessions.acquire(&shouting).await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(harness.ledger().initializations, 1);
}

#[genjudge_macros::test]
async fn changing_account_replaces_the_session(harness: Harness) {
    let first = harness.sessions.acquire(ACCOUNT).await.unwrap();
    let second = harness.sessions.acquire(OTHER_ACCOUNT).await.unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.account().to_string(), OTHER_ACCOUNT);
    assert_eq!(second.contract().to_string(), CONTRACT);
    assert!(Arc::ptr_eq(&harness.sessions.current().unwrap(), &second));

    // Switching back connects again; only one session is kept.
    let third = harness.sessions.acquire(ACCOUNT).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &third));

    let ledger = harness.ledger();
    assert_eq!(ledger.connects.len(), 3);
    assert_eq!(ledger.initializations, 3);
}

#[genjudge_macros::test]
async fn failed_initialization_is_retried(harness: Harness) {
    harness.ledger().failing_initializations = 1;

    let err = harness.sessions.acquire(ACCOUNT).await.unwrap_err();
    assert!(matches!(err, JudgeError::Submission(_)), "{err}");
    assert!(!harness.sessions.current().unwrap().is_initialized());

    let session = harness.sessions.acquire(ACCOUNT).await.unwrap();
    assert!(session.is_initialized());

    let ledger = harness.ledger();
    assert_eq!(ledger.connects.len(), 1);
    assert_eq!(ledger.initializations, 2);
}

#[genjudge_macros::test]
async fn missing_contract_address(_harness: Harness) {
    let harness = Harness::with_config(Config::default());

    let err = harness.sessions.acquire(ACCOUNT).await.unwrap_err();
    assert!(matches!(err, JudgeError::Config(_)), "{err}");
    assert!(harness.ledger().connects.is_empty());
}

#[genjudge_macros::test]
async fn malformed_contract_address(_harness: Harness) {
    let config = Config::from_lookup(|key| {
        (key == CONTRACT_ADDRESS_ENV_VAR).then(|| "0x5FbDB2315678".to_owned())
    });
    let harness = Harness::with_config(config);

    let err = harness.sessions.acquire(ACCOUNT).await.unwrap_err();
    assert!(matches!(err, JudgeError::Config(_)), "{err}");
}

#[genjudge_macros::test]
async fn malformed_account(harness: Harness) {
    for account in ["", "alice", "0x1234", "70997970C51812dc3A010C7d01b50e0d17dc79C8"] {
        let err = harness.sessions.acquire(account).await.unwrap_err();
        assert!(matches!(err, JudgeError::InvalidAccount(_)), "{err}");
    }
    assert!(harness.ledger().connects.is_empty());
}

#[genjudge_macros::test]
async fn contract_is_checked_before_the_account(_harness: Harness) {
    let harness = Harness::with_config(Config::default());

    let err = harness.sessions.acquire("alice").await.unwrap_err();
    assert!(matches!(err, JudgeError::Config(_)), "{err}");
}
