use std::time::Duration;

use alloy::primitives::TxHash;

use crate::ledger::TransactionStatus;

/// An error from one of the judging operations which is surfaced to the caller.
///
/// Gallery and debug reads never produce one of these; they degrade to empty or default values instead.
#[derive(thiserror::Error, Debug)]
pub enum JudgeError {
    /// The contract address is missing or malformed. This is a deployment problem and retrying will not help.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The account address is malformed. The user has to reconnect with a valid account.
    #[error("invalid account address: {0:?}")]
    InvalidAccount(String),
    /// The session could not be established, or the ledger refused or failed a call.
    #[error("submission failed")]
    Submission(#[source] anyhow::Error),
    #[error("transaction {tx} was not accepted after {attempts} status checks ({waited:?})")]
    FinalityTimeout {
        tx: TxHash,
        attempts: u32,
        waited: Duration,
    },
    #[error("transaction {tx} finished with status {status}")]
    Rejected { tx: TxHash, status: TransactionStatus },
    /// The transaction was committed but its verdict could not be decoded.
    #[error("invalid result from contract: {0}")]
    InvalidResult(#[source] DecodeError),
}

/// A payload returned by a contract read that does not have the expected shape.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

/// A judging request which cannot be submitted.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("content is empty")]
    EmptyContent,
    #[error("content is too short: {len} characters, at least {min} are required")]
    ContentTooShort { len: usize, min: usize },
    #[error("content is too long: {len} characters, at most {max} are allowed")]
    ContentTooLong { len: usize, max: usize },
}
