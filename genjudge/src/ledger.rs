use alloy::primitives::{Address, TxHash};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

use crate::cfg::Network;

/// Contract method which judges content and stores the verdict for the sender.
pub const JUDGE_CONTENT: &str = "judge_content";
/// Contract view returning the last verdict of an account.
pub const GET_LAST_RESULT: &str = "get_last_result";
/// Contract view returning the public gallery.
pub const GET_GALLERY: &str = "get_gallery";
/// Contract view returning the diagnostics of the last judging call of an account.
pub const GET_LAST_DEBUG: &str = "get_last_debug";

/// A call to a method of an intelligent contract. All of the judging contract's methods take string arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCall {
    pub address: Address,
    pub function: String,
    pub args: Vec<String>,
}

impl ContractCall {
    pub fn new(
        address: Address,
        function: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        ContractCall {
            address,
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Lifecycle of a ledger transaction. The discriminants match the numeric statuses reported by nodes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    FromRepr,
)]
#[repr(u8)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum TransactionStatus {
    Uninitialized = 0,
    Pending = 1,
    Proposing = 2,
    Committing = 3,
    Revealing = 4,
    Accepted = 5,
    Undetermined = 6,
    Finalized = 7,
    Canceled = 8,
    AppealRevealing = 9,
    AppealCommitting = 10,
    ReadyToFinalize = 11,
    ValidatorsTimeout = 12,
    LeaderTimeout = 13,
    /// The node does not know about the transaction (yet).
    Unknown = 255,
}

impl TransactionStatus {
    /// Whether the transaction has reached the accepted state. A finalized transaction was accepted before.
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Accepted | TransactionStatus::Finalized
        )
    }

    /// Whether the transaction has stopped without being accepted. It will never become accepted.
    pub fn is_rejected(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Undetermined | TransactionStatus::Canceled
        )
    }
}

/// A connection to the ledger, bound to a single account.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    /// Prepares the connection for use. Called once per session, before any other method.
    async fn initialize(&self) -> Result<()>;

    /// Sends a state-changing call with no value attached and returns the transaction's hash.
    async fn write_contract(&self, call: &ContractCall) -> Result<TxHash>;

    async fn transaction_status(&self, tx: &TxHash) -> Result<TransactionStatus>;

    /// Executes a read-only call and returns its result. For the judging contract this is usually a JSON-encoded
    /// string.
    async fn read_contract(&self, call: &ContractCall) -> Result<serde_json::Value>;
}

/// Creates [Ledger] connections.
pub trait Connector: Send + Sync + 'static {
    type Ledger: Ledger;

    /// Builds a connection. This must not perform any I/O; that happens in [Ledger::initialize].
    fn connect(&self, endpoint: &str, account: Address, network: &Network) -> Result<Self::Ledger>;
}
