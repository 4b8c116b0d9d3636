use std::sync::Arc;

use anyhow::Context;
use tracing::{instrument, warn};

use crate::{
    decode::Decode,
    error::JudgeError,
    ledger::{Connector, ContractCall, GET_LAST_DEBUG, Ledger},
    session::SessionCache,
    types::DebugInfo,
};

/// Reads the diagnostics of an account's last judging call. These are only interesting when the result had
/// `fallback` set, but reading them at any other time is harmless.
pub struct DebugReader<C: Connector> {
    sessions: Arc<SessionCache<C>>,
}

impl<C: Connector> DebugReader<C> {
    pub fn new(sessions: Arc<SessionCache<C>>) -> Self {
        DebugReader { sessions }
    }

    /// Never fails: any error produces [DebugInfo::default].
    #[instrument(skip_all, fields(account = %account))]
    pub async fn get(&self, account: &str) -> DebugInfo {
        self.try_get(account).await.unwrap_or_else(|e| {
            warn!(error = &e as &dyn std::error::Error, "failed to read debug info");
            DebugInfo::default()
        })
    }

    async fn try_get(&self, account: &str) -> Result<DebugInfo, JudgeError> {
        let session = self.sessions.acquire(account).await?;
        let call = ContractCall::new(session.contract(), GET_LAST_DEBUG, [account]);
        let payload = session
            .ledger()
            .read_contract(&call)
            .await
            .context("failed to read debug info")
            .map_err(JudgeError::Submission)?;
        DebugInfo::decode(payload).map_err(JudgeError::InvalidResult)
    }
}
