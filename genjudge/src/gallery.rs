use std::sync::Arc;

use anyhow::Context;
use tracing::{instrument, warn};

use crate::{
    decode::Decode,
    error::JudgeError,
    ledger::{Connector, ContractCall, GET_GALLERY, Ledger},
    session::SessionCache,
    types::GalleryEntry,
};

/// Reads the public gallery.
pub struct GalleryReader<C: Connector> {
    sessions: Arc<SessionCache<C>>,
}

impl<C: Connector> GalleryReader<C> {
    pub fn new(sessions: Arc<SessionCache<C>>) -> Self {
        GalleryReader { sessions }
    }

    /// Returns every gallery entry, highest total first. Entries with equal totals keep the order the contract
    /// returned them in.
    ///
    /// The gallery is a supplementary view, so failures are logged and produce an empty list.
    #[instrument(skip_all, fields(account = %account))]
    pub async fn list(&self, account: &str) -> Vec<GalleryEntry> {
        match self.try_list(account).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = &e as &dyn std::error::Error, "failed to read the gallery");
                vec![]
            }
        }
    }

    async fn try_list(&self, account: &str) -> Result<Vec<GalleryEntry>, JudgeError> {
        let session = self.sessions.acquire(account).await?;
        let call = ContractCall::new(session.contract(), GET_GALLERY, Vec::<String>::new());
        let payload = session
            .ledger()
            .read_contract(&call)
            .await
            .context("failed to read the gallery")
            .map_err(JudgeError::Submission)?;

        let mut entries = Vec::<GalleryEntry>::decode(payload).map_err(JudgeError::InvalidResult)?;
        rank(&mut entries);
        Ok(entries)
    }
}

/// Sorts entries by descending total. The sort is stable.
pub fn rank(entries: &mut [GalleryEntry]) {
    entries.sort_by(|a, b| b.total.cmp(&a.total));
}
