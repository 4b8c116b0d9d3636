use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::Context;
use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{
    cfg::{Config, parse_address},
    error::JudgeError,
    ledger::{Connector, Ledger},
};

/// Identity of a session. Addresses are compared as bytes, so differently-cased spellings of an account are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub contract: Address,
    pub endpoint: String,
    pub account: Address,
}

/// A ledger connection for one account.
#[derive(Debug)]
pub struct Session<L> {
    key: SessionKey,
    ledger: L,
    initialized: OnceCell<()>,
}

impl<L: Ledger> Session<L> {
    fn new(key: SessionKey, ledger: L) -> Self {
        Session {
            key,
            ledger,
            initialized: OnceCell::new(),
        }
    }

    pub fn contract(&self) -> Address {
        self.key.contract
    }

    pub fn account(&self) -> Address {
        self.key.account
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    /// Runs [Ledger::initialize] unless it has already succeeded. Concurrent callers share one initialization; if it
    /// fails, the next caller tries again.
    async fn ensure_initialized(&self) -> anyhow::Result<()> {
        self.initialized
            .get_or_try_init(|| async {
                debug!(account = %self.key.account, endpoint = %self.key.endpoint, "initializing session");
                self.ledger.initialize().await
            })
            .await?;
        Ok(())
    }
}

/// Holds the single live [Session].
///
/// The session is replaced as a whole when the contract, endpoint or account changes. It is never torn down
/// otherwise.
pub struct SessionCache<C: Connector> {
    config: Config,
    connector: C,
    current: Mutex<Option<Arc<Session<C::Ledger>>>>,
}

impl<C: Connector> SessionCache<C> {
    pub fn new(config: Config, connector: C) -> Self {
        SessionCache {
            config,
            connector,
            current: Mutex::new(None),
        }
    }

    /// The cached session, if any. It may not have finished initializing.
    pub fn current(&self) -> Option<Arc<Session<C::Ledger>>> {
        self.current.lock().clone()
    }

    /// Returns an initialized session for `account`, reusing the cached one if it has the same key.
    pub async fn acquire(&self, account: &str) -> Result<Arc<Session<C::Ledger>>, JudgeError> {
        let contract = self.config.contract_address()?;
        let account = parse_address(account)
            .ok_or_else(|| JudgeError::InvalidAccount(account.to_owned()))?;
        let key = SessionKey {
            contract,
            endpoint: self.config.endpoint.clone(),
            account,
        };

        // The new session is published before it is initialized, so concurrent callers with the same key find it
        // and wait on its initialization instead of starting their own.
        let session = {
            let mut current = self.current.lock();
            let cached = current.as_ref().filter(|s| s.key == key).cloned();
            match cached {
                Some(session) => session,
                None => {
                    let ledger = self
                        .connector
                        .connect(&key.endpoint, key.account, &self.config.network)
                        .context("failed to connect to the ledger")
                        .map_err(JudgeError::Submission)?;
                    let session = Arc::new(Session::new(key, ledger));
                    if let Some(old) = current.replace(session.clone()) {
                        info!(old_account = %old.key.account, account = %session.key.account, "replacing session");
                    }
                    session
                }
            }
        };

        session
            .ensure_initialized()
            .await
            .context("failed to initialize session")
            .map_err(JudgeError::Submission)?;

        Ok(session)
    }
}
