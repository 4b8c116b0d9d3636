use std::sync::Arc;

use alloy::primitives::TxHash;
use anyhow::Context;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    decode::Decode,
    error::JudgeError,
    finality::FinalityPolicy,
    ledger::{ContractCall, Connector, GET_LAST_RESULT, JUDGE_CONTENT, Ledger, TransactionStatus},
    session::{Session, SessionCache},
    types::{JudgeRequest, JudgeResult, SubmissionStage},
};

/// Submits judging requests: write the request, wait for the transaction to be accepted, then read the verdict.
///
/// Submissions are not queued. Callers should not start a second submission for the same account before the first
/// one resolves. Dropping the returned future stops polling, but the transaction itself cannot be withdrawn.
pub struct SubmissionPipeline<C: Connector> {
    sessions: Arc<SessionCache<C>>,
    policy: FinalityPolicy,
}

impl<C: Connector> SubmissionPipeline<C> {
    pub fn new(sessions: Arc<SessionCache<C>>) -> Self {
        Self::with_policy(sessions, FinalityPolicy::default())
    }

    pub fn with_policy(sessions: Arc<SessionCache<C>>, policy: FinalityPolicy) -> Self {
        SubmissionPipeline { sessions, policy }
    }

    pub async fn submit(
        &self,
        account: &str,
        request: &JudgeRequest,
    ) -> Result<JudgeResult, JudgeError> {
        let (progress, _) = watch::channel(SubmissionStage::Idle);
        self.submit_with_progress(account, request, &progress).await
    }

    /// Like [SubmissionPipeline::submit], but publishes every stage the submission goes through to `progress`.
    #[instrument(skip_all, fields(account = %account, mode = %request.mode()))]
    pub async fn submit_with_progress(
        &self,
        account: &str,
        request: &JudgeRequest,
        progress: &watch::Sender<SubmissionStage>,
    ) -> Result<JudgeResult, JudgeError> {
        match self.run(account, request, progress).await {
            Ok(result) => {
                progress.send_replace(SubmissionStage::Done);
                info!(total = result.total, saved = result.saved, fallback = result.fallback, "submission judged");
                Ok(result)
            }
            Err(e) => {
                progress.send_replace(SubmissionStage::Failed);
                warn!(error = &e as &dyn std::error::Error, "submission failed");
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        account: &str,
        request: &JudgeRequest,
        progress: &watch::Sender<SubmissionStage>,
    ) -> Result<JudgeResult, JudgeError> {
        progress.send_replace(SubmissionStage::Submitting);
        let session = self.sessions.acquire(account).await?;
        let tx = write(&session, request).await?;
        info!(%tx, "judging transaction sent");

        progress.send_replace(SubmissionStage::AwaitingFinality);
        self.await_acceptance(session.ledger(), tx).await?;

        progress.send_replace(SubmissionStage::ReadingResult);
        // The account is passed through as the caller spelled it.
        let call = ContractCall::new(session.contract(), GET_LAST_RESULT, [account]);
        let payload = session
            .ledger()
            .read_contract(&call)
            .await
            .context("failed to read the verdict")
            .map_err(JudgeError::Submission)?;

        JudgeResult::decode(payload).map_err(JudgeError::InvalidResult)
    }

    /// Polls the transaction until it is accepted, rejected or the policy runs out of attempts. Errors from the
    /// status query are not retried.
    async fn await_acceptance(
        &self,
        ledger: &C::Ledger,
        tx: TxHash,
    ) -> Result<TransactionStatus, JudgeError> {
        for attempt in self.policy.attempts() {
            let status = ledger
                .transaction_status(&tx)
                .await
                .with_context(|| format!("failed to query the status of {tx}"))
                .map_err(JudgeError::Submission)?;
            debug!(%tx, attempt = attempt.number, %status, "polled transaction");

            if status.is_accepted() {
                return Ok(status);
            }
            if status.is_rejected() {
                return Err(JudgeError::Rejected { tx, status });
            }
            tokio::time::sleep(attempt.wait).await;
        }

        Err(JudgeError::FinalityTimeout {
            tx,
            attempts: self.policy.retries,
            waited: self.policy.max_wait(),
        })
    }
}

async fn write<L: Ledger>(session: &Session<L>, request: &JudgeRequest) -> Result<TxHash, JudgeError> {
    let call = ContractCall::new(session.contract(), JUDGE_CONTENT, request.contract_args());
    session
        .ledger()
        .write_contract(&call)
        .await
        .context("failed to send the judging transaction")
        .map_err(JudgeError::Submission)
}
