use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::types::{CancelSignal, ConfirmationId, FinalizedTransaction, TransactionBuilder};
use crate::errors::{BatchStage, BuildFailure, ClientError, LedgerError, Result};
use crate::ledger::Ledger;

/// Finalizes a batch of transaction requests and submits it in one call.
///
/// The caller either gets one confirmation id per request, in request order,
/// or an error. It never sees a partial list. This is a client-side
/// guarantee only: the ledger commits each transaction on its own, so after
/// a [`ClientError::Submission`] or a submit-stage cancellation some
/// transactions may have landed anyway. Only inspecting the ledger can tell.
///
/// Nothing is retried here. Retrying a submission can double-submit.
pub struct BatchExecutor<L> {
    ledger: Arc<L>,
}

impl<L> Clone for BatchExecutor<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
        }
    }
}

impl<L: Ledger> BatchExecutor<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Finalize every request concurrently, then submit them all at once.
    ///
    /// - Empty input returns an empty list without contacting the ledger.
    /// - Any finalization failure returns [`ClientError::BuildFailure`] naming
    ///   every failing index. Nothing is submitted.
    /// - A failed or short submission returns [`ClientError::Submission`].
    /// - Cancelling before submission returns `Cancelled { stage: Finalize }`
    ///   and nothing is submitted. Cancelling while the submission is in
    ///   flight returns `Cancelled { stage: Submit }`; the ledger may still
    ///   apply the batch.
    pub async fn execute_all<B: TransactionBuilder>(
        &self,
        requests: Vec<B>,
        cancel: &CancelSignal,
    ) -> Result<Vec<ConfirmationId>> {
        if requests.is_empty() {
            debug!("[BATCH] empty batch, nothing to submit");
            return Ok(Vec::new());
        }
        let total = requests.len();

        info!(total, "[BATCH] finalizing");
        let finalized = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(total, "[BATCH] cancelled while finalizing, nothing submitted");
                return Err(ClientError::Cancelled { stage: BatchStage::Finalize });
            }
            res = finalize_all(&requests) => res?,
        };
        drop(requests);

        if cancel.is_cancelled() {
            warn!(total, "[BATCH] cancelled before submission, nothing submitted");
            return Err(ClientError::Cancelled {
                stage: BatchStage::Finalize,
            });
        }

        info!(total, "[BATCH] submitting");
        let ids = tokio::select! {
            biased;
            res = self.ledger.submit_batch(finalized) => res.map_err(|e| {
                warn!(total, error = %e, "[BATCH] submission failed, ledger state unknown");
                ClientError::Submission(e)
            })?,
            _ = cancel.cancelled() => {
                warn!(total, "[BATCH] stopped waiting on submission, ledger effect unknown");
                return Err(ClientError::Cancelled { stage: BatchStage::Submit });
            }
        };

        if ids.len() != total {
            warn!(
                expected = total,
                actual = ids.len(),
                "[BATCH] confirmation count mismatch"
            );
            return Err(ClientError::Submission(
                LedgerError::ConfirmationMismatch {
                    expected: total,
                    actual: ids.len(),
                },
            ));
        }

        info!(total, "[BATCH] submitted");
        Ok(ids)
    }
}

/// Build every request concurrently and wait for all of them, so a failure
/// report covers every failing index rather than only the first.
async fn finalize_all<B: TransactionBuilder>(requests: &[B]) -> Result<Vec<FinalizedTransaction>> {
    let results = join_all(requests.iter().enumerate().map(|(index, request)| async move {
        match request.build().await {
            Ok(built) if built.signers.is_empty() => Err(BuildFailure {
                index,
                cause: "no signers attached".to_string(),
            }),
            Ok(built) => Ok(FinalizedTransaction::new(index, built)),
            Err(e) => Err(BuildFailure {
                index,
                cause: format!("{e:#}"),
            }),
        }
    }))
    .await;

    let mut finalized = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for res in results {
        match res {
            Ok(tx) => finalized.push(tx),
            Err(failure) => failures.push(failure),
        }
    }

    if !failures.is_empty() {
        let indices: Vec<usize> = failures.iter().map(|f| f.index).collect();
        warn!(?indices, "[BATCH] finalization failed, nothing submitted");
        return Err(ClientError::BuildFailure { failures });
    }
    Ok(finalized)
}
