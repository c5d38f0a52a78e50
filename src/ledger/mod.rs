//! Ledger connections.
//!
//! A [`Ledger`] accepts a finalized batch and returns one confirmation id per
//! transaction. Transactions commit independently on the ledger, so a failed
//! call may still have applied part of the batch.

use std::future::Future;

use crate::batch::{ConfirmationId, FinalizedTransaction};
use crate::errors::LedgerError;

pub mod rpc;

pub use rpc::RpcLedger;

/// Shared, stateless capability for submitting transactions.
pub trait Ledger: Send + Sync {
    /// Submit the whole batch, returning ids in the order given.
    fn submit_batch(
        &self,
        transactions: Vec<FinalizedTransaction>,
    ) -> impl Future<Output = std::result::Result<Vec<ConfirmationId>, LedgerError>> + Send;
}
