use std::fmt;
use std::future::Future;

use ethers::utils::keccak256;
use tokio::sync::watch;

use crate::accounts::Address;

/// A transaction as produced by an external builder: the serialized message
/// plus every signer already attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub message: Vec<u8>,
    pub signers: Vec<Address>,
}

/// Anything that can produce a fully signed transaction.
///
/// `build` takes `&self`; the executor never changes a request.
pub trait TransactionBuilder: Send + Sync {
    fn build(&self) -> impl Future<Output = anyhow::Result<BuiltTransaction>> + Send;
}

/// A transaction ready to be handed to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedTransaction {
    /// Position of the originating request in the batch.
    pub index: usize,
    pub payload: Vec<u8>,
    pub signers: Vec<Address>,
    /// keccak256 of `payload`, for correlating logs with ledger entries.
    pub digest: [u8; 32],
}

impl FinalizedTransaction {
    pub fn new(index: usize, built: BuiltTransaction) -> Self {
        let digest = keccak256(&built.message);
        Self {
            index,
            payload: built.message,
            signers: built.signers,
            digest,
        }
    }
}

/// Ledger-issued identifier of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ConfirmationId(pub String);

impl fmt::Display for ConfirmationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ConfirmationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Sending half of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiving half of a cancellation pair, passed into each batch stage.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

/// Create a linked handle/signal pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. Pends forever if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}
