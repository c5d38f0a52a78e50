pub mod executor;
pub mod types;

pub use executor::BatchExecutor;
pub use types::{
    BuiltTransaction, CancelHandle, CancelSignal, ConfirmationId, FinalizedTransaction,
    TransactionBuilder, cancel_pair,
};
