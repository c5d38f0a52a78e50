use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Which half of a batch call was running when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStage {
    Finalize,
    Submit,
}

impl fmt::Display for BatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchStage::Finalize => f.write_str("finalize"),
            BatchStage::Submit => f.write_str("submit"),
        }
    }
}

/// A single request that could not be finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    /// Position of the request in the caller's input.
    pub index: usize,
    pub cause: String,
}

/// Errors reported by a ledger connection.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction {index} rejected: {reason}")]
    Rejected { index: usize, reason: String },

    #[error("Expected {expected} confirmations, ledger returned {actual}")]
    ConfirmationMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("sqrt_price_x64 does not fit in 128 bits")]
    Overflow,

    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    #[error("Failed to finalize {} transaction(s): {}", .failures.len(), describe(.failures))]
    BuildFailure { failures: Vec<BuildFailure> },

    /// The submission call failed. Some transactions of the batch may still
    /// have been applied by the ledger.
    #[error("Batch submission failed: {0}")]
    Submission(#[source] LedgerError),

    #[error("Batch cancelled during {stage} stage")]
    Cancelled { stage: BatchStage },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl ClientError {
    /// Indices of the requests that failed to finalize, if this is a build failure.
    pub fn failed_indices(&self) -> Vec<usize> {
        match self {
            ClientError::BuildFailure { failures } => failures.iter().map(|f| f.index).collect(),
            _ => Vec::new(),
        }
    }
}

fn describe(failures: &[BuildFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("#{} ({})", f.index, f.cause))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_failure_message_names_every_index() {
        let err = ClientError::BuildFailure {
            failures: vec![
                BuildFailure {
                    index: 1,
                    cause: "missing signer".into(),
                },
                BuildFailure {
                    index: 4,
                    cause: "bad blockhash".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("#1 (missing signer)"));
        assert!(msg.contains("#4 (bad blockhash)"));
        assert_eq!(err.failed_indices(), vec![1, 4]);
    }

    #[test]
    fn submission_error_keeps_ledger_source() {
        let err = ClientError::Submission(LedgerError::Rejected {
            index: 2,
            reason: "blockhash not found".into(),
        });
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("Transaction 2 rejected: blockhash not found")
        );
        assert!(err.failed_indices().is_empty());
    }
}
