//! Configuration loader and client settings.

use url::Url;

use crate::errors::{ClientError, Result};

const DEFAULT_PREFLIGHT_COMMITMENT: &str = "confirmed";
const COMMITMENT_LEVELS: [&str; 3] = ["processed", "confirmed", "finalized"];

/// Settings for talking to the ledger.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the ledger node.
    pub rpc_url: Url,
    /// Skip the node's pre-submission simulation.
    pub skip_preflight: bool,
    /// Commitment level used for preflight checks.
    pub preflight_commitment: String,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// `RPC_URL` is required. `SKIP_PREFLIGHT` defaults to `false` and
    /// `PREFLIGHT_COMMITMENT` to `confirmed`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("RPC_URL")
            .ok_or_else(|| ClientError::Config("Set RPC_URL to the ledger JSON-RPC endpoint".into()))?;
        let rpc_url = Url::parse(&raw_url)?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "RPC_URL must be http(s), got {}",
                rpc_url.scheme()
            )));
        }

        let skip_preflight = match lookup("SKIP_PREFLIGHT").as_deref() {
            None | Some("") => false,
            Some("1") | Some("true") => true,
            Some("0") | Some("false") => false,
            Some(other) => {
                return Err(ClientError::Config(format!(
                    "SKIP_PREFLIGHT must be true/false, got {other:?}"
                )));
            }
        };

        let preflight_commitment = lookup("PREFLIGHT_COMMITMENT")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_PREFLIGHT_COMMITMENT.into());
        if !COMMITMENT_LEVELS.contains(&preflight_commitment.as_str()) {
            return Err(ClientError::Config(format!(
                "PREFLIGHT_COMMITMENT must be one of {COMMITMENT_LEVELS:?}, got {preflight_commitment:?}"
            )));
        }

        Ok(Self {
            rpc_url,
            skip_preflight,
            preflight_commitment,
        })
    }
}
