use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use ethers::providers::{Http, Provider, RpcError};
use ethers::utils::hex;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::Ledger;
use crate::batch::{ConfirmationId, FinalizedTransaction};
use crate::config::ClientConfig;
use crate::errors::LedgerError;

/// JSON-RPC ledger connection.
///
/// Sends each transaction with `sendTransaction` in batch order and stops at
/// the first failure. Transactions sent before the failure stay sent.
#[derive(Clone, Debug)]
pub struct RpcLedger {
    provider: Provider<Http>,
    skip_preflight: bool,
    preflight_commitment: String,
}

impl RpcLedger {
    pub fn new(config: &ClientConfig) -> Self {
        let provider = Provider::new(Http::new(config.rpc_url.clone()));
        Self {
            provider,
            skip_preflight: config.skip_preflight,
            preflight_commitment: config.preflight_commitment.clone(),
        }
    }

    fn send_params(&self, tx: &FinalizedTransaction) -> Value {
        send_transaction_params(tx, self.skip_preflight, &self.preflight_commitment)
    }
}

fn send_transaction_params(
    tx: &FinalizedTransaction,
    skip_preflight: bool,
    preflight_commitment: &str,
) -> Value {
    json!([
        BASE64.encode(&tx.payload),
        {
            "encoding": "base64",
            "skipPreflight": skip_preflight,
            "preflightCommitment": preflight_commitment,
        }
    ])
}

impl Ledger for RpcLedger {
    async fn submit_batch(
        &self,
        transactions: Vec<FinalizedTransaction>,
    ) -> Result<Vec<ConfirmationId>, LedgerError> {
        let mut ids = Vec::with_capacity(transactions.len());
        for (position, tx) in transactions.iter().enumerate() {
            let params = self.send_params(tx);
            match self
                .provider
                .request::<_, String>("sendTransaction", params)
                .await
            {
                Ok(signature) => {
                    debug!(
                        index = tx.index,
                        digest = %hex::encode(tx.digest),
                        %signature,
                        "[LEDGER] transaction accepted"
                    );
                    ids.push(ConfirmationId(signature));
                }
                Err(e) => {
                    warn!(
                        index = tx.index,
                        accepted = position,
                        error = %e,
                        "[LEDGER] send failed, earlier transactions remain submitted"
                    );
                    // A JSON-RPC error body means the node answered and refused.
                    return Err(if e.as_error_response().is_some() {
                        LedgerError::Rejected {
                            index: tx.index,
                            reason: e.to_string(),
                        }
                    } else {
                        LedgerError::Rpc(e.to_string())
                    });
                }
            }
        }
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::Address;
    use crate::batch::BuiltTransaction;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    fn tx(index: usize) -> FinalizedTransaction {
        FinalizedTransaction::new(
            index,
            BuiltTransaction {
                message: vec![index as u8],
                signers: vec![Address([1; 32])],
            },
        )
    }

    fn config_for(url: &str) -> ClientConfig {
        ClientConfig {
            rpc_url: url.parse().unwrap(),
            skip_preflight: false,
            preflight_commitment: "confirmed".to_string(),
        }
    }

    /// Minimal HTTP JSON-RPC node: answers `sig-N` for the first
    /// `accept` calls and a JSON-RPC error afterwards.
    async fn spawn_node(accept: usize) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_connection(stream, Arc::clone(&counter), accept));
            }
        });
        (url, calls)
    }

    async fn serve_connection(stream: TcpStream, calls: Arc<AtomicUsize>, accept: usize) {
        let (read, mut write) = stream.into_split();
        let mut reader = BufReader::new(read);
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            let mut content_length = 0usize;
            loop {
                line.clear();
                if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                    return;
                }
                let header = line.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut body = vec![0u8; content_length];
            if reader.read_exact(&mut body).await.is_err() {
                return;
            }
            let request: Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(request["method"], "sendTransaction");

            let n = calls.fetch_add(1, Ordering::SeqCst);
            let response = if n < accept {
                json!({"jsonrpc": "2.0", "id": request["id"], "result": format!("sig-{n}")})
            } else {
                json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "error": {"code": -32002, "message": "Transaction simulation failed"}
                })
            }
            .to_string();
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n",
                response.len()
            );
            if write.write_all(head.as_bytes()).await.is_err()
                || write.write_all(response.as_bytes()).await.is_err()
            {
                return;
            }
        }
    }

    #[tokio::test]
    async fn returns_signatures_in_order() {
        let (url, calls) = spawn_node(usize::MAX).await;
        let ledger = RpcLedger::new(&config_for(&url));
        let ids = tokio::time::timeout(
            Duration::from_secs(10),
            ledger.submit_batch((0..3).map(tx).collect()),
        )
        .await
        .unwrap()
        .unwrap();
        let ids: Vec<String> = ids.into_iter().map(|id| id.0).collect();
        assert_eq!(ids, ["sig-0", "sig-1", "sig-2"]);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_first_rejection() {
        let (url, calls) = spawn_node(2).await;
        let ledger = RpcLedger::new(&config_for(&url));
        let err = tokio::time::timeout(
            Duration::from_secs(10),
            ledger.submit_batch((0..4).map(tx).collect()),
        )
        .await
        .unwrap()
        .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { index: 2, .. }), "{err:?}");
        // Two went through before the rejection; the fourth was never sent.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unreachable_node_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let ledger = RpcLedger::new(&config_for(&url));
        let err = ledger.submit_batch(vec![tx(0)]).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rpc(_)), "{err:?}");
    }

    #[test]
    fn params_encode_payload_as_base64() {
        let tx = FinalizedTransaction::new(
            0,
            BuiltTransaction {
                message: vec![1, 2, 3, 4],
                signers: vec![Address([5; 32])],
            },
        );
        let params = send_transaction_params(&tx, true, "processed");
        assert_eq!(params[0], "AQIDBA==");
        assert_eq!(params[1]["encoding"], "base64");
        assert_eq!(params[1]["skipPreflight"], true);
        assert_eq!(params[1]["preflightCommitment"], "processed");
    }

    #[test]
    fn ledger_takes_settings_from_config() {
        let config = ClientConfig {
            rpc_url: "http://127.0.0.1:8899".parse().unwrap(),
            skip_preflight: false,
            preflight_commitment: "finalized".to_string(),
        };
        let ledger = RpcLedger::new(&config);
        assert!(!ledger.skip_preflight);
        assert_eq!(ledger.preflight_commitment, "finalized");
    }
}
