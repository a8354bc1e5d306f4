//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, TxHash};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use chain_dispatch::blockchain::client::{AccountStateProvider, ChainClient};
use chain_dispatch::{DispatchResult, SubmissionCause};

/// Anvil account #0.
pub const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const PROTOCOL_BSC: &str = "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
pub const PROTOCOL_OKC: &str = "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";

pub const PROTOCOL_ABI: &str = r#"[
  {
    "type": "function",
    "name": "updateFOCAccounts",
    "stateMutability": "nonpayable",
    "inputs": [
      {
        "name": "accounts",
        "type": "tuple[]",
        "internalType": "struct FOCAccount[]",
        "components": [
          { "name": "account", "type": "address", "internalType": "address" },
          { "name": "quota", "type": "uint256", "internalType": "uint256" }
        ]
      },
      { "name": "enabled", "type": "bool", "internalType": "bool" }
    ],
    "outputs": []
  }
]"#;

pub const CONTRACTS_YAML: &str = r#"
- contract_name: UxuyProtocol
  abi_file: protocol.abi
  deployment:
    - chain_id: 56
      address: "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"
    - chain_id: 66
      address: "0xBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB"
"#;

pub const CHAINS_YAML: &str = r#"
- id: 56
  endpoints:
    - https://bsc-dataseed.example
    - https://bsc-backup.example
- id: 66
  endpoints:
    - https://exchainrpc.example
  support_eip1559: false
- id: 1
  endpoints: []
"#;

pub const BATCH_YAML: &str = r#"
- chain_id: 56
  accounts:
    - account: "0x0000000000000000000000000000000000000001"
      quota: 100
    - account: "0x0000000000000000000000000000000000000002"
      quota: "250"
- chain_id: 66
  accounts: []
"#;

/// Write a metadata repository under `root` in the default layout.
pub fn write_metadata(root: &Path, contracts_yaml: &str, chains_yaml: &str) {
    std::fs::create_dir_all(root.join("deployment")).unwrap();
    std::fs::create_dir_all(root.join("chains")).unwrap();
    std::fs::write(root.join("deployment/contracts.yaml"), contracts_yaml).unwrap();
    std::fs::write(root.join("deployment/protocol.abi"), PROTOCOL_ABI).unwrap();
    std::fs::write(root.join("chains/chains.yaml"), chains_yaml).unwrap();
}

/// Temporary metadata repository with the standard fixtures.
pub fn metadata_fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_metadata(dir.path(), CONTRACTS_YAML, CHAINS_YAML);
    dir
}

/// In-memory chain: hands out nonces and records every raw submission.
///
/// Accepting a submission advances the nonce, like a node would.
pub struct MockChain {
    nonce: AtomicU64,
    reject_with: Mutex<Option<SubmissionCause>>,
    submitted: Mutex<Vec<Bytes>>,
    nonce_queries: AtomicU64,
}

impl MockChain {
    pub fn new(start_nonce: u64) -> Arc<Self> {
        Arc::new(Self {
            nonce: AtomicU64::new(start_nonce),
            reject_with: Mutex::new(None),
            submitted: Mutex::new(Vec::new()),
            nonce_queries: AtomicU64::new(0),
        })
    }

    /// Fail every following submission with `cause`.
    pub fn reject_with(&self, cause: SubmissionCause) {
        *self.reject_with.lock().unwrap() = Some(cause);
    }

    /// Accept submissions again.
    pub fn accept(&self) {
        *self.reject_with.lock().unwrap() = None;
    }

    pub fn submitted(&self) -> Vec<Bytes> {
        self.submitted.lock().unwrap().clone()
    }

    /// Decoded envelopes of every submission, in order.
    pub fn submitted_envelopes(&self) -> Vec<TxEnvelope> {
        self.submitted()
            .iter()
            .map(|raw| TxEnvelope::decode_2718(&mut &raw[..]).unwrap())
            .collect()
    }

    pub fn nonce_queries(&self) -> u64 {
        self.nonce_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountStateProvider for MockChain {
    async fn next_nonce(&self, _address: Address) -> DispatchResult<u64> {
        self.nonce_queries.fetch_add(1, Ordering::SeqCst);
        // Give concurrent dispatches a chance to interleave
        tokio::task::yield_now().await;
        Ok(self.nonce.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn endpoint(&self) -> &str {
        "mock://chain"
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, SubmissionCause> {
        self.submitted.lock().unwrap().push(Bytes::copy_from_slice(raw));
        if let Some(cause) = self.reject_with.lock().unwrap().clone() {
            return Err(cause);
        }
        self.nonce.fetch_add(1, Ordering::SeqCst);
        Ok(keccak256(raw))
    }
}

/// Nonce source reporting whatever pending count it was last given, like a
/// node whose mempool view lags behind or jumps ahead.
pub struct NodeNonce {
    value: AtomicU64,
}

impl NodeNonce {
    pub fn new(value: u64) -> Arc<Self> {
        Arc::new(Self {
            value: AtomicU64::new(value),
        })
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl AccountStateProvider for NodeNonce {
    async fn next_nonce(&self, _address: Address) -> DispatchResult<u64> {
        Ok(self.value.load(Ordering::SeqCst))
    }
}

/// Start a mock JSON-RPC node on an ephemeral port.
///
/// `handler` gets the method and params of each request and returns either
/// a `result` value or an `(code, message)` error.
pub async fn start_mock_rpc<F>(handler: F) -> SocketAddr
where
    F: Fn(&str, &Value) -> Result<Value, (i64, String)> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_http_body(&mut socket).await else {
                            return;
                        };
                        let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                        let method = request["method"].as_str().unwrap_or_default().to_string();
                        let params = request["params"].clone();

                        let reply = match handler(&method, &params) {
                            Ok(result) => json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "result": result
                            }),
                            Err((code, message)) => json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "error": {"code": code, "message": message}
                            }),
                        };
                        let reply = reply.to_string();

                        let response_str = format!(
                            "HTTP/1.1 200 OK\r\n\
                             Content-Type: application/json\r\n\
                             Content-Length: {}\r\n\
                             Connection: close\r\n\r\n{}",
                            reply.len(),
                            reply
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read one HTTP request and return its body.
async fn read_http_body(socket: &mut tokio::net::TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(buf[header_end..].to_vec())
}
