//! Witness backends: the pluggable transports a Merkle root is published to
//! (§4.D). Only the deterministic wire shape lives here — actual network
//! clients are the host application's concern.

use crate::errors::{WitnessError, WitnessResult};

/// One of the three backend families named in §4.D. Each backend descriptor
/// only captures the shape its transport produces/consumes; it does not open
/// a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WitnessNetwork {
    EthereumMainnet,
    EthereumSepolia,
    EthereumHolesky,
    Nostr,
    TsaRfc3161,
}

impl WitnessNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EthereumMainnet => "mainnet",
            Self::EthereumSepolia => "sepolia",
            Self::EthereumHolesky => "holesky",
            Self::Nostr => "nostr",
            Self::TsaRfc3161 => "TSA_RFC3161",
        }
    }

    pub fn is_ethereum(&self) -> bool {
        matches!(self, Self::EthereumMainnet | Self::EthereumSepolia | Self::EthereumHolesky)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "mainnet" => Some(Self::EthereumMainnet),
            "sepolia" => Some(Self::EthereumSepolia),
            "holesky" => Some(Self::EthereumHolesky),
            "nostr" => Some(Self::Nostr),
            "TSA_RFC3161" => Some(Self::TsaRfc3161),
            _ => None,
        }
    }
}

/// The function selector Ethereum witness transactions call (§4.D, §6).
pub const ETHEREUM_SELECTOR: [u8; 4] = [0x9c, 0xef, 0x4e, 0xa1];

/// Encode a SHA3-512 Merkle root (128 lowercase hex chars) as Ethereum call
/// data: 4-byte selector followed by the 64-byte root, itself already a
/// multiple of the 32-byte EVM word size (§6 "Ethereum transaction format").
pub fn encode_ethereum_calldata(merkle_root_hex: &str) -> WitnessResult<Vec<u8>> {
    let root = hex::decode(merkle_root_hex)
        .map_err(|e| WitnessError::PublishFailed(format!("invalid merkle root hex: {e}")))?;
    if root.len() != 64 {
        return Err(WitnessError::PublishFailed(format!(
            "expected a 64-byte (128 hex char) SHA3-512 root, got {} bytes",
            root.len()
        )));
    }
    let mut out = Vec::with_capacity(4 + 64);
    out.extend_from_slice(&ETHEREUM_SELECTOR);
    out.extend_from_slice(&root);
    Ok(out)
}

/// Inverse of [`encode_ethereum_calldata`]: returns the root hex iff the
/// selector matches and the payload is exactly 64 bytes.
pub fn decode_ethereum_calldata(data: &[u8]) -> Option<String> {
    if data.len() != 4 + 64 || data[..4] != ETHEREUM_SELECTOR {
        return None;
    }
    Some(hex::encode(&data[4..]))
}

/// The result of publishing a Merkle root to a witness backend (§6).
#[derive(Debug, Clone)]
pub struct WitnessReceipt {
    pub transaction_hash: String,
    pub publisher: String,
    pub timestamp: i64,
    pub network: WitnessNetwork,
    pub smart_contract_address: Option<String>,
}

/// A pluggable transport that anchors a Merkle root to some externally
/// verifiable medium (§4.D "Backends"). Blocking by contract (§6) — callers
/// running inside an async runtime are expected to offload this call.
/// `merkle_root_hex` is the 128-char lowercase hex SHA3-512 root.
pub trait WitnessBackend {
    fn publish(&self, merkle_root_hex: &str) -> WitnessResult<WitnessReceipt>;
}

/// An in-memory backend useful for tests and for single-process demos: it
/// "publishes" by assigning a deterministic, caller-supplied transaction hash.
/// Mirrors the teacher's in-memory KV backend's role as a fake for the real
/// transport.
pub struct InMemoryWitnessBackend {
    pub network: WitnessNetwork,
    pub publisher: String,
    pub smart_contract_address: Option<String>,
    pub next_transaction_hash: std::sync::Mutex<Box<dyn FnMut(&str) -> String + Send>>,
    pub clock: std::sync::Mutex<Box<dyn FnMut() -> i64 + Send>>,
}

impl InMemoryWitnessBackend {
    pub fn ethereum_sepolia(contract: &str) -> Self {
        Self {
            network: WitnessNetwork::EthereumSepolia,
            publisher: "0x0000000000000000000000000000000000dEaD".to_string(),
            smart_contract_address: Some(contract.to_string()),
            next_transaction_hash: std::sync::Mutex::new(Box::new(|root| format!("0x{root}"))),
            clock: std::sync::Mutex::new(Box::new(|| 0)),
        }
    }
}

impl WitnessBackend for InMemoryWitnessBackend {
    fn publish(&self, merkle_root_hex: &str) -> WitnessResult<WitnessReceipt> {
        tracing::debug!(network = self.network.as_str(), "publishing witness root");
        let tx_hash = (self.next_transaction_hash.lock().unwrap())(merkle_root_hex);
        let timestamp = (self.clock.lock().unwrap())();
        Ok(WitnessReceipt {
            transaction_hash: tx_hash,
            publisher: self.publisher.clone(),
            timestamp,
            network: self.network,
            smart_contract_address: self.smart_contract_address.clone(),
        })
    }
}

/// A backend that always fails, for exercising the `PublishFailed` path.
pub struct FailingWitnessBackend;

impl WitnessBackend for FailingWitnessBackend {
    fn publish(&self, _merkle_root_hex: &str) -> WitnessResult<WitnessReceipt> {
        Err(WitnessError::PublishFailed("backend unreachable".to_string()))
    }
}
