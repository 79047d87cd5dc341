//! The Transaction Oracle external collaborator (§6): resolves a witness
//! backend's published record back for verification (§4.E.5.b).

/// What a transaction oracle returns for one network family.
#[derive(Debug, Clone)]
pub enum TransactionRecord {
    /// Ethereum: raw call-data bytes of the transaction.
    Ethereum { input_data: Vec<u8> },
    /// Nostr: the event content (expected to equal the root, hex-encoded).
    Nostr { event_content: String },
    /// TSA (RFC 3161): the timestamped digest extracted from the token.
    Tsa { timestamped_digest: String },
}

/// Looked up by `(network, transaction_hash)`. Implementations wrap a real
/// RPC/relay client; `aqua-verify` never opens a network connection itself.
pub trait TransactionOracle {
    fn get_transaction(&self, network: &str, transaction_hash: &str) -> Option<TransactionRecord>;
}

/// An in-memory oracle for tests: a fixed table of `(network, tx_hash) -> record`.
#[derive(Debug, Default)]
pub struct FixedTransactionOracle {
    records: std::collections::HashMap<(String, String), TransactionRecord>,
}

impl FixedTransactionOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, network: &str, transaction_hash: &str, record: TransactionRecord) {
        self.records.insert((network.to_string(), transaction_hash.to_string()), record);
    }
}

impl TransactionOracle for FixedTransactionOracle {
    fn get_transaction(&self, network: &str, transaction_hash: &str) -> Option<TransactionRecord> {
        self.records.get(&(network.to_string(), transaction_hash.to_string())).cloned()
    }
}
