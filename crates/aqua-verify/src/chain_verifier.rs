//! The Chain Verifier (component F, §4.F).
//!
//! Walks a chain in insertion order, threading the previous verification
//! hash through the Revision Verifier, and never short-circuits: every
//! revision is checked so a caller gets a complete diagnosis (§7).

use aqua_core::chain::AquaObject;

use crate::config::VerifierConfig;
use crate::revision_verifier::{verify_revision, FileBytesProvider, RevisionResult};
use crate::transaction_oracle::TransactionOracle;

/// Per-revision results in chain order, plus the chain-level aggregate.
#[derive(Debug, Clone)]
pub struct ChainVerificationReport {
    pub results: Vec<RevisionResult>,
}

impl ChainVerificationReport {
    pub fn passed(&self, strict: bool) -> bool {
        self.results.iter().all(|r| r.aggregate(strict))
    }

    /// Indices (in chain order) of revisions whose aggregate failed.
    pub fn failed_indices(&self, strict: bool) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| !r.aggregate(strict))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Verify every revision of `object`, threading `previous_verification_hash`
/// from `""` at genesis through each stored tip hash in turn (§4.F
/// "Algorithm"). Ordering tie-breaks on insertion order; `local_timestamp`
/// is informational only and never consulted here.
pub fn verify_chain(
    object: &AquaObject,
    config: &VerifierConfig,
    files: &dyn FileBytesProvider,
    oracle: &dyn TransactionOracle,
) -> ChainVerificationReport {
    let mut threaded_previous = String::new();
    let mut results = Vec::with_capacity(object.entries().len());

    for entry in object.entries() {
        let external_name = entry
            .revision
            .file_hash()
            .and_then(|fh| object.file_index().get(fh))
            .map(String::as_str);

        let result = verify_revision(
            &entry.revision,
            &entry.verification_hash,
            &threaded_previous,
            config,
            files,
            external_name,
            oracle,
        );
        if !result.aggregate(config.strict) {
            tracing::debug!(
                verification_hash = %entry.verification_hash,
                "revision failed verification"
            );
        }
        results.push(result);
        threaded_previous = entry.verification_hash.clone();
    }

    ChainVerificationReport { results }
}
