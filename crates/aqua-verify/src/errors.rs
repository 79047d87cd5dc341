//! Error types for aqua-verify.

use thiserror::Error;

pub type VerifyResult<T> = Result<T, VerifyError>;

/// Errors that can prevent verification from running at all. Per-revision
/// outcomes (§7 "Propagation") are never raised as errors — they're
/// collected into [`crate::revision_verifier::RevisionResult`] instead.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("required configuration option missing: {0}")]
    ConfigMissing(&'static str),

    #[error(transparent)]
    Core(#[from] aqua_core::AquaError),

    #[error(transparent)]
    Witness(#[from] aqua_witness::WitnessError),
}
