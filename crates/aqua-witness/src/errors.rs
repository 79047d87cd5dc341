//! Error types for aqua-witness.

use thiserror::Error;

pub type WitnessResult<T> = Result<T, WitnessError>;

#[derive(Debug, Error)]
pub enum WitnessError {
    #[error("witness backend rejected publish: {0}")]
    PublishFailed(String),

    #[error("witness backend publish was cancelled")]
    Cancelled,

    #[error(transparent)]
    Core(#[from] aqua_core::AquaError),
}
