//! Error types for aqua-core.
//!
//! Errors are structured, explicit, and stable. Messages are intended to be
//! human-readable while preserving machine-level categorization.

use std::fmt::{self, Display};

/// Result type used throughout aqua-core.
pub type AquaResult<T> = Result<T, AquaError>;

/// Top-level error type for aqua-core.
#[derive(Debug)]
pub enum AquaError {
    /// A structural invariant of an aqua object was violated while loading it.
    CorruptChain { message: String },

    /// A `file`/`form` revision's `file_hash` already appears in the chain.
    DuplicateContent { file_hash: String },

    /// A `link` revision referenced a `.aqua.json` URI, or a hash already
    /// present in the chain's file index.
    InvalidLink { message: String },

    /// Invalid or unsupported argument.
    InvalidArgument { message: String },

    /// Canonicalization failure.
    Canonicalization { message: String },

    /// Hashing or Merkle tree construction failure.
    Hashing { message: String },

    /// Serialization or deserialization failure.
    Serialization { message: String },
}

impl AquaError {
    pub fn corrupt_chain<M: Into<String>>(message: M) -> Self {
        Self::CorruptChain { message: message.into() }
    }

    pub fn duplicate_content<M: Into<String>>(file_hash: M) -> Self {
        Self::DuplicateContent { file_hash: file_hash.into() }
    }

    pub fn invalid_link<M: Into<String>>(message: M) -> Self {
        Self::InvalidLink { message: message.into() }
    }

    pub fn invalid_argument<M: Into<String>>(message: M) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    pub fn canonicalization<M: Into<String>>(message: M) -> Self {
        Self::Canonicalization { message: message.into() }
    }

    pub fn hashing<M: Into<String>>(message: M) -> Self {
        Self::Hashing { message: message.into() }
    }

    pub fn serialization<M: Into<String>>(message: M) -> Self {
        Self::Serialization { message: message.into() }
    }
}

impl Display for AquaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptChain { message } => write!(f, "corrupt chain: {message}"),
            Self::DuplicateContent { file_hash } => {
                write!(f, "duplicate content: file_hash {file_hash} already in chain")
            }
            Self::InvalidLink { message } => write!(f, "invalid link: {message}"),
            Self::InvalidArgument { message } => write!(f, "invalid argument: {message}"),
            Self::Canonicalization { message } => write!(f, "canonicalization error: {message}"),
            Self::Hashing { message } => write!(f, "hashing error: {message}"),
            Self::Serialization { message } => write!(f, "serialization error: {message}"),
        }
    }
}

impl std::error::Error for AquaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_corrupt_chain() {
        let e = AquaError::corrupt_chain("missing previous_verification_hash");
        assert_eq!(format!("{e}"), "corrupt chain: missing previous_verification_hash");
    }

    #[test]
    fn display_duplicate_content() {
        let e = AquaError::duplicate_content("abcd");
        assert_eq!(format!("{e}"), "duplicate content: file_hash abcd already in chain");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AquaError>();
    }
}
