//! Verifier configuration (§6 "Configuration").

use aqua_core::chain::SchemaVersion;
use serde::{Deserialize, Serialize};

fn default_verify_merkle_proof() -> bool {
    true
}

/// Options the Revision/Chain Verifier recognize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Selects the v1.2 vs current revision decoder (§9).
    pub schema_version: SchemaVersion,

    /// Required to resolve Ethereum witness transactions by hash.
    #[serde(default)]
    pub alchemy_or_rpc_key: Option<String>,

    /// If true, MISSING sub-results demote the revision's aggregate to FAIL
    /// instead of being ignored.
    #[serde(default)]
    pub strict: bool,

    /// Whether to traverse and check a revision's `witness_merkle_proof`,
    /// beyond matching the on-chain root.
    #[serde(default = "default_verify_merkle_proof")]
    pub verify_merkle_proof: bool,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            schema_version: SchemaVersion::Current,
            alchemy_or_rpc_key: None,
            strict: false,
            verify_merkle_proof: true,
        }
    }
}

impl VerifierConfig {
    pub fn require_rpc_key(&self) -> crate::errors::VerifyResult<&str> {
        self.alchemy_or_rpc_key
            .as_deref()
            .ok_or(crate::errors::VerifyError::ConfigMissing("alchemy_or_rpc_key"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = VerifierConfig::default();
        assert_eq!(cfg.schema_version, SchemaVersion::Current);
        assert!(!cfg.strict);
        assert!(cfg.verify_merkle_proof);
        assert!(cfg.alchemy_or_rpc_key.is_none());
    }

    #[test]
    fn missing_rpc_key_is_config_missing() {
        let cfg = VerifierConfig::default();
        assert!(cfg.require_rpc_key().is_err());
    }
}
