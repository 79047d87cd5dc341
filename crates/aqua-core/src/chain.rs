//! The Chain Store (component C).
//!
//! [`AquaObject`] is the in-memory, content-addressed, insertion-ordered store
//! for one aqua chain: a genesis `file` revision followed by zero or more
//! appended revisions, plus the `file_index` that maps every hash the chain
//! knows about to an external name (§3, §4.C).
//!
//! Structural invariants enforced on every mutation (§4.C "Invariants"):
//! 1. The genesis revision's `previous_verification_hash` is empty.
//! 2. Every subsequent revision's `previous_verification_hash` equals the
//!    previous revision's verification hash.
//! 3. No two `file`/`form` revisions share a `file_hash`.
//! 4. Every hash in `file_index` corresponds to a revision or link target
//!    actually present in the chain.
//! 5. `append_*` is all-or-nothing: a rejected append leaves the object
//!    exactly as it was (§7).

use indexmap::IndexMap;
use serde_json::Value;

use crate::builder::{self, FileMaterial, LinkTarget, WitnessMaterial};
use crate::errors::{AquaError, AquaResult};
use crate::revision::{self, Revision, RevisionKind};

/// Selects which on-wire revision shape `open()` expects (§9 "Dual schema
/// versions"). Both are decoded; only `Current` is ever produced on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum SchemaVersion {
    /// Legacy v1.2: revisions carry a `metadata_hash` in place of today's
    /// flat scalar/Merkle verification hash split.
    V1_2,
    #[default]
    Current,
}

/// One revision together with the verification hash it was built with.
#[derive(Debug, Clone)]
pub struct ChainEntry {
    pub verification_hash: String,
    pub revision: Revision,
}

/// A single aqua chain: genesis revision, its appended history, and the
/// file index. Construction always goes through `genesis_file` or `open`;
/// there is no empty/default state (§4.C "Global state: none required" still
/// holds for the module, but an object always has at least one revision).
#[derive(Debug, Clone)]
pub struct AquaObject {
    entries: Vec<ChainEntry>,
    /// hash (file_hash or linked tip verification_hash) -> external name.
    file_index: IndexMap<String, String>,
    schema_version: SchemaVersion,
}

impl AquaObject {
    /// Start a new chain with a genesis `file` revision.
    pub fn genesis_file(
        local_timestamp: &str,
        file_hash: &str,
        file_nonce: &str,
        content: Option<&[u8]>,
        external_name: &str,
    ) -> AquaResult<Self> {
        let material = FileMaterial { file_hash, file_nonce, content };
        let (revision, vhash) = builder::build_file("", local_timestamp, &material)?;

        let mut file_index = IndexMap::new();
        file_index.insert(file_hash.to_string(), external_name.to_string());

        Ok(Self {
            entries: vec![ChainEntry { verification_hash: vhash, revision }],
            file_index,
            schema_version: SchemaVersion::Current,
        })
    }

    /// Reconstruct an `AquaObject` from an already-assembled, ordered list of
    /// `(verification_hash, revision)` entries and a file index, validating
    /// every structural invariant (§4.C). Used when loading a chain that was
    /// built elsewhere (e.g. decoded from the wire format, §6).
    pub fn open(
        entries: Vec<ChainEntry>,
        file_index: IndexMap<String, String>,
        schema_version: SchemaVersion,
    ) -> AquaResult<Self> {
        if entries.is_empty() {
            return Err(AquaError::corrupt_chain("an aqua object must have at least one revision"));
        }
        if !entries[0].revision.previous_verification_hash().is_empty() {
            return Err(AquaError::corrupt_chain(
                "genesis revision must have an empty previous_verification_hash",
            ));
        }
        for pair in entries.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if !revision::hashes_equal(next.revision.previous_verification_hash(), &prev.verification_hash) {
                return Err(AquaError::corrupt_chain(format!(
                    "broken linkage: revision links to {} but predecessor's hash is {}",
                    next.revision.previous_verification_hash(),
                    prev.verification_hash
                )));
            }
        }

        let mut seen_file_hashes = std::collections::HashSet::new();
        for entry in &entries {
            if let Some(fh) = entry.revision.file_hash() {
                if !seen_file_hashes.insert(revision::normalize_hash(fh)) {
                    return Err(AquaError::duplicate_content(fh.to_string()));
                }
            }
        }

        let object = Self { entries, file_index, schema_version };
        object.validate_file_index()?;
        Ok(object)
    }

    /// Parse the §6 wire/persistence format — `{ revisions: { <vhash>:
    /// <revision>, … }, file_index: { <hash>: <name>, … } }`, with keys
    /// preserved in insertion order via `serde_json`'s `preserve_order`
    /// feature — into an `AquaObject`, then run it through [`Self::open`]'s
    /// invariant checks. `schema_version` selects the v1.2-vs-current
    /// decoder the same way `VerifierConfig::schema_version` does.
    pub fn from_wire_json(bytes: &[u8], schema_version: SchemaVersion) -> AquaResult<Self> {
        let document: Value =
            serde_json::from_slice(bytes).map_err(|e| AquaError::serialization(format!("invalid JSON: {e}")))?;
        let Value::Object(mut document) = document else {
            return Err(AquaError::serialization("wire document must be a JSON object"));
        };

        let revisions = document
            .remove("revisions")
            .ok_or_else(|| AquaError::serialization("wire document missing \"revisions\""))?;
        let Value::Object(revisions) = revisions else {
            return Err(AquaError::serialization("\"revisions\" must be a JSON object"));
        };

        let mut entries = Vec::with_capacity(revisions.len());
        for (verification_hash, fields) in revisions {
            let Value::Object(fields) = fields else {
                return Err(AquaError::serialization(format!("revision {verification_hash} must be a JSON object")));
            };
            entries.push(ChainEntry { verification_hash, revision: Revision::from_fields(fields) });
        }

        let file_index = match document.remove("file_index") {
            Some(Value::Object(file_index)) => file_index
                .into_iter()
                .map(|(hash, name)| {
                    let name = name
                        .as_str()
                        .ok_or_else(|| AquaError::serialization(format!("file_index entry {hash} must be a string")))?
                        .to_string();
                    Ok((hash, name))
                })
                .collect::<AquaResult<IndexMap<String, String>>>()?,
            Some(_) => return Err(AquaError::serialization("\"file_index\" must be a JSON object")),
            None => IndexMap::new(),
        };

        Self::open(entries, file_index, schema_version)
    }

    fn validate_file_index(&self) -> AquaResult<()> {
        for hash in self.file_index.keys() {
            let known = self
                .entries
                .iter()
                .any(|e| e.revision.file_hash().is_some_and(|fh| revision::hashes_equal(fh, hash)))
                || self
                    .entries
                    .iter()
                    .any(|e| e.revision.link_file_hashes().iter().any(|lh| revision::hashes_equal(lh, hash)))
                || self
                    .entries
                    .iter()
                    .any(|e| e.revision.link_verification_hashes().iter().any(|lh| revision::hashes_equal(lh, hash)));
            if !known {
                return Err(AquaError::corrupt_chain(format!(
                    "file_index entry {hash} does not correspond to any revision in the chain"
                )));
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    pub fn file_index(&self) -> &IndexMap<String, String> {
        &self.file_index
    }

    pub fn schema_version(&self) -> SchemaVersion {
        self.schema_version
    }

    /// The chain's tip: the most recently appended entry.
    pub fn tip(&self) -> &ChainEntry {
        self.entries.last().expect("an aqua object always has at least one revision")
    }

    pub fn genesis(&self) -> &ChainEntry {
        &self.entries[0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    fn has_file_hash(&self, file_hash: &str) -> bool {
        self.entries.iter().any(|e| e.revision.file_hash().is_some_and(|fh| revision::hashes_equal(fh, file_hash)))
    }

    fn push(&mut self, entry: ChainEntry) {
        self.entries.push(entry);
    }

    /// Append a `file` revision. Rejects a `file_hash` already present
    /// anywhere in the chain (`DUPLICATE_CONTENT`, §7).
    pub fn append_file(
        &mut self,
        local_timestamp: &str,
        file_hash: &str,
        file_nonce: &str,
        content: Option<&[u8]>,
        external_name: &str,
    ) -> AquaResult<&ChainEntry> {
        if self.has_file_hash(file_hash) {
            return Err(AquaError::duplicate_content(file_hash.to_string()));
        }
        let material = FileMaterial { file_hash, file_nonce, content };
        let (revision, vhash) = builder::build_file(&self.tip().verification_hash, local_timestamp, &material)?;

        self.file_index.insert(file_hash.to_string(), external_name.to_string());
        self.push(ChainEntry { verification_hash: vhash, revision });
        debug_append("file", self.tip());
        Ok(self.tip())
    }

    /// Append a `form` revision. Rejects a `file_hash` already present
    /// anywhere in the chain (`DUPLICATE_CONTENT`, §7).
    pub fn append_form(
        &mut self,
        local_timestamp: &str,
        file_hash: &str,
        file_nonce: &str,
        content: Option<&[u8]>,
        form_fields: &[(String, Value)],
        external_name: &str,
    ) -> AquaResult<&ChainEntry> {
        if self.has_file_hash(file_hash) {
            return Err(AquaError::duplicate_content(file_hash.to_string()));
        }
        let material = FileMaterial { file_hash, file_nonce, content };
        let (revision, vhash) =
            builder::build_form(&self.tip().verification_hash, local_timestamp, &material, form_fields)?;

        self.file_index.insert(file_hash.to_string(), external_name.to_string());
        self.push(ChainEntry { verification_hash: vhash, revision });
        debug_append("form", self.tip());
        Ok(self.tip())
    }

    /// Append a `signature` revision.
    pub fn append_signature(
        &mut self,
        local_timestamp: &str,
        signature: &str,
        public_key: &str,
        wallet_address: &str,
        signature_type: &str,
    ) -> AquaResult<&ChainEntry> {
        let (revision, vhash) = builder::build_signature(
            &self.tip().verification_hash,
            local_timestamp,
            signature,
            public_key,
            wallet_address,
            signature_type,
        )?;
        self.push(ChainEntry { verification_hash: vhash, revision });
        debug_append("signature", self.tip());
        Ok(self.tip())
    }

    /// Append a `witness` revision.
    pub fn append_witness(
        &mut self,
        local_timestamp: &str,
        material: &WitnessMaterial<'_>,
    ) -> AquaResult<&ChainEntry> {
        let (revision, vhash) = builder::build_witness(&self.tip().verification_hash, local_timestamp, material)?;
        self.push(ChainEntry { verification_hash: vhash, revision });
        debug_append("witness", self.tip());
        Ok(self.tip())
    }

    /// Append a `link` revision. Rejects any target whose `file_hash` is
    /// already indexed in this chain (`INVALID_LINK`, §7) in addition to the
    /// `.aqua.json`-suffix check performed by the builder.
    pub fn append_link(
        &mut self,
        local_timestamp: &str,
        targets: &[LinkTarget],
        require_indepth_verification: bool,
    ) -> AquaResult<&ChainEntry> {
        for t in targets {
            if self.file_index.contains_key(&t.file_hash) {
                return Err(AquaError::invalid_link(format!(
                    "file_hash {} is already indexed in this chain",
                    t.file_hash
                )));
            }
        }
        let (revision, vhash) =
            builder::build_link(&self.tip().verification_hash, local_timestamp, targets, require_indepth_verification)?;

        for t in targets {
            self.file_index.insert(t.file_hash.clone(), t.external_name.clone());
            self.file_index.insert(t.verification_hash.clone(), t.external_name.clone());
        }
        self.push(ChainEntry { verification_hash: vhash, revision });
        debug_append("link", self.tip());
        Ok(self.tip())
    }

    /// Roll back the most recently appended revision, cascading the
    /// `file_index` entries it introduced (§3 "Lifecycle", §4.C), so that
    /// `append(X); remove_tip()` restores byte-identical state (§8 property
    /// 4). Never removes the genesis revision.
    pub fn remove_tip(&mut self) -> AquaResult<ChainEntry> {
        if self.entries.len() <= 1 {
            return Err(AquaError::invalid_argument("cannot remove the genesis revision"));
        }
        let removed = self.entries.pop().expect("checked len > 1");
        match removed.revision.kind() {
            Some(RevisionKind::File) | Some(RevisionKind::Form) => {
                if let Some(fh) = removed.revision.file_hash() {
                    self.file_index.shift_remove(fh);
                }
            }
            Some(RevisionKind::Link) => {
                for h in removed.revision.link_file_hashes() {
                    self.file_index.shift_remove(&h);
                }
                for h in removed.revision.link_verification_hashes() {
                    self.file_index.shift_remove(&h);
                }
            }
            _ => {}
        }
        tracing::debug!(verification_hash = %removed.verification_hash, "rolled back tip revision");
        Ok(removed)
    }
}

fn debug_append(kind: &str, entry: &ChainEntry) {
    tracing::debug!(kind, verification_hash = %entry.verification_hash, "appended revision");
}
