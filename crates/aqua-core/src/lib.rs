//! Revision model, canonical hashing, and chain storage for Aqua Protocol chains.
//!
//! This crate is the lowest layer: it has no knowledge of networks, wallets,
//! or the transaction oracles that witnessing and verification need. It
//! builds revisions (component B), hashes them (component A), and holds them
//! in an ordered, invariant-checked chain (component C). See `aqua-witness`
//! for multi-chain witnessing and `aqua-verify` for the verification engine.

pub mod builder;
pub mod canonical_json;
pub mod chain;
pub mod errors;
pub mod hash;
pub mod legacy;
pub mod merkle;
pub mod revision;

pub use chain::{AquaObject, ChainEntry, SchemaVersion};
pub use errors::{AquaError, AquaResult};
pub use revision::{Revision, RevisionKind};
