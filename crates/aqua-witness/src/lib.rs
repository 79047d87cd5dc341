//! Multi-chain witness coordination for Aqua Protocol chains.
//!
//! Builds on `aqua-core`'s Merkle primitives to aggregate the tips of
//! multiple chains, publish the aggregate root through a pluggable
//! [`backend::WitnessBackend`], and append the resulting `witness` revision
//! to each chain with its own inclusion proof (component D, §4.D).

pub mod backend;
pub mod coordinator;
pub mod errors;

pub use backend::{WitnessBackend, WitnessNetwork, WitnessReceipt};
pub use coordinator::witness_chains;
pub use errors::{WitnessError, WitnessResult};
