//! Content fingerprints for built schemas.
//!
//! A schema records the hash of the model it was built from so downstream
//! generators can tell whether their output is stale.

mod hash;
pub use hash::{compute_hash, short_hash};
