//! SHA-256 hashing of serializable declarations.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Length of the abbreviated form returned by [`short_hash`].
const SHORT_LEN: usize = 12;

/// Hex SHA-256 of the JSON form of `value`.
///
/// Declaration registries are ordered vectors and extension attributes are
/// `BTreeMap`s, so equal models always produce equal JSON.
pub fn compute_hash<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Leading characters of a full hash, for display.
pub fn short_hash(hash: &str) -> &str {
    hash.get(..SHORT_LEN).unwrap_or(hash)
}
