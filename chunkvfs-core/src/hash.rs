//! Hash families shared by archives, the hashtable and the tree.

use xxhash_rust::xxh3::xxh3_64;
use xxhash_rust::xxh64::xxh64;

/// Archive key for a logical path: xxHash64 (seed 0) over the lower-cased path.
pub fn path_hash(path: &str) -> u64 {
    xxh64(path.to_lowercase().as_bytes(), 0)
}

/// Fast hash of a single path component, used for directory lookups.
/// Case-sensitive, unlike [`path_hash`].
#[inline]
pub fn name_hash(name: &str) -> u64 {
    xxh3_64(name.as_bytes())
}

/// Fixed-width lowercase hex, the placeholder name for unresolved chunks.
#[inline]
pub fn hex16(hash: u64) -> String {
    format!("{hash:016x}")
}
