//! Case-insensitive byte-wise collation for dictionary indexes.
//!
//! The same comparison drives every sort in the engine and is installed
//! into the Odyssey SQLite index as its key collation, so the order used
//! to build an index always matches the order used to search it.

use std::cmp::Ordering;

/// Lower-case a key the way the index formats expect: an ASCII byte-level
/// fold, not full Unicode case folding. Non-ASCII bytes pass through.
pub fn fold_key(key: &str) -> String {
    key.to_ascii_lowercase()
}

/// Compare two keys case-insensitively, byte-wise.
///
/// Total and antisymmetric; keys differing only in ASCII case compare
/// equal. Callers needing a strict total order must tie-break themselves
/// (stable sorts keep insertion order for equal keys, which is what the
/// writers rely on).
pub fn compare(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let len = a.len().min(b.len());
    for i in 0..len {
        match a[i].to_ascii_lowercase().cmp(&b[i].to_ascii_lowercase()) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}
