//! Fresh identifier generation for blocks and ledger entries.

use uuid::Uuid;

/// Returns a new unique id with a short type prefix, e.g. `c-4f1a...`.
///
/// Prefixes in use: `c` characters (builder and manual blocks), `p`
/// presets, `a` refinery actors, `h` history entries.
pub(crate) fn fresh(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}
