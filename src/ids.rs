//! Item ID normalization
//!
//! Game data names items `item_<digits>`, while inventory exports often carry
//! only the bare number. Both forms refer to the same item.

use std::sync::LazyLock;

use regex::Regex;

pub const ITEM_PREFIX: &str = "item_";

static BARE_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid numeric id pattern"));

/// Canonical form of an ID: bare numbers gain the `item_` prefix, anything
/// else is kept as given.
pub fn canonical(id: &str) -> String {
    let id = id.trim();
    if BARE_NUMERIC.is_match(id) {
        format!("{ITEM_PREFIX}{id}")
    } else {
        id.to_string()
    }
}

/// The ID with a leading `item_` removed, if present.
pub fn stripped(id: &str) -> &str {
    let id = id.trim();
    id.strip_prefix(ITEM_PREFIX).unwrap_or(id)
}

/// Lookup keys to try for `id`, in priority order, without duplicates.
pub fn lookup_keys(id: &str) -> Vec<String> {
    let mut keys = Vec::with_capacity(3);
    for key in [canonical(id), id.to_string(), stripped(id).to_string()] {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}
