//! Inventory snapshots

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::ids;
use crate::models::InventoryEntry;

/// Owned quantities keyed by the IDs exactly as the caller supplied them
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    owned: HashMap<String, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a InventoryEntry>) -> Self {
        let mut owned: HashMap<String, u64> = HashMap::new();
        for entry in entries {
            let owned = owned.entry(entry.item_id.trim().to_string()).or_default();
            *owned = owned.saturating_add(entry.quantity);
        }
        Self { owned }
    }

    /// Read a JSON list of `{itemId, quantity}` entries
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let entries: Vec<InventoryEntry> = serde_json::from_str(&content)?;
        tracing::debug!("Loaded {} inventory entries from {}", entries.len(), path.display());
        Ok(Self::from_entries(&entries))
    }

    /// Owned quantity of `item_id`.
    ///
    /// Tries the canonical prefixed form, then the raw form, then the form with
    /// the prefix stripped. The first key present wins.
    pub fn quantity_of(&self, item_id: &str) -> u64 {
        ids::lookup_keys(item_id)
            .iter()
            .find_map(|key| self.owned.get(key).copied())
            .unwrap_or(0)
    }

    /// Entries keyed by canonical ID.
    ///
    /// Keys that normalize to the same item are not added together; each item
    /// reports what [`quantity_of`](Self::quantity_of) would.
    pub fn canonical_entries(&self) -> HashMap<String, u64> {
        self.owned
            .keys()
            .map(|id| ids::canonical(id))
            .collect::<HashSet<_>>()
            .into_iter()
            .map(|id| {
                let quantity = self.quantity_of(&id);
                (id, quantity)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.owned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owned.is_empty()
    }
}
