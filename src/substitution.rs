//! Cross-tier substitution
//!
//! Owned stock of a higher-tier item can stand in for lower-tier items of the
//! same category. One unit of tier `t` counts as `2^(t - l)` units of tier `l`.
//! This works on flat requirement totals and knows nothing about recipe trees.

use std::collections::{BTreeMap, HashMap};

use crate::catalog::Catalog;
use crate::inventory::Inventory;
use crate::models::Reduction;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionResult {
    pub reductions: Vec<Reduction>,
    /// Requirements left after substitution; fully covered items are removed
    pub adjusted: BTreeMap<String, u64>,
}

/// Item IDs grouped by category, then tier
type TierGroups = BTreeMap<String, BTreeMap<i32, Vec<String>>>;

fn group(groups: &mut TierGroups, category: &str, tier: i32, item_id: &str) {
    let ids = groups
        .entry(category.to_string())
        .or_default()
        .entry(tier)
        .or_default();
    if let Err(position) = ids.binary_search_by(|id| id.as_str().cmp(item_id)) {
        ids.insert(position, item_id.to_string());
    }
}

fn substitution_ratio(higher_tier: i32, lower_tier: i32) -> u64 {
    let steps = higher_tier.abs_diff(lower_tier);
    1u64.checked_shl(steps).unwrap_or(u64::MAX)
}

/// Offset `required` quantities with owned surplus of higher-tier items.
///
/// Surplus is what is owned beyond the item's own requirement. Each unit of
/// surplus is spent at most once. Untiered items neither give nor receive.
pub fn resolve_substitutions(
    catalog: &Catalog,
    required: &BTreeMap<String, u64>,
    inventory: &Inventory,
) -> SubstitutionResult {
    let mut remaining: HashMap<&str, u64> = HashMap::new();
    let mut needed = TierGroups::new();
    for (id, quantity) in required {
        let Some(item) = catalog.get_item(id) else {
            continue;
        };
        if !item.is_tiered() || *quantity == 0 {
            continue;
        }
        remaining.insert(id.as_str(), *quantity);
        group(&mut needed, &item.category, item.tier, id);
    }

    let mut available: HashMap<String, u64> = HashMap::new();
    let mut owned = TierGroups::new();
    for (id, quantity) in inventory.canonical_entries() {
        let Some(item) = catalog.get_item(&id) else {
            continue;
        };
        if !item.is_tiered() {
            continue;
        }
        let own_requirement = required.get(&item.id).copied().unwrap_or(0);
        let surplus = quantity.saturating_sub(own_requirement);
        if surplus == 0 {
            continue;
        }
        *available.entry(item.id.clone()).or_default() += surplus;
        group(&mut owned, &item.category, item.tier, &item.id);
    }

    let mut reductions = Vec::new();
    for (category, needed_tiers) in &needed {
        let Some(owned_tiers) = owned.get(category) else {
            continue;
        };

        for (&higher_tier, sources) in owned_tiers.iter().rev() {
            for (&lower_tier, targets) in needed_tiers.iter().rev() {
                if lower_tier >= higher_tier {
                    continue;
                }
                let ratio = substitution_ratio(higher_tier, lower_tier);

                for target in targets {
                    for source in sources {
                        let Some(still_needed) = remaining.get_mut(target.as_str()) else {
                            break;
                        };
                        let Some(spare) = available.get_mut(source) else {
                            continue;
                        };
                        if *still_needed == 0 || *spare == 0 {
                            continue;
                        }

                        let reducible = spare.saturating_mul(ratio).min(*still_needed);
                        let source_quantity = reducible.div_ceil(ratio);
                        *still_needed -= reducible;
                        *spare = spare.saturating_sub(source_quantity);

                        tracing::debug!(
                            "{} x {} covers {} x {}",
                            source_quantity,
                            source,
                            reducible,
                            target
                        );
                        reductions.push(Reduction {
                            item_id: target.clone(),
                            reduced_quantity: reducible,
                            source_item_id: source.clone(),
                            source_quantity,
                        });
                    }
                }
            }
        }
    }

    let mut reduced_by: HashMap<&str, u64> = HashMap::new();
    for reduction in &reductions {
        *reduced_by.entry(reduction.item_id.as_str()).or_default() += reduction.reduced_quantity;
    }
    let adjusted = required
        .iter()
        .filter_map(|(id, quantity)| {
            let left = quantity.saturating_sub(reduced_by.get(id.as_str()).copied().unwrap_or(0));
            (left > 0).then(|| (id.clone(), left))
        })
        .collect();

    SubstitutionResult {
        reductions,
        adjusted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InventoryEntry;
    use crate::sample;

    fn required(entries: &[(&str, u64)]) -> BTreeMap<String, u64> {
        entries
            .iter()
            .map(|(id, quantity)| (id.to_string(), *quantity))
            .collect()
    }

    fn inventory(entries: &[(&str, u64)]) -> Inventory {
        let entries: Vec<_> = entries
            .iter()
            .map(|(id, quantity)| InventoryEntry {
                item_id: id.to_string(),
                quantity: *quantity,
            })
            .collect();
        Inventory::from_entries(&entries)
    }

    #[test]
    fn ratio_doubles_per_tier() {
        assert_eq!(substitution_ratio(2, 1), 2);
        assert_eq!(substitution_ratio(4, 1), 8);
        assert_eq!(substitution_ratio(10, 1), 512);
    }

    #[test]
    fn one_tier_up_covers_two_units() {
        let catalog = sample::catalog();
        let result = resolve_substitutions(
            &catalog,
            &required(&[("item_1001", 5)]),
            &inventory(&[("item_1002", 1)]),
        );

        assert_eq!(
            result.reductions,
            vec![Reduction {
                item_id: "item_1001".to_string(),
                reduced_quantity: 2,
                source_item_id: "item_1002".to_string(),
                source_quantity: 1,
            }]
        );
        assert_eq!(result.adjusted, required(&[("item_1001", 3)]));
    }

    #[test]
    fn fully_covered_items_are_removed() {
        let catalog = sample::catalog();
        let result = resolve_substitutions(
            &catalog,
            &required(&[("item_1001", 12), ("item_1002", 6)]),
            &inventory(&[("2010", 2)]),
        );

        // Peerless Clay (T4) covers 4 Simple Clay (T2) each; two are enough for all six
        assert_eq!(result.reductions.len(), 1);
        assert_eq!(result.reductions[0].item_id, "item_1002");
        assert_eq!(result.reductions[0].reduced_quantity, 6);
        assert_eq!(result.reductions[0].source_quantity, 2);
        assert_eq!(result.adjusted, required(&[("item_1001", 12)]));
    }

    #[test]
    fn leftover_surplus_flows_to_lower_tiers() {
        let catalog = sample::catalog();
        let result = resolve_substitutions(
            &catalog,
            &required(&[("item_1001", 12), ("item_1002", 2)]),
            &inventory(&[("item_2010", 2)]),
        );

        // first unit covers the 2 Simple Clay, second covers 8 Rough Clay
        assert_eq!(result.reductions.len(), 2);
        assert_eq!(result.reductions[1].item_id, "item_1001");
        assert_eq!(result.reductions[1].reduced_quantity, 8);
        assert_eq!(result.adjusted, required(&[("item_1001", 4)]));
    }

    #[test]
    fn only_surplus_beyond_own_requirement_is_used() {
        let catalog = sample::catalog();
        let result = resolve_substitutions(
            &catalog,
            &required(&[("item_1001", 10), ("item_1002", 3)]),
            &inventory(&[("item_1002", 4)]),
        );

        assert_eq!(result.adjusted, required(&[("item_1001", 8), ("item_1002", 3)]));
    }

    #[test]
    fn other_categories_and_untiered_items_are_ignored() {
        let catalog = sample::catalog();
        let result = resolve_substitutions(
            &catalog,
            &required(&[("item_3003", 6), ("item_3004", 2)]),
            &inventory(&[("item_2010", 50), ("item_3004", 100)]),
        );

        assert!(result.reductions.is_empty());
        assert_eq!(result.adjusted, required(&[("item_3003", 6), ("item_3004", 2)]));
    }
}
