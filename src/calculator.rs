//! Recipe requirement calculator
//!
//! Works in two explicit passes over a [`RecipeTree`]:
//!
//! 1. [`build_tree`] expands a target into every item it needs, accumulating
//!    the total demand per item and recording which recipes feed which.
//! 2. [`apply_inventory`] subtracts owned stock and pushes the batches that no
//!    longer need crafting down onto each recipe's inputs.
//!
//! Pass 2 only touches the inventory-dependent fields, so one tree can be
//! evaluated against any number of inventories.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::catalog::Catalog;
use crate::ids;
use crate::inventory::Inventory;
use crate::models::{InventoryEntry, Item, RecipeBreakdownItem};

/// Requirement graph for a single target item
#[derive(Debug, Clone)]
pub struct RecipeTree {
    root: String,
    entries: HashMap<String, RecipeBreakdownItem>,
    /// Item IDs in first-visit order
    order: Vec<String>,
    /// Parent item → items its recipe consumes
    dependencies: HashMap<String, BTreeSet<String>>,
}

impl RecipeTree {
    fn new(root: String) -> Self {
        Self {
            root,
            entries: HashMap::new(),
            order: Vec::new(),
            dependencies: HashMap::new(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn get(&self, item_id: &str) -> Option<&RecipeBreakdownItem> {
        self.entries.get(item_id)
    }

    /// Entries in the order they were first reached
    pub fn entries(&self) -> impl Iterator<Item = &RecipeBreakdownItem> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    pub fn children(&self, item_id: &str) -> impl Iterator<Item = &str> {
        self.dependencies
            .get(item_id)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn accumulate(&mut self, item: &Item, quantity: u64) {
        match self.entries.get_mut(&item.id) {
            Some(entry) => {
                entry.recipe_required = entry.recipe_required.saturating_add(quantity);
                entry.set_remaining(entry.recipe_required);
            }
            None => {
                self.entries
                    .insert(item.id.clone(), RecipeBreakdownItem::new(item, quantity));
                self.order.push(item.id.clone());
            }
        }
    }

    fn link(&mut self, parent: &str, child: &str) {
        self.dependencies
            .entry(parent.to_string())
            .or_default()
            .insert(child.to_string());
    }

    /// Item IDs ordered so every item comes after all of its parents.
    ///
    /// Reverse post-order of a depth-first walk from the root. Anything the
    /// walk cannot reach is appended afterwards, each as its own root.
    fn parent_first_order(&self) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut order = Vec::with_capacity(self.entries.len());

        let roots = std::iter::once(&self.root).chain(self.order.iter());
        for root in roots {
            if visited.contains(root.as_str()) {
                continue;
            }
            let mut post_order = Vec::new();
            self.post_order(root, &mut visited, &mut post_order);
            post_order.reverse();
            order.extend(post_order);
        }

        order
    }

    fn post_order<'a>(
        &'a self,
        id: &'a str,
        visited: &mut HashSet<&'a str>,
        out: &mut Vec<String>,
    ) {
        if !visited.insert(id) {
            return;
        }
        for child in self.children(id) {
            self.post_order(child, visited, out);
        }
        out.push(id.to_string());
    }
}

/// Expand `target_item_id` into its full requirement tree (pass 1).
///
/// Items missing from the catalog end their branch without an entry. An item
/// already on the current expansion path is not expanded again, which keeps
/// cyclic recipes finite.
pub fn build_tree(catalog: &Catalog, target_item_id: &str, target_quantity: u64) -> RecipeTree {
    let root = catalog
        .get_item(target_item_id)
        .map(|item| item.id.clone())
        .unwrap_or_else(|| ids::canonical(target_item_id));

    let mut tree = RecipeTree::new(root.clone());
    let mut stack = HashSet::new();
    expand(catalog, &root, target_quantity, &mut stack, &mut tree);

    tracing::debug!("Expanded {} into {} items", root, tree.len());
    tree
}

fn expand(
    catalog: &Catalog,
    item_id: &str,
    quantity: u64,
    stack: &mut HashSet<String>,
    tree: &mut RecipeTree,
) {
    let Some(item) = catalog.get_item(item_id) else {
        tracing::debug!("Skipping unknown item {}", item_id);
        return;
    };

    if stack.contains(&item.id) {
        tracing::trace!("Recipe cycle through {}, not expanding again", item.id);
        return;
    }

    tree.accumulate(item, quantity);

    let Some(recipe) = catalog.get_recipe(&item.id) else {
        return;
    };

    stack.insert(item.id.clone());
    let batches = recipe.batches_for(quantity);
    for input in &recipe.inputs {
        // Edges point at the catalog's own ID so pass 2 finds the entry
        let child = catalog
            .get_item(&input.item_id)
            .map_or(input.item_id.as_str(), |child| child.id.as_str());
        tree.link(&item.id, child);
        expand(catalog, child, input.quantity.saturating_mul(batches), stack, tree);
    }
    stack.remove(&item.id);
}

/// Reduce the tree's requirements by `inventory` (pass 2).
///
/// Items are processed parents first. Stock of a craftable item removes whole
/// batches, and each skipped batch removes its inputs from the children's
/// demand. Reductions from several parents onto one child add up.
pub fn apply_inventory(tree: &mut RecipeTree, catalog: &Catalog, inventory: &Inventory) {
    let order = tree.parent_first_order();
    let mut parent_reductions: HashMap<String, u64> = HashMap::new();

    for id in &order {
        let Some(entry) = tree.entries.get_mut(id) else {
            continue;
        };

        entry.current_inventory = inventory.quantity_of(id);
        let reduction = parent_reductions.get(id).copied().unwrap_or(0);
        let remaining = remaining_required(entry, reduction);
        entry.set_remaining(remaining);
        let required = entry.recipe_required;

        let Some(recipe) = catalog.get_recipe(id) else {
            continue;
        };

        let original_batches = recipe.batches_for(required);
        let remaining_batches = recipe.batches_for(remaining);
        let batches_skipped = original_batches.saturating_sub(remaining_batches);
        if batches_skipped == 0 {
            continue;
        }

        tracing::trace!("{} skips {} of {} batches", id, batches_skipped, original_batches);
        if let Some(children) = tree.dependencies.get(id) {
            for child in children {
                let reduction = parent_reductions.entry(child.clone()).or_default();
                *reduction = reduction
                    .saturating_add(recipe.input_quantity(child).saturating_mul(batches_skipped));
            }
        }
    }

    // Recompute with the finished reductions so shared children are consistent
    for entry in tree.entries.values_mut() {
        entry.current_inventory = inventory.quantity_of(&entry.item_id);
        let reduction = parent_reductions.get(&entry.item_id).copied().unwrap_or(0);
        let remaining = remaining_required(entry, reduction);
        entry.set_remaining(remaining);
    }
}

fn remaining_required(entry: &RecipeBreakdownItem, parent_reduction: u64) -> u64 {
    let inventory_used = entry.recipe_required.min(entry.current_inventory);
    entry
        .recipe_required
        .saturating_sub(inventory_used)
        .saturating_sub(parent_reduction)
}

/// Result of an inventory-aware calculation
#[derive(Debug, Clone)]
pub struct InventoryCalculation {
    pub target_item_id: String,
    pub target_quantity: u64,
    /// Every item in the tree, highest tier first
    pub breakdown: Vec<RecipeBreakdownItem>,
    /// Items still missing, with their deficit
    pub total_deficit: BTreeMap<String, u64>,
}

impl InventoryCalculation {
    pub fn from_tree(tree: &RecipeTree, target_quantity: u64) -> Self {
        let mut breakdown: Vec<_> = tree.entries().cloned().collect();
        breakdown.sort_by_key(|entry| Reverse(entry.tier));

        let total_deficit = breakdown
            .iter()
            .filter(|entry| entry.deficit > 0)
            .map(|entry| (entry.item_id.clone(), entry.deficit))
            .collect();

        Self {
            target_item_id: tree.root().to_string(),
            target_quantity,
            breakdown,
            total_deficit,
        }
    }
}

/// Calculate what is still needed to craft `target_quantity` of an item
/// given the owned `inventory`
pub fn calculate_with_inventory(
    catalog: &Catalog,
    target_item_id: &str,
    target_quantity: u64,
    inventory: &[InventoryEntry],
) -> InventoryCalculation {
    let mut tree = build_tree(catalog, target_item_id, target_quantity);
    apply_inventory(&mut tree, catalog, &Inventory::from_entries(inventory));
    InventoryCalculation::from_tree(&tree, target_quantity)
}

/// Format a requirement tree as an indented outline
pub fn format_tree(tree: &RecipeTree, catalog: &Catalog) -> String {
    let mut output = String::new();
    let mut path = HashSet::new();
    format_node(tree, catalog, tree.root(), 0, &mut path, &mut output);
    output
}

fn format_node<'a>(
    tree: &'a RecipeTree,
    catalog: &Catalog,
    id: &'a str,
    indent: usize,
    path: &mut HashSet<&'a str>,
    output: &mut String,
) {
    let Some(entry) = tree.get(id) else {
        return;
    };
    let prefix = "  ".repeat(indent);

    let status = if entry.deficit == 0 {
        "covered".to_string()
    } else {
        format!("need {}", entry.deficit)
    };
    let kind = if catalog.get_recipe(id).is_some() {
        ""
    } else {
        " (raw)"
    };
    output.push_str(&format!(
        "{}{}x {}{} [T{}] have {}, {}\n",
        prefix, entry.recipe_required, entry.name, kind, entry.tier, entry.current_inventory, status
    ));

    if !path.insert(id) {
        output.push_str(&format!("{}  ... (cycle)\n", prefix));
        return;
    }
    for child in tree.children(id) {
        format_node(tree, catalog, child, indent + 1, path, output);
    }
    path.remove(id);
}

impl std::fmt::Display for InventoryCalculation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Requirement Summary ===")?;
        writeln!(f, "Target: {}x {}", self.target_quantity, self.target_item_id)?;
        writeln!(f)?;

        writeln!(
            f,
            "{:<5} {:<32} {:>10} {:>10} {:>10}",
            "Tier", "Item", "Required", "Owned", "Deficit"
        )?;
        writeln!(f, "{}", "-".repeat(71))?;
        for entry in &self.breakdown {
            writeln!(
                f,
                "{:<5} {:<32} {:>10} {:>10} {:>10}",
                entry.tier,
                entry.name,
                entry.recipe_required,
                entry.current_inventory,
                entry.deficit
            )?;
        }
        writeln!(f)?;

        if self.total_deficit.is_empty() {
            writeln!(f, "Nothing missing.")?;
        } else {
            writeln!(f, "Still needed:")?;
            for (id, deficit) in &self.total_deficit {
                writeln!(f, "  {} x {}", deficit, id)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    fn owned(entries: &[(&str, u64)]) -> Vec<InventoryEntry> {
        entries
            .iter()
            .map(|(id, quantity)| InventoryEntry {
                item_id: id.to_string(),
                quantity: *quantity,
            })
            .collect()
    }

    fn deficit(result: &InventoryCalculation, id: &str) -> u64 {
        result
            .breakdown
            .iter()
            .find(|entry| entry.item_id == id)
            .map(|entry| entry.deficit)
            .unwrap_or_else(|| panic!("{id} missing from breakdown"))
    }

    /// R needs 3×A + 1×B per batch and yields 2
    fn single_recipe() -> Catalog {
        sample::synthetic(
            &[("R", 2), ("A", 1), ("B", 1)],
            &[("R", 2, vec![("A", 3), ("B", 1)])],
        )
    }

    #[test]
    fn raw_target_has_single_entry() {
        let catalog = single_recipe();
        let result = calculate_with_inventory(&catalog, "A", 7, &[]);

        assert_eq!(result.breakdown.len(), 1);
        let entry = &result.breakdown[0];
        assert_eq!(entry.recipe_required, 7);
        assert_eq!(entry.deficit, 7);
        assert_eq!(entry.actual_required, 7);
    }

    #[test]
    fn expansion_rounds_up_to_whole_batches() {
        let catalog = single_recipe();
        let tree = build_tree(&catalog, "R", 3);

        assert_eq!(tree.get("R").map(|e| e.recipe_required), Some(3));
        assert_eq!(tree.get("A").map(|e| e.recipe_required), Some(6));
        assert_eq!(tree.get("B").map(|e| e.recipe_required), Some(2));
        assert_eq!(tree.children("R").collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(tree.children("A").count(), 0);
    }

    #[test]
    fn demand_accumulates_across_paths() {
        // Top needs L and M; both need Base
        let catalog = sample::synthetic(
            &[("Top", 3), ("L", 2), ("M", 2), ("Base", 1)],
            &[
                ("Top", 1, vec![("L", 1), ("M", 2)]),
                ("L", 1, vec![("Base", 2)]),
                ("M", 1, vec![("Base", 5)]),
            ],
        );
        let tree = build_tree(&catalog, "Top", 1);
        assert_eq!(tree.get("Base").map(|e| e.recipe_required), Some(2 + 10));
    }

    #[test]
    fn recipe_required_ignores_inventory() {
        let catalog = sample::catalog();
        let without = calculate_with_inventory(&catalog, "item_4101", 3, &[]);
        let with = calculate_with_inventory(
            &catalog,
            "item_4101",
            3,
            &owned(&[("item_2010", 4), ("item_3002", 1), ("1001", 50)]),
        );

        let required = |r: &InventoryCalculation| -> Vec<(String, u64)> {
            r.breakdown
                .iter()
                .map(|e| (e.item_id.clone(), e.recipe_required))
                .collect()
        };
        assert_eq!(required(&without), required(&with));
        assert_ne!(without.total_deficit, with.total_deficit);
    }

    #[test]
    fn reapplying_inventory_is_idempotent() {
        let catalog = sample::catalog();
        let inventory =
            Inventory::from_entries(&owned(&[("item_1344950671", 1), ("item_3003", 2)]));
        let mut tree = build_tree(&catalog, "item_4101", 2);

        apply_inventory(&mut tree, &catalog, &inventory);
        let first: Vec<_> = tree.entries().cloned().collect();
        apply_inventory(&mut tree, &catalog, &inventory);
        let second: Vec<_> = tree.entries().cloned().collect();

        assert_eq!(first, second);
    }

    #[test]
    fn tree_can_be_reevaluated_against_other_inventory() {
        let catalog = single_recipe();
        let mut tree = build_tree(&catalog, "R", 2);

        apply_inventory(&mut tree, &catalog, &Inventory::from_entries(&owned(&[("R", 2)])));
        assert_eq!(tree.get("A").map(|e| e.deficit), Some(0));

        apply_inventory(&mut tree, &catalog, &Inventory::new());
        assert_eq!(tree.get("A").map(|e| e.deficit), Some(3));
        assert_eq!(tree.get("R").map(|e| e.current_inventory), Some(0));
    }

    #[test]
    fn two_item_cycle_terminates() {
        let catalog = sample::synthetic(
            &[("A", 1), ("B", 1)],
            &[("A", 1, vec![("B", 1)]), ("B", 1, vec![("A", 1)])],
        );
        let result = calculate_with_inventory(&catalog, "A", 1, &[]);

        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(deficit(&result, "A"), 1);
        assert_eq!(deficit(&result, "B"), 1);
    }

    #[test]
    fn cycle_with_inventory_terminates() {
        let catalog = sample::synthetic(
            &[("A", 2), ("B", 1), ("C", 1)],
            &[("A", 1, vec![("B", 2)]), ("B", 1, vec![("A", 1), ("C", 1)])],
        );
        let result = calculate_with_inventory(&catalog, "A", 1, &owned(&[("A", 1)]));

        assert_eq!(deficit(&result, "A"), 0);
        assert_eq!(deficit(&result, "B"), 0);
        assert_eq!(deficit(&result, "C"), 0);
    }

    #[test]
    fn owning_the_intermediate_covers_its_inputs() {
        let catalog = single_recipe();
        let result = calculate_with_inventory(&catalog, "R", 2, &owned(&[("R", 2)]));

        assert_eq!(deficit(&result, "R"), 0);
        assert_eq!(deficit(&result, "A"), 0);
        assert_eq!(deficit(&result, "B"), 0);
        assert!(result.total_deficit.is_empty());
    }

    #[test]
    fn surplus_stock_does_not_go_negative() {
        let catalog = single_recipe();
        let result = calculate_with_inventory(&catalog, "R", 2, &owned(&[("R", 10), ("A", 10)]));

        assert_eq!(deficit(&result, "R"), 0);
        assert_eq!(deficit(&result, "A"), 0);
        let stock_a = result
            .breakdown
            .iter()
            .find(|e| e.item_id == "A")
            .map(|e| e.current_inventory);
        assert_eq!(stock_a, Some(10));
    }

    #[test]
    fn partial_stock_skips_whole_batches_only() {
        let catalog = single_recipe();

        // 4 R = 2 batches; owning 2 R skips one batch
        let result = calculate_with_inventory(&catalog, "R", 4, &owned(&[("R", 2)]));
        assert_eq!(deficit(&result, "R"), 2);
        assert_eq!(deficit(&result, "A"), 3);
        assert_eq!(deficit(&result, "B"), 1);

        // owning half a batch still leaves 2 batches to craft
        let result = calculate_with_inventory(&catalog, "R", 4, &owned(&[("R", 1)]));
        assert_eq!(deficit(&result, "R"), 3);
        assert_eq!(deficit(&result, "A"), 6);
        assert_eq!(deficit(&result, "B"), 2);
    }

    #[test]
    fn shared_child_reductions_are_summed() {
        // Top needs P and Q; both consume C
        let catalog = sample::synthetic(
            &[("Top", 3), ("P", 2), ("Q", 2), ("C", 1)],
            &[
                ("Top", 1, vec![("P", 2), ("Q", 2)]),
                ("P", 1, vec![("C", 2)]),
                ("Q", 1, vec![("C", 3)]),
            ],
        );

        let result = calculate_with_inventory(&catalog, "Top", 1, &[]);
        assert_eq!(deficit(&result, "C"), 4 + 6);

        let result = calculate_with_inventory(&catalog, "Top", 1, &owned(&[("P", 1), ("Q", 1)]));
        assert_eq!(deficit(&result, "P"), 1);
        assert_eq!(deficit(&result, "Q"), 1);
        assert_eq!(deficit(&result, "C"), 10 - 2 - 3);

        let result = calculate_with_inventory(&catalog, "Top", 1, &owned(&[("P", 2), ("Q", 2)]));
        assert_eq!(deficit(&result, "C"), 0);
    }

    #[test]
    fn owned_bricks_cover_the_whole_brick_line() {
        let catalog = sample::catalog();
        let result = calculate_with_inventory(
            &catalog,
            "item_4101",
            1,
            &owned(&[("item_1344950671", 2)]),
        );

        let tree = build_tree(&catalog, "item_4101", 1);
        let mut below_brick = Vec::new();
        let mut pending = vec!["item_1344950671"];
        while let Some(id) = pending.pop() {
            for child in tree.children(id) {
                below_brick.push(child.to_string());
                pending.push(child);
            }
        }
        assert_eq!(below_brick.len(), 4);

        assert_eq!(deficit(&result, "item_1344950671"), 0);
        for id in &below_brick {
            assert_eq!(deficit(&result, id), 0, "{id} should be covered");
        }

        // the wire line is untouched
        assert_eq!(deficit(&result, "item_3001"), 1);
        assert_eq!(deficit(&result, "item_3003"), 6);
        assert_eq!(result.total_deficit.get("item_4101"), Some(&1));
    }

    #[test]
    fn bare_ids_resolve_for_target_and_inventory() {
        let catalog = sample::catalog();
        let result = calculate_with_inventory(&catalog, "4101", 1, &owned(&[("1344950671", 2)]));

        assert_eq!(result.target_item_id, "item_4101");
        assert_eq!(deficit(&result, "item_2010"), 0);
        let brick = result
            .breakdown
            .iter()
            .find(|e| e.item_id == "item_1344950671")
            .unwrap();
        assert_eq!(brick.current_inventory, 2);
    }

    #[test]
    fn unknown_items_are_skipped() {
        let catalog = sample::synthetic(
            &[("R", 1), ("A", 1)],
            &[("R", 1, vec![("A", 1), ("Ghost", 4)])],
        );

        let result = calculate_with_inventory(&catalog, "R", 1, &[]);
        assert_eq!(result.breakdown.len(), 2);
        assert!(!result.total_deficit.contains_key("Ghost"));

        let result = calculate_with_inventory(&catalog, "Ghost", 1, &[]);
        assert!(result.breakdown.is_empty());
        assert!(result.total_deficit.is_empty());
    }

    #[test]
    fn bare_recipe_inputs_still_receive_reductions() {
        let catalog = sample::synthetic(
            &[("item_1", 2), ("item_2", 1)],
            &[("item_1", 1, vec![("2", 3)])],
        );
        let tree = build_tree(&catalog, "item_1", 1);
        assert_eq!(tree.children("item_1").collect::<Vec<_>>(), vec!["item_2"]);
        assert!(tree.get("2").is_none());

        let result = calculate_with_inventory(&catalog, "item_1", 1, &owned(&[("item_1", 1)]));
        assert_eq!(deficit(&result, "item_1"), 0);
        assert_eq!(deficit(&result, "item_2"), 0);
        assert!(result.total_deficit.is_empty());
    }

    #[test]
    fn huge_quantities_saturate_instead_of_overflowing() {
        let catalog = sample::catalog();
        let quantity = u64::MAX / 2;

        let result = calculate_with_inventory(&catalog, "item_4101", quantity, &[]);
        assert_eq!(deficit(&result, "item_4101"), quantity);
        assert_eq!(deficit(&result, "item_1001"), u64::MAX);

        let stocked = owned(&[("item_4101", u64::MAX)]);
        let result = calculate_with_inventory(&catalog, "item_4101", quantity, &stocked);
        assert!(result.total_deficit.is_empty());
    }

    #[test]
    fn breakdown_sorted_by_descending_tier() {
        let catalog = sample::catalog();
        let result = calculate_with_inventory(&catalog, "item_4101", 1, &[]);

        let tiers: Vec<_> = result.breakdown.iter().map(|e| e.tier).collect();
        let mut sorted = tiers.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(tiers, sorted);
        assert!(result.breakdown.iter().all(|e| e.actual_required == e.deficit));
    }

    #[test]
    fn tree_outline_lists_every_item() {
        let catalog = sample::catalog();
        let mut tree = build_tree(&catalog, "item_4101", 1);
        apply_inventory(&mut tree, &catalog, &Inventory::new());

        let outline = format_tree(&tree, &catalog);
        assert!(outline.starts_with("1x Heated Capacitor"));
        assert!(outline.contains("12x Rough Clay (raw)"));
        assert!(outline.contains("    6x Simple Clay"));
    }
}
