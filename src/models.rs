//! Data models for items, recipes and calculation results

use serde::{Deserialize, Serialize};

use crate::ids;

/// Tier value used by items that sit outside the tier progression.
pub const UNTIERED: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default = "untiered")]
    pub tier: i32,
    #[serde(default = "default_stack_size")]
    pub stack_size: u64,
}

fn untiered() -> i32 {
    UNTIERED
}

fn default_stack_size() -> u64 {
    1
}

impl Item {
    pub fn is_tiered(&self) -> bool {
        self.tier != UNTIERED
    }
}

/// One input line of a recipe, consumed once per batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeInput {
    pub item_id: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub output_item_id: String,
    /// Units produced by a single batch
    pub output_quantity: u64,
    pub inputs: Vec<RecipeInput>,
}

impl Recipe {
    /// Batches needed to produce `quantity` units.
    ///
    /// A zero output quantity is treated as one unit per batch.
    pub fn batches_for(&self, quantity: u64) -> u64 {
        quantity.div_ceil(self.output_quantity.max(1))
    }

    /// Per-batch quantity of `item_id`, summed over repeated input lines.
    ///
    /// Bare and `item_`-prefixed forms of the same ID match each other.
    pub fn input_quantity(&self, item_id: &str) -> u64 {
        let wanted = ids::canonical(item_id);
        self.inputs
            .iter()
            .filter(|input| input.item_id == item_id || ids::canonical(&input.item_id) == wanted)
            .fold(0, |total, input| total.saturating_add(input.quantity))
    }
}

/// An owned quantity of an item, as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub item_id: String,
    pub quantity: u64,
}

/// A single line of a multi-item project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    pub item_id: String,
    pub quantity: u64,
}

impl ProjectItem {
    pub fn new(item_id: impl Into<String>, quantity: u64) -> Self {
        Self {
            item_id: item_id.into(),
            quantity,
        }
    }
}

/// Per-item result of an inventory-aware calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeBreakdownItem {
    pub item_id: String,
    pub name: String,
    pub tier: i32,
    pub category: String,
    /// Demand accumulated over every path of the tree. Never touched by inventory.
    pub recipe_required: u64,
    pub actual_required: u64,
    pub deficit: u64,
    pub current_inventory: u64,
}

impl RecipeBreakdownItem {
    pub fn new(item: &Item, quantity: u64) -> Self {
        Self {
            item_id: item.id.clone(),
            name: item.name.clone(),
            tier: item.tier,
            category: item.category.clone(),
            recipe_required: quantity,
            actual_required: quantity,
            deficit: quantity,
            current_inventory: 0,
        }
    }

    pub(crate) fn set_remaining(&mut self, remaining: u64) {
        self.actual_required = remaining;
        self.deficit = remaining;
    }
}

/// One entry of a build order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftingStep {
    pub item_id: String,
    pub quantity: u64,
    pub tier: i32,
}

/// A lower-tier requirement offset by owned higher-tier stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reduction {
    pub item_id: String,
    pub reduced_quantity: u64,
    pub source_item_id: String,
    pub source_quantity: u64,
}
