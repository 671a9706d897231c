//! Crafting requirement planner
//!
//! Expands recipes into full material trees, subtracts owned inventory and
//! totals what a project still needs.

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod error;
pub mod extract;
pub mod ids;
pub mod inventory;
pub mod models;
pub mod project;
pub mod sample;
pub mod substitution;

pub use calculator::{
    InventoryCalculation, RecipeTree, apply_inventory, build_tree, calculate_with_inventory,
};
pub use catalog::Catalog;
pub use error::{Error, Result};
pub use inventory::Inventory;
pub use project::{ProjectRequirements, calculate_requirements, get_crafting_steps};
pub use substitution::{SubstitutionResult, resolve_substitutions};
