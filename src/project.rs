//! Multi-item project totals
//!
//! Expands every project line the same way as the single-item calculator, but
//! ignores inventory and only tallies how much of each item the project
//! touches.

use std::collections::{BTreeMap, HashSet};

use crate::catalog::Catalog;
use crate::models::{CraftingStep, ProjectItem, UNTIERED};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectRequirements {
    /// Items no recipe produces
    pub raw_materials: BTreeMap<String, u64>,
    /// Craftable items, project lines included
    pub intermediates: BTreeMap<String, u64>,
    /// Every appearance of every item
    pub total_items: BTreeMap<String, u64>,
}

impl ProjectRequirements {
    fn record(&mut self, item_id: &str, quantity: u64, craftable: bool) {
        let bucket = if craftable {
            &mut self.intermediates
        } else {
            &mut self.raw_materials
        };
        for tally in [bucket, &mut self.total_items] {
            let total = tally.entry(item_id.to_string()).or_default();
            *total = total.saturating_add(quantity);
        }
    }
}

pub fn calculate_requirements(catalog: &Catalog, project: &[ProjectItem]) -> ProjectRequirements {
    let mut requirements = ProjectRequirements::default();

    for line in project {
        let mut stack = HashSet::new();
        collect(catalog, &line.item_id, line.quantity, &mut stack, &mut requirements);
    }

    tracing::debug!(
        "Project of {} lines needs {} raw materials and {} intermediates",
        project.len(),
        requirements.raw_materials.len(),
        requirements.intermediates.len()
    );
    requirements
}

fn collect(
    catalog: &Catalog,
    item_id: &str,
    quantity: u64,
    stack: &mut HashSet<String>,
    requirements: &mut ProjectRequirements,
) {
    let Some(item) = catalog.get_item(item_id) else {
        tracing::debug!("Skipping unknown item {}", item_id);
        return;
    };
    if stack.contains(&item.id) {
        return;
    }

    let Some(recipe) = catalog.get_recipe(&item.id) else {
        requirements.record(&item.id, quantity, false);
        return;
    };
    requirements.record(&item.id, quantity, true);

    stack.insert(item.id.clone());
    let batches = recipe.batches_for(quantity);
    for input in &recipe.inputs {
        let required = input.quantity.saturating_mul(batches);
        collect(catalog, &input.item_id, required, stack, requirements);
    }
    stack.remove(&item.id);
}

/// Intermediates in build order, lowest tier first
pub fn get_crafting_steps(catalog: &Catalog, project: &[ProjectItem]) -> Vec<CraftingStep> {
    let requirements = calculate_requirements(catalog, project);

    let mut steps: Vec<_> = requirements
        .intermediates
        .into_iter()
        .map(|(item_id, quantity)| {
            let tier = catalog
                .get_item(&item_id)
                .map(|item| item.tier)
                .unwrap_or(UNTIERED);
            CraftingStep {
                item_id,
                quantity,
                tier,
            }
        })
        .collect();

    // intermediates are already in ID order, so equal tiers stay sorted by ID
    steps.sort_by_key(|step| step.tier);
    steps
}
