//! Read-only item and recipe catalog
//!
//! The catalog is built once and then shared between calculations behind an
//! [`Arc`](std::sync::Arc). Nothing mutates it after construction.

use std::collections::HashMap;

use regex::RegexBuilder;
use rusqlite::Connection;

use crate::db;
use crate::error::{Error, Result};
use crate::ids;
use crate::models::{Item, Recipe};

#[derive(Debug, Default)]
pub struct Catalog {
    items: HashMap<String, Item>,
    /// Recipes keyed by the item they produce
    recipes: HashMap<String, Recipe>,
}

impl Catalog {
    /// Build a catalog from parsed definitions.
    ///
    /// When several recipes produce the same item, the last one wins.
    pub fn from_parts(items: Vec<Item>, recipes: Vec<Recipe>) -> Self {
        let items: HashMap<_, _> = items
            .into_iter()
            .map(|item| (item.id.clone(), item))
            .collect();

        let mut by_output = HashMap::with_capacity(recipes.len());
        for recipe in recipes {
            if let Some(previous) = by_output.insert(recipe.output_item_id.clone(), recipe) {
                tracing::warn!(
                    "Recipe {} for {} replaced by a later recipe",
                    previous.id,
                    previous.output_item_id
                );
            }
        }

        tracing::debug!(
            "Catalog built with {} items and {} recipes",
            items.len(),
            by_output.len()
        );

        Self {
            items,
            recipes: by_output,
        }
    }

    /// Load every item and recipe from the catalog database
    pub fn load(conn: &Connection) -> Result<Self> {
        let items = db::list_items(conn)?;
        let recipes = db::list_recipes(conn)?;
        tracing::info!("Loaded {} items and {} recipes", items.len(), recipes.len());
        Ok(Self::from_parts(items, recipes))
    }

    /// Look up an item, accepting bare numeric IDs
    pub fn get_item(&self, id: &str) -> Option<&Item> {
        self.items
            .get(id)
            .or_else(|| self.items.get(&ids::canonical(id)))
    }

    /// The recipe producing `id`, if any
    pub fn get_recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes
            .get(id)
            .or_else(|| self.recipes.get(&ids::canonical(id)))
    }

    /// All items, ordered by tier and then name
    pub fn all_items(&self) -> Vec<&Item> {
        let mut items: Vec<_> = self.items.values().collect();
        sort_for_display(&mut items);
        items
    }

    /// Items whose name or category contains `query`, ignoring case
    pub fn search_items(&self, query: &str) -> Result<Vec<&Item>> {
        let query = query.trim();
        let pattern = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidInput(format!("search query '{query}': {e}")))?;

        let mut items: Vec<_> = self
            .items
            .values()
            .filter(|item| pattern.is_match(&item.name) || pattern.is_match(&item.category))
            .collect();
        sort_for_display(&mut items);
        Ok(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }
}

fn sort_for_display(items: &mut [&Item]) {
    items.sort_by(|a, b| {
        a.tier
            .cmp(&b.tier)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.id.cmp(&b.id))
    });
}
