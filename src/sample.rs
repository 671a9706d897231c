//! Built-in sample catalog for trying the calculator without exported game data

use rusqlite::Connection;

use crate::catalog::Catalog;
use crate::db;
use crate::error::Result;
use crate::models::{Item, Recipe, RecipeInput, UNTIERED};

fn item(id: &str, name: &str, category: &str, tier: i32, stack_size: u64) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        tier,
        stack_size,
    }
}

fn recipe(id: &str, output: &str, output_quantity: u64, inputs: &[(&str, u64)]) -> Recipe {
    Recipe {
        id: id.to_string(),
        output_item_id: output.to_string(),
        output_quantity,
        inputs: inputs
            .iter()
            .map(|(item_id, quantity)| RecipeInput {
                item_id: item_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
    }
}

pub fn items() -> Vec<Item> {
    vec![
        item("item_4101", "Heated Capacitor", "Capacitor", 4, 20),
        // Brick line
        item("item_1344950671", "Refined Peerless Brick", "Brick", 4, 100),
        item("item_2010", "Peerless Clay", "Clay", 4, 100),
        item("item_2020", "Peerless Sand", "Sand", 4, 100),
        item("item_1002", "Simple Clay", "Clay", 2, 100),
        item("item_1001", "Rough Clay", "Clay", 1, 100),
        // Wire line
        item("item_3001", "Exquisite Wire", "Wire", 4, 50),
        item("item_3002", "Copper Ingot", "Metal", 2, 100),
        item("item_3003", "Copper Ore", "Ore", 1, 100),
        item("item_3004", "Charcoal", "Fuel", UNTIERED, 200),
    ]
}

pub fn recipes() -> Vec<Recipe> {
    vec![
        recipe(
            "recipe_4101",
            "item_4101",
            1,
            &[("item_1344950671", 2), ("item_3001", 1)],
        ),
        recipe(
            "recipe_1344950671",
            "item_1344950671",
            2,
            &[("item_2010", 3), ("item_2020", 1)],
        ),
        recipe("recipe_2010", "item_2010", 1, &[("item_1002", 2)]),
        recipe("recipe_1002", "item_1002", 1, &[("item_1001", 2)]),
        recipe("recipe_3001", "item_3001", 5, &[("item_3002", 2)]),
        recipe(
            "recipe_3002",
            "item_3002",
            1,
            &[("item_3003", 3), ("item_3004", 1)],
        ),
    ]
}

pub fn catalog() -> Catalog {
    Catalog::from_parts(items(), recipes())
}

/// Replace the contents of the catalog database with the sample data
pub fn store(conn: &Connection) -> Result<()> {
    db::clear_catalog(conn)?;
    for item in items() {
        db::upsert_item(conn, &item)?;
    }
    for recipe in recipes() {
        db::upsert_recipe(conn, &recipe)?;
    }
    tracing::info!("Loaded {} sample items", items().len());
    Ok(())
}

/// Catalog built from terse `(id, tier)` items and `(output, output_quantity, inputs)` recipes
#[cfg(test)]
pub fn synthetic(items: &[(&str, i32)], recipes: &[(&str, u64, Vec<(&str, u64)>)]) -> Catalog {
    let items = items
        .iter()
        .map(|(id, tier)| item(id, id, "Test", *tier, 100))
        .collect();
    let recipes = recipes
        .iter()
        .map(|(output, output_quantity, inputs)| {
            recipe(&format!("recipe_{output}"), output, *output_quantity, inputs)
        })
        .collect();
    Catalog::from_parts(items, recipes)
}
