//! Database schema and operations

use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Item, Recipe, RecipeInput};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Item definitions
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL DEFAULT '',
            tier INTEGER NOT NULL DEFAULT -1,
            stack_size INTEGER NOT NULL DEFAULT 1
        );

        -- One recipe per output item; a later import replaces the earlier row
        CREATE TABLE IF NOT EXISTS recipes (
            output_item_id TEXT PRIMARY KEY,
            id TEXT NOT NULL,
            output_quantity INTEGER NOT NULL
        );

        -- Inputs consumed per batch, kept in recipe order
        CREATE TABLE IF NOT EXISTS recipe_inputs (
            output_item_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            item_id TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            PRIMARY KEY (output_item_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_inputs_item ON recipe_inputs(item_id);
        "#,
    )?;
    Ok(())
}

/// Insert or replace an item
pub fn upsert_item(conn: &Connection, item: &Item) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO items (id, name, category, tier, stack_size)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &item.id,
            &item.name,
            &item.category,
            item.tier,
            item.stack_size as i64,
        ),
    )?;
    Ok(())
}

/// Insert a recipe, replacing any existing recipe for the same output.
///
/// Returns `true` when an earlier recipe was replaced.
pub fn upsert_recipe(conn: &Connection, recipe: &Recipe) -> Result<bool> {
    let tx = conn.unchecked_transaction()?;

    let replaced = tx.execute(
        "DELETE FROM recipes WHERE output_item_id = ?1",
        [&recipe.output_item_id],
    )? > 0;
    tx.execute(
        "DELETE FROM recipe_inputs WHERE output_item_id = ?1",
        [&recipe.output_item_id],
    )?;

    tx.execute(
        "INSERT INTO recipes (output_item_id, id, output_quantity) VALUES (?1, ?2, ?3)",
        (
            &recipe.output_item_id,
            &recipe.id,
            recipe.output_quantity as i64,
        ),
    )?;

    for (position, input) in recipe.inputs.iter().enumerate() {
        tx.execute(
            "INSERT INTO recipe_inputs (output_item_id, position, item_id, quantity)
             VALUES (?1, ?2, ?3, ?4)",
            (
                &recipe.output_item_id,
                position as i64,
                &input.item_id,
                input.quantity as i64,
            ),
        )?;
    }

    tx.commit()?;
    Ok(replaced)
}

/// Clear all imported data (for re-import)
pub fn clear_catalog(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        tier: row.get(3)?,
        stack_size: row.get::<_, i64>(4)?.max(0) as u64,
    })
}

/// List all items in the database
pub fn list_items(conn: &Connection) -> Result<Vec<Item>> {
    let mut stmt =
        conn.prepare("SELECT id, name, category, tier, stack_size FROM items ORDER BY rowid")?;

    let rows = stmt.query_map([], item_from_row)?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// Get a single item by ID
pub fn get_item(conn: &Connection, id: &str) -> Result<Option<Item>> {
    let item = conn
        .query_row(
            "SELECT id, name, category, tier, stack_size FROM items WHERE id = ?1",
            [id],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}

fn recipe_inputs(conn: &Connection, output_item_id: &str) -> Result<Vec<RecipeInput>> {
    let mut stmt = conn.prepare(
        "SELECT item_id, quantity
         FROM recipe_inputs
         WHERE output_item_id = ?1
         ORDER BY position",
    )?;

    let rows = stmt.query_map([output_item_id], |row| {
        Ok(RecipeInput {
            item_id: row.get(0)?,
            quantity: row.get::<_, i64>(1)?.max(0) as u64,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all recipes with their inputs
pub fn list_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut stmt =
        conn.prepare("SELECT id, output_item_id, output_quantity FROM recipes ORDER BY rowid")?;

    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, output_item_id, output_quantity) = row?;
        let inputs = recipe_inputs(conn, &output_item_id)?;
        results.push(Recipe {
            id,
            output_item_id,
            output_quantity: output_quantity.max(0) as u64,
            inputs,
        });
    }
    Ok(results)
}

/// Get the output items of all recipes that consume a given item
pub fn get_consumers(conn: &Connection, item_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT output_item_id FROM recipe_inputs WHERE item_id = ?1 ORDER BY output_item_id",
    )?;

    let rows = stmt.query_map([item_id], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn recipe(id: &str, output: &str, inputs: &[(&str, u64)]) -> Recipe {
        Recipe {
            id: id.to_string(),
            output_item_id: output.to_string(),
            output_quantity: 1,
            inputs: inputs
                .iter()
                .map(|(item_id, quantity)| RecipeInput {
                    item_id: item_id.to_string(),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    #[test]
    fn items_round_trip_through_store() {
        let conn = open();
        let item = Item {
            id: "item_1".to_string(),
            name: "Rough Plank".to_string(),
            category: "Plank".to_string(),
            tier: 1,
            stack_size: 100,
        };
        upsert_item(&conn, &item).unwrap();

        assert_eq!(get_item(&conn, "item_1").unwrap(), Some(item.clone()));
        assert_eq!(get_item(&conn, "item_2").unwrap(), None);
        assert_eq!(list_items(&conn).unwrap(), vec![item]);
    }

    #[test]
    fn later_recipe_replaces_earlier_for_same_output() {
        let conn = open();
        assert!(!upsert_recipe(&conn, &recipe("r1", "out", &[("a", 1), ("b", 2)])).unwrap());
        assert!(upsert_recipe(&conn, &recipe("r2", "out", &[("c", 3)])).unwrap());

        let recipes = list_recipes(&conn).unwrap();
        assert_eq!(recipes, vec![recipe("r2", "out", &[("c", 3)])]);
        assert!(get_consumers(&conn, "a").unwrap().is_empty());
    }

    #[test]
    fn inputs_keep_recipe_order() {
        let conn = open();
        upsert_recipe(&conn, &recipe("r1", "out", &[("z", 1), ("a", 2), ("m", 3)])).unwrap();

        let recipes = list_recipes(&conn).unwrap();
        let order: Vec<_> = recipes[0].inputs.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(order, vec!["z", "a", "m"]);
    }

    #[test]
    fn consumers_and_clear() {
        let conn = open();
        upsert_recipe(&conn, &recipe("r1", "plank", &[("log", 2)])).unwrap();
        upsert_recipe(&conn, &recipe("r2", "beam", &[("log", 4), ("plank", 1)])).unwrap();

        assert_eq!(get_consumers(&conn, "log").unwrap(), vec!["beam", "plank"]);

        clear_catalog(&conn).unwrap();
        assert!(list_recipes(&conn).unwrap().is_empty());
        assert!(list_items(&conn).unwrap().is_empty());
    }
}
