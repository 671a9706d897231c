//! Game data import
//!
//! Reads item and recipe definitions from JSON files exported by an external
//! game-data parser and stores them in the catalog database.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::db;
use crate::error::Result;
use crate::ids;
use crate::models::{Item, Recipe};

/// Contents of a single game-data file
#[derive(Debug, Default, Deserialize)]
struct GameData {
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default)]
    recipes: Vec<Recipe>,
}

impl GameData {
    fn is_empty(&self) -> bool {
        self.items.is_empty() && self.recipes.is_empty()
    }

    /// Rewrite every item reference into canonical form
    fn normalize_ids(&mut self) {
        for item in &mut self.items {
            item.id = ids::canonical(&item.id);
        }
        for recipe in &mut self.recipes {
            recipe.output_item_id = ids::canonical(&recipe.output_item_id);
            for input in &mut recipe.inputs {
                input.item_id = ids::canonical(&input.item_id);
            }
        }
    }
}

/// Find all *.json files below `data_dir`, in path order
pub fn find_data_files(data_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();

    // Later files replace earlier recipes, so the order must be stable
    files.sort();
    files
}

/// Parse a single game-data file.
///
/// Returns `None` for JSON files that carry no items or recipes.
fn parse_data_file(path: &Path) -> Result<Option<GameData>> {
    let content = fs::read_to_string(path)?;
    let mut data: GameData = serde_json::from_str(&content)?;
    if data.is_empty() {
        return Ok(None);
    }
    data.normalize_ids();
    Ok(Some(data))
}

/// Import all game data below `data_dir` into the database
pub fn import_to_database(conn: &Connection, data_dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    tracing::info!("Scanning {} for game data...", data_dir.display());
    let files = find_data_files(data_dir);
    tracing::info!("Found {} JSON files", files.len());

    for path in &files {
        match parse_data_file(path) {
            Ok(Some(data)) => {
                for item in &data.items {
                    db::upsert_item(conn, item)?;
                }

                for recipe in &data.recipes {
                    if db::upsert_recipe(conn, recipe)? {
                        tracing::warn!(
                            "Recipe {} replaces an earlier recipe for {}",
                            recipe.id,
                            recipe.output_item_id
                        );
                        stats.replaced_recipes += 1;
                    }
                }

                stats.files += 1;
                stats.items += data.items.len();
                stats.recipes += data.recipes.len();

                tracing::info!(
                    "  Parsed: {} (items: {}, recipes: {})",
                    path.display(),
                    data.items.len(),
                    data.recipes.len()
                );
            }
            Ok(None) => {
                stats.skipped += 1;
            }
            Err(e) => {
                tracing::error!("  Error parsing {}: {}", path.display(), e);
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub files: usize,
    pub items: usize,
    pub recipes: usize,
    pub replaced_recipes: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} files ({} items, {} recipes, {} recipes replaced). Skipped: {}, Errors: {}",
            self.files, self.items, self.recipes, self.replaced_recipes, self.skipped, self.errors
        )
    }
}
