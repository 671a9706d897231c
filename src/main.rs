//! Crafting requirement planner
//!
//! Looks up items, expands recipes and reports what is still missing.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use rusqlite::Connection;

use craft_planner::models::ProjectItem;
use craft_planner::{
    Catalog, Inventory, apply_inventory, build_tree, calculator, db, extract, resolve_substitutions,
    sample,
};

#[derive(Parser)]
#[command(name = "craft-planner")]
#[command(about = "Recipe requirement calculator for crafting game projects")]
struct Cli {
    /// Path to the SQLite catalog database
    #[arg(short, long, default_value = "craft_data.db", global = true)]
    database: PathBuf,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import item and recipe definitions from exported JSON game data
    Import {
        /// Directory containing *.json game data files
        data_dir: PathBuf,

        /// Clear existing data before import
        #[arg(long)]
        clear: bool,
    },

    /// Load sample data for testing (without exported game data)
    LoadSample,

    /// List all items in the catalog
    ListItems,

    /// Search items by name or category
    Search {
        /// Case-insensitive text to look for
        query: String,
    },

    /// Show details for a specific item
    Item {
        /// Item ID (e.g., "item_4101" or "4101")
        id: String,
    },

    /// Calculate what is still needed to craft an item
    Calc {
        /// Item ID to craft
        item: String,

        /// Number of items to craft
        #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
        quantity: u64,

        /// JSON file with owned items: [{"itemId": ..., "quantity": ...}]
        #[arg(short, long)]
        inventory: Option<PathBuf>,

        /// Show the full requirement tree
        #[arg(long)]
        tree: bool,
    },

    /// Total the materials for a multi-item project
    Project {
        /// Project lines as ITEM:QUANTITY
        #[arg(value_parser = parse_project_line)]
        items: Vec<ProjectItem>,

        /// JSON file with project lines: [{"itemId": ..., "quantity": ...}]
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// JSON file with owned items, used for tier substitution
        #[arg(short, long)]
        inventory: Option<PathBuf>,
    },
}

/// Parse `ITEM:QUANTITY` into a project line
fn parse_project_line(s: &str) -> Result<ProjectItem, String> {
    let (id, quantity) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected ITEM:QUANTITY, got '{s}'"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing item ID in '{s}'"));
    }
    let quantity: u64 = quantity
        .trim()
        .parse()
        .map_err(|e| format!("invalid quantity in '{s}': {e}"))?;
    if quantity == 0 {
        return Err(format!("quantity must be positive in '{s}'"));
    }
    Ok(ProjectItem::new(id, quantity))
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_names(false)
        .with_line_number(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn load_catalog(conn: &Connection) -> Result<Arc<Catalog>> {
    let catalog = Catalog::load(conn).context("Failed to load catalog")?;
    if catalog.is_empty() {
        bail!("No items in database. Run 'import' or 'load-sample' first.");
    }
    Ok(Arc::new(catalog))
}

fn load_inventory(path: Option<&Path>) -> Result<Inventory> {
    match path {
        Some(path) => Inventory::load(path)
            .with_context(|| format!("Failed to read inventory {}", path.display())),
        None => Ok(Inventory::new()),
    }
}

fn load_project(items: Vec<ProjectItem>, file: Option<&Path>) -> Result<Vec<ProjectItem>> {
    let mut project = items;
    if let Some(path) = file {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read project {}", path.display()))?;
        let lines: Vec<ProjectItem> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse project {}", path.display()))?;
        if let Some(line) = lines.iter().find(|line| line.quantity == 0) {
            bail!("Project line for {} has zero quantity", line.item_id);
        }
        project.extend(lines);
    }
    if project.is_empty() {
        bail!("Project is empty. Pass ITEM:QUANTITY lines or --file.");
    }
    Ok(project)
}

fn item_label(catalog: &Catalog, id: &str) -> String {
    match catalog.get_item(id) {
        Some(item) => format!("{} ({})", item.name, item.id),
        None => id.to_string(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Import { data_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = extract::import_to_database(&conn, &data_dir)
                .with_context(|| format!("Failed to import {}", data_dir.display()))?;
            println!("{}", stats);
        }

        Commands::LoadSample => {
            sample::store(&conn)?;
            println!("Sample data loaded successfully!");
        }

        Commands::ListItems => {
            let catalog = load_catalog(&conn)?;
            println!("{:<5} {:<16} {:<32} {}", "Tier", "Category", "Item", "ID");
            println!("{}", "-".repeat(72));
            for item in catalog.all_items() {
                println!(
                    "{:<5} {:<16} {:<32} {}",
                    item.tier, item.category, item.name, item.id
                );
            }
        }

        Commands::Search { query } => {
            let catalog = load_catalog(&conn)?;
            let items = catalog.search_items(&query)?;
            if items.is_empty() {
                println!("No items match '{}'", query);
            } else {
                for item in items {
                    println!("  [T{}] {} ({}, {})", item.tier, item.name, item.category, item.id);
                }
            }
        }

        Commands::Item { id } => {
            let catalog = load_catalog(&conn)?;
            let Some(item) = catalog.get_item(&id) else {
                println!("Item '{}' not found", id);
                return Ok(());
            };

            println!("Item: {}", item.name);
            println!("  ID: {}", item.id);
            println!("  Category: {}", item.category);
            println!("  Tier: {}", item.tier);
            println!("  Stack size: {}", item.stack_size);

            if let Some(recipe) = catalog.get_recipe(&item.id) {
                println!("  Recipe {} (makes {}):", recipe.id, recipe.output_quantity);
                for input in &recipe.inputs {
                    println!("    {} x {}", input.quantity, item_label(&catalog, &input.item_id));
                }
            } else {
                println!("  Raw material (no recipe)");
            }

            let consumers = db::get_consumers(&conn, &item.id)?;
            if !consumers.is_empty() {
                println!("  Used in:");
                for output in consumers {
                    println!("    {}", item_label(&catalog, &output));
                }
            }
        }

        Commands::Calc {
            item,
            quantity,
            inventory,
            tree,
        } => {
            let catalog = load_catalog(&conn)?;
            if catalog.get_item(&item).is_none() {
                bail!("Item '{}' not found", item);
            }
            let inventory = load_inventory(inventory.as_deref())?;

            let mut recipe_tree = build_tree(&catalog, &item, quantity);
            apply_inventory(&mut recipe_tree, &catalog, &inventory);

            if tree {
                println!("Requirement tree:\n");
                println!("{}", calculator::format_tree(&recipe_tree, &catalog));
            }

            let result = calculator::InventoryCalculation::from_tree(&recipe_tree, quantity);
            println!("{}", result);
        }

        Commands::Project {
            items,
            file,
            inventory,
        } => {
            let catalog = load_catalog(&conn)?;
            let project = load_project(items, file.as_deref())?;

            let requirements = craft_planner::calculate_requirements(&catalog, &project);
            let steps = craft_planner::get_crafting_steps(&catalog, &project);

            println!("=== Project Summary ===");
            println!();
            println!("Raw materials:");
            for (id, quantity) in &requirements.raw_materials {
                println!("  {} x {}", quantity, item_label(&catalog, id));
            }
            println!();
            println!("Crafting steps:");
            for (index, step) in steps.iter().enumerate() {
                println!(
                    "  {:>2}. [T{}] {} x {}",
                    index + 1,
                    step.tier,
                    step.quantity,
                    item_label(&catalog, &step.item_id)
                );
            }

            if inventory.is_some() {
                let inventory = load_inventory(inventory.as_deref())?;
                let substitution =
                    resolve_substitutions(&catalog, &requirements.raw_materials, &inventory);

                println!();
                println!("Tier substitutions:");
                if substitution.reductions.is_empty() {
                    println!("  none");
                }
                for reduction in &substitution.reductions {
                    println!(
                        "  {} x {} covers {} x {}",
                        reduction.source_quantity,
                        item_label(&catalog, &reduction.source_item_id),
                        reduction.reduced_quantity,
                        item_label(&catalog, &reduction.item_id)
                    );
                }
                println!();
                println!("Raw materials after substitution:");
                for (id, quantity) in &substitution.adjusted {
                    println!("  {} x {}", quantity, item_label(&catalog, id));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_lines_parse() {
        assert_eq!(
            parse_project_line("item_4101:3").unwrap(),
            ProjectItem::new("item_4101", 3)
        );
        assert_eq!(parse_project_line(" 4101 : 2 ").unwrap(), ProjectItem::new("4101", 2));
        assert!(parse_project_line("item_4101").is_err());
        assert!(parse_project_line("item_4101:0").is_err());
        assert!(parse_project_line(":4").is_err());
        assert!(parse_project_line("item_4101:many").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
