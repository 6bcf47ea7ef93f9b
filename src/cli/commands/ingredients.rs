//! Ingredient catalog command handlers

use anyhow::Context;

use crate::config::Config;
use crate::db::Store;
use crate::services::catalog::parse_ingredients;

pub async fn cmd_ingredients_import(config: &Config, path: &str) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {path}"))?;
    let items = parse_ingredients(&content)?;

    let store = Store::new(&config.general.database_path).await?;
    let inserted = store.import_ingredients(&items).await?;

    println!(
        "✓ Imported {} ingredients ({} already present)",
        inserted,
        items.len().saturating_sub(inserted)
    );
    Ok(())
}

pub async fn cmd_ingredients_list(config: &Config, name: Option<&str>) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let ingredients = store.search_ingredients(name).await?;

    if ingredients.is_empty() {
        println!("No ingredients found.");
        return Ok(());
    }

    for ingredient in &ingredients {
        println!(
            "{:>5}  {} ({})",
            ingredient.id, ingredient.name, ingredient.measurement_unit
        );
    }
    println!();
    println!("{} ingredients", ingredients.len());

    Ok(())
}
