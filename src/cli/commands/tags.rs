//! Tag command handlers

use crate::config::Config;
use crate::db::Store;
use crate::services::catalog::validate_tag;

pub async fn cmd_tags_add(config: &Config, name: &str, color: &str, slug: &str) -> anyhow::Result<()> {
    validate_tag(name, color, slug)?;

    let store = Store::new(&config.general.database_path).await?;
    let tag = store.create_tag(name.trim(), color, slug).await?;

    println!("✓ Added tag: {} (ID: {}, slug: {})", tag.name, tag.id, tag.slug);
    Ok(())
}

pub async fn cmd_tags_list(config: &Config) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let tags = store.list_tags().await?;

    if tags.is_empty() {
        println!("No tags defined.");
        println!();
        println!("Add one with: foodgram tags add --name Breakfast --color \"#E26C2D\" --slug breakfast");
        return Ok(());
    }

    println!("Tags ({} total)", tags.len());
    println!("{:-<50}", "");

    for tag in tags {
        println!("{:>4}  {:<20} {}  {}", tag.id, tag.name, tag.color, tag.slug);
    }

    Ok(())
}
