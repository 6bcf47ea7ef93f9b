//! Reference data maintenance: tags and the ingredient catalog.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

const MAX_TAG_NAME_LEN: usize = 200;

fn color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("Invalid regex"))
}

fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("Invalid regex"))
}

pub fn validate_tag(name: &str, color: &str, slug: &str) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Tag name cannot be empty");
    }
    if name.chars().count() > MAX_TAG_NAME_LEN {
        anyhow::bail!("Tag name must be {MAX_TAG_NAME_LEN} characters or less");
    }
    if !color_regex().is_match(color) {
        anyhow::bail!("Invalid color '{color}': expected #RRGGBB");
    }
    if !slug_regex().is_match(slug) {
        anyhow::bail!("Invalid slug '{slug}': only letters, digits, '-' and '_' are allowed");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct IngredientEntry {
    name: String,
    measurement_unit: String,
}

/// Parse a JSON array of `{name, measurement_unit}` objects, dropping
/// blank entries and in-file duplicates.
pub fn parse_ingredients(content: &str) -> Result<Vec<(String, String)>> {
    let entries: Vec<IngredientEntry> =
        serde_json::from_str(content).context("Expected a JSON array of {name, measurement_unit}")?;

    let mut items: Vec<(String, String)> = Vec::with_capacity(entries.len());
    for entry in entries {
        let pair = (
            entry.name.trim().to_string(),
            entry.measurement_unit.trim().to_string(),
        );
        if pair.0.is_empty() || pair.1.is_empty() || items.contains(&pair) {
            continue;
        }
        items.push(pair);
    }

    Ok(items)
}
