//! CLI module - Command-line interface for Foodgram
//!
//! Serving is the default; the other commands seed reference data that the
//! HTTP API only exposes read-only.

mod commands;

use clap::{Parser, Subcommand};

/// Foodgram - recipe sharing backend
#[derive(Parser)]
#[command(name = "foodgram")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Serve,

    /// Manage recipe tags
    Tags {
        #[command(subcommand)]
        command: TagCommands,
    },

    /// Manage the ingredient catalog
    Ingredients {
        #[command(subcommand)]
        command: IngredientCommands,
    },
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Create a tag
    Add {
        #[arg(long)]
        name: String,
        /// Hex color, e.g. #E26C2D
        #[arg(long)]
        color: String,
        #[arg(long)]
        slug: String,
    },
    /// List all tags
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand)]
pub enum IngredientCommands {
    /// Import ingredients from a JSON file
    Import {
        /// Path to a JSON array of {name, measurement_unit}
        path: String,
    },
    /// List ingredients, optionally by name prefix
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        name: Option<String>,
    },
}

pub use commands::*;
