//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_config` - Config file plus environment overrides
//! - `optional_predictor` / `require_predictor` - Prediction service client
//! - `cmd_init` - Initialize the database

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use budgetwise_core::{db::Database, AppConfig, CategoryPredictor, HttpPredictor};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path must be valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    AppConfig::load(path).context("Failed to load config")
}

/// Predictor client when one is configured
pub fn optional_predictor(config: &AppConfig) -> Result<Option<Arc<dyn CategoryPredictor>>> {
    let predictor = HttpPredictor::from_config(&config.predictor)
        .context("Failed to create predictor client")?;
    Ok(predictor.map(|p| Arc::new(p) as Arc<dyn CategoryPredictor>))
}

/// Predictor client, or an error explaining how to configure one
pub fn require_predictor(config: &AppConfig) -> Result<Arc<dyn CategoryPredictor>> {
    optional_predictor(config)?.context(
        "Category predictor not configured. Set BW_PREDICTOR_URL or [predictor] url in the config file",
    )
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path, no_encrypt)?;
    let count = db.count_expenses().context("Failed to read expenses")?;
    println!("   Expenses stored: {}", count);

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Add an expense: budgetwise add \"Coffee\" 4.50 --category Food");
    println!("  2. Import a CSV:   budgetwise import --file expenses.csv");
    println!("  3. Start web API:  budgetwise serve");

    Ok(())
}
