//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db, config, predictor)
//! - `expenses` - Expense commands (add, list, update, delete)
//! - `import` - CSV import and export
//! - `predict` - Category prediction service commands
//! - `reports` - Report generation commands
//! - `serve` - Web server command

pub mod core;
pub mod expenses;
pub mod import;
pub mod predict;
pub mod reports;
pub mod serve;

// Re-export command functions for main.rs
pub use core::*;
pub use expenses::*;
pub use import::*;
pub use predict::*;
pub use reports::*;
pub use serve::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
