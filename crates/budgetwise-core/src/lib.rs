//! BudgetWise Core Library
//!
//! Shared functionality for the BudgetWise expense tracker:
//! - Date normalization for loosely formatted input
//! - Time-bucket aggregation and outlier detection for spending trends
//! - Database access and migrations (expenses, users, audit log)
//! - User registry with pluggable storage
//! - Client for the external category prediction service
//! - CSV import and export

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod outliers;
pub mod predictor;
pub mod reports;

/// Test utilities including a mock prediction server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use aggregate::{aggregate, Bucketable, RawRecord};
pub use auth::{InMemoryUsers, UserRepository};
pub use config::{AppConfig, PredictorConfig, ServerConfig};
pub use dates::normalize_date;
pub use db::{AuditEntry, Database};
pub use error::{Error, Result};
pub use import::ImportStats;
pub use outliers::detect_outliers;
pub use predictor::{CategoryPredictor, HttpPredictor};
