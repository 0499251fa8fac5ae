//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// BudgetWise - Track expenses and spot unusual spending
#[derive(Parser)]
#[command(name = "budgetwise")]
#[command(about = "Self-hosted expense tracker with spending trends", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "budgetwise.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set BW_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Config file (defaults to ~/.config/budgetwise/config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Start the web server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Disable authentication (for local development only)
        ///
        /// WARNING: Do not use this flag when exposing the server to a network.
        /// By default, requests need a user token or a BW_API_KEYS key.
        #[arg(long)]
        no_auth: bool,
    },

    /// Record an expense
    Add {
        /// What the money was spent on
        title: String,

        /// Amount spent (must be positive)
        amount: f64,

        /// Category (suggested by the predictor when omitted)
        #[arg(short, long)]
        category: Option<String>,

        /// When it happened: YYYY-MM-DD, DD-MM-YYYY or RFC 3339 (defaults to now)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// List expenses
    List {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Show totals per bucket instead: daily, weekly, monthly, yearly
        #[arg(long)]
        group_by: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Change fields of an expense
    Update {
        /// Expense ID
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        amount: Option<f64>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        date: Option<String>,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: i64,
    },

    /// Generate reports
    Report {
        #[command(subcommand)]
        report_type: ReportType,
    },

    /// Import expenses from CSV (title, amount, category, optional date)
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Export expenses to CSV
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Talk to the category prediction service (needs BW_PREDICTOR_URL)
    Predict {
        #[command(subcommand)]
        action: PredictAction,
    },
}

#[derive(Subcommand)]
pub enum ReportType {
    /// Spending trends over time with outlier analysis
    Trends {
        /// Granularity: daily, weekly, monthly, yearly
        #[arg(long, default_value = "monthly")]
        granularity: String,

        /// Time period: all, this-month, last-month, this-year, last-year, last-30-days, custom
        #[arg(long, default_value = "all")]
        period: String,

        /// Custom start date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        from: Option<String>,

        /// Custom end date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        to: Option<String>,

        /// Drop outlier buckets from the series
        #[arg(long)]
        exclude_outliers: bool,
    },

    /// Total spending for a period
    Summary {
        /// Time period: all, this-month, last-month, this-year, last-year, last-30-days, custom
        #[arg(long, default_value = "this-month")]
        period: String,

        /// Custom start date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        from: Option<String>,

        /// Custom end date (YYYY-MM-DD) - overrides period
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum PredictAction {
    /// Suggest a category for a title
    Category {
        title: String,

        #[arg(long)]
        amount: Option<f64>,
    },

    /// Retrain the model on every stored expense (at least 10)
    Train,

    /// Check whether the service is reachable
    Health,
}
