//! BudgetWise CLI - Expense tracker
//!
//! Usage:
//!   budgetwise init                       Initialize database
//!   budgetwise add "Coffee" 4.50 -c Food  Record an expense
//!   budgetwise report trends              Spending per month with outliers
//!   budgetwise serve --port 3000          Start web server

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Serve {
            port,
            host,
            no_auth,
        } => {
            commands::cmd_serve(
                &cli.db,
                cli.config.as_deref(),
                host,
                port,
                no_auth,
                cli.no_encrypt,
            )
            .await
        }
        Commands::Add {
            title,
            amount,
            category,
            date,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            let config = commands::load_config(cli.config.as_deref())?;
            let predictor = if category.is_none() {
                commands::optional_predictor(&config)?
            } else {
                None
            };
            commands::cmd_add(
                &db,
                predictor.as_deref(),
                config.predictor.min_confidence,
                &title,
                amount,
                category.as_deref(),
                date.as_deref(),
            )
            .await
            .map(|_| ())
        }
        Commands::List {
            from,
            to,
            group_by,
            json,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_list(
                &db,
                from.as_deref(),
                to.as_deref(),
                group_by.as_deref(),
                json,
            )
        }
        Commands::Update {
            id,
            title,
            amount,
            category,
            date,
        } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_update(&db, id, title, amount, category, date.as_deref())
        }
        Commands::Delete { id } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_delete(&db, id)
        }
        Commands::Report { report_type } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match report_type {
                ReportType::Trends {
                    granularity,
                    period,
                    from,
                    to,
                    exclude_outliers,
                } => {
                    let granularity: budgetwise_core::models::Granularity = granularity
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!(e))?;
                    commands::cmd_report_trends(
                        &db,
                        granularity,
                        &period,
                        from.as_deref(),
                        to.as_deref(),
                        exclude_outliers,
                    )
                }
                ReportType::Summary { period, from, to } => {
                    commands::cmd_report_summary(&db, &period, from.as_deref(), to.as_deref())
                }
            }
        }
        Commands::Import { file } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_import(&db, &file).map(|_| ())
        }
        Commands::Export { output, from, to } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            commands::cmd_export(&db, output.as_deref(), from.as_deref(), to.as_deref())
                .map(|_| ())
        }
        Commands::Predict { action } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let predictor = commands::require_predictor(&config)?;
            match action {
                PredictAction::Category { title, amount } => {
                    commands::cmd_predict(
                        predictor.as_ref(),
                        &title,
                        amount,
                        config.predictor.min_confidence,
                    )
                    .await
                }
                PredictAction::Train => {
                    let db = commands::open_db(&cli.db, cli.no_encrypt)?;
                    commands::cmd_train(&db, predictor.as_ref()).await
                }
                PredictAction::Health => commands::cmd_predictor_health(predictor.as_ref()).await,
            }
        }
    }
}
