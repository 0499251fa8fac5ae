//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use budgetwise_core::db::Database;
use budgetwise_core::dates::normalize_date;
use budgetwise_core::models::{DateRange, Granularity, NewExpense};
use budgetwise_core::test_utils::MockPredictorServer;
use budgetwise_core::{AppConfig, CategoryPredictor, HttpPredictor};

use crate::commands::{self, truncate};

fn setup_test_db() -> Database {
    Database::in_memory().unwrap()
}

fn seed(db: &Database, title: &str, amount: f64, category: &str, date: &str) -> i64 {
    db.insert_expense(&NewExpense {
        title: title.to_string(),
        amount,
        category: category.to_string(),
        occurred_at: normalize_date(Some(date)),
    })
    .unwrap()
    .id
}

fn mock_predictor(server: &MockPredictorServer) -> Arc<dyn CategoryPredictor> {
    Arc::new(HttpPredictor::new(&server.url(), Duration::from_secs(5)).unwrap())
}

// ========== Utility Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a much longer title", 10), "a much ...");
    assert_eq!(truncate("café crème brûlée", 8), "café ...");
}

#[test]
fn test_open_db_and_init() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budget.db");

    commands::cmd_init(&path, true).unwrap();
    assert!(path.exists());

    let db = commands::open_db(&path, true).unwrap();
    assert_eq!(db.count_expenses().unwrap(), 0);
}

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[server]\nport = 8123\n\n[predictor]\nmin_confidence = 0.8\n").unwrap();

    let config = commands::load_config(Some(&path)).unwrap();
    assert_eq!(config.server.port, 8123);
    assert_eq!(config.predictor.min_confidence, 0.8);

    assert!(commands::load_config(Some(&dir.path().join("missing.toml"))).is_err());
}

#[test]
fn test_require_predictor_without_url() {
    let config = AppConfig::default();
    assert!(commands::optional_predictor(&config).unwrap().is_none());
    assert!(commands::require_predictor(&config).is_err());
}

// ========== Expense Command Tests ==========

#[tokio::test]
async fn test_cmd_add_with_category() {
    let db = setup_test_db();

    let expense = commands::cmd_add(&db, None, 0.6, "Coffee", 4.5, Some("Food"), Some("2025-03-15"))
        .await
        .unwrap();

    assert_eq!(expense.category, "Food");
    assert_eq!(
        expense.occurred_at.format("%Y-%m-%d").to_string(),
        "2025-03-15"
    );
    assert_eq!(db.count_expenses().unwrap(), 1);
}

#[tokio::test]
async fn test_cmd_add_rejects_bad_amount() {
    let db = setup_test_db();
    let result = commands::cmd_add(&db, None, 0.6, "Refund", -3.0, Some("Food"), None).await;
    assert!(result.is_err());
    assert_eq!(db.count_expenses().unwrap(), 0);
}

#[tokio::test]
async fn test_cmd_add_needs_category_without_predictor() {
    let db = setup_test_db();
    let result = commands::cmd_add(&db, None, 0.6, "Coffee", 4.5, None, None).await;
    assert!(result.is_err());
    assert_eq!(db.count_expenses().unwrap(), 0);
}

#[tokio::test]
async fn test_cmd_add_uses_confident_suggestion() {
    let server = MockPredictorServer::start().await;
    let predictor = mock_predictor(&server);
    let db = setup_test_db();

    let expense = commands::cmd_add(
        &db,
        Some(predictor.as_ref()),
        0.6,
        "Uber to airport",
        32.0,
        None,
        None,
    )
    .await
    .unwrap();
    assert_eq!(expense.category, "Transport");

    // 40% is below the threshold
    let result = commands::cmd_add(
        &db,
        Some(predictor.as_ref()),
        0.6,
        "maybe shoes",
        80.0,
        None,
        None,
    )
    .await;
    assert!(result.is_err());
    assert_eq!(db.count_expenses().unwrap(), 1);
}

#[test]
fn test_cmd_list() {
    let db = setup_test_db();
    seed(&db, "Coffee", 4.0, "Food", "2025-01-03");
    seed(&db, "Cinema", 12.0, "Entertainment", "2025-02-20");

    assert!(commands::cmd_list(&db, None, None, None, false).is_ok());
    assert!(commands::cmd_list(&db, Some("2025-02-01"), None, None, true).is_ok());
    assert!(commands::cmd_list(&db, None, None, Some("monthly"), false).is_ok());
    assert!(commands::cmd_list(&db, None, None, Some("weekly"), true).is_ok());
    assert!(commands::cmd_list(&db, None, None, Some("hourly"), false).is_err());
}

#[test]
fn test_cmd_list_empty() {
    let db = setup_test_db();
    assert!(commands::cmd_list(&db, None, None, None, false).is_ok());
}

#[test]
fn test_cmd_update() {
    let db = setup_test_db();
    let id = seed(&db, "Coffee", 4.0, "Food", "2025-01-03");

    commands::cmd_update(
        &db,
        id,
        None,
        Some(5.25),
        Some("Drinks".to_string()),
        Some("10-01-2025"),
    )
    .unwrap();

    let expense = db.get_expense(id).unwrap().unwrap();
    assert_eq!(expense.title, "Coffee");
    assert_eq!(expense.amount, 5.25);
    assert_eq!(expense.category, "Drinks");
    assert_eq!(
        expense.occurred_at.format("%Y-%m-%d").to_string(),
        "2025-01-10"
    );
}

#[test]
fn test_cmd_update_errors() {
    let db = setup_test_db();
    let id = seed(&db, "Coffee", 4.0, "Food", "2025-01-03");

    // Nothing to change
    assert!(commands::cmd_update(&db, id, None, None, None, None).is_err());
    // Unknown id
    assert!(commands::cmd_update(&db, 999, None, Some(1.0), None, None).is_err());
    // Invalid amount
    assert!(commands::cmd_update(&db, id, None, Some(0.0), None, None).is_err());
    assert_eq!(db.get_expense(id).unwrap().unwrap().amount, 4.0);
}

#[test]
fn test_cmd_delete() {
    let db = setup_test_db();
    let id = seed(&db, "Coffee", 4.0, "Food", "2025-01-03");

    commands::cmd_delete(&db, id).unwrap();
    assert!(db.get_expense(id).unwrap().is_none());
    assert!(commands::cmd_delete(&db, id).is_err());
}

// ========== Report Command Tests ==========

#[test]
fn test_cmd_report_trends() {
    let db = setup_test_db();
    for (month, amount) in [(1, 100.0), (2, 110.0), (3, 105.0), (4, 95.0), (5, 2000.0)] {
        seed(&db, "Groceries", amount, "Food", &format!("2025-{:02}-10", month));
    }

    assert!(commands::cmd_report_trends(&db, Granularity::Monthly, "all", None, None, false).is_ok());
    assert!(commands::cmd_report_trends(&db, Granularity::Weekly, "all", None, None, true).is_ok());
    assert!(commands::cmd_report_trends(
        &db,
        Granularity::Daily,
        "custom",
        Some("2025-02-01"),
        Some("2025-03-31"),
        false
    )
    .is_ok());
    assert!(
        commands::cmd_report_trends(&db, Granularity::Monthly, "someday", None, None, false)
            .is_err()
    );
}

#[test]
fn test_cmd_report_trends_empty() {
    let db = setup_test_db();
    assert!(commands::cmd_report_trends(&db, Granularity::Yearly, "all", None, None, false).is_ok());
}

#[test]
fn test_cmd_report_summary() {
    let db = setup_test_db();
    seed(&db, "Coffee", 4.0, "Food", "2025-01-03");

    assert!(commands::cmd_report_summary(&db, "all", None, None).is_ok());
    assert!(commands::cmd_report_summary(&db, "this-month", None, None).is_ok());
    assert!(
        commands::cmd_report_summary(&db, "custom", Some("2025-02-01"), Some("2025-01-01"))
            .is_err()
    );
}

// ========== Import/Export Command Tests ==========

#[test]
fn test_cmd_import() {
    let db = setup_test_db();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Description,Amount,Category,Date").unwrap();
    writeln!(file, "Coffee,4.50,Food,2025-01-03").unwrap();
    writeln!(file, "Bus,2.80,Transport,04-01-2025").unwrap();
    writeln!(file, "Broken,,Food,2025-01-05").unwrap();
    file.flush().unwrap();

    let stats = commands::cmd_import(&db, file.path()).unwrap();
    assert_eq!(stats.imported, 2);
    assert_eq!(stats.skipped.len(), 1);
    assert_eq!(stats.skipped[0].line, 4);

    let bus = db
        .list_expenses(&DateRange::all())
        .unwrap()
        .into_iter()
        .find(|e| e.title == "Bus")
        .unwrap();
    assert_eq!(bus.occurred_at.format("%Y-%m-%d").to_string(), "2025-01-04");
}

#[test]
fn test_cmd_import_missing_file() {
    let db = setup_test_db();
    let dir = tempfile::tempdir().unwrap();
    assert!(commands::cmd_import(&db, &dir.path().join("nope.csv")).is_err());
}

#[test]
fn test_cmd_export_to_file() {
    let db = setup_test_db();
    seed(&db, "Coffee", 4.0, "Food", "2025-01-03");
    seed(&db, "Cinema", 12.0, "Entertainment", "2025-02-20");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    let count = commands::cmd_export(&db, Some(&path), Some("2025-02-01"), None).unwrap();
    assert_eq!(count, 1);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("id,title,amount,category"));
    assert!(lines[1].contains("Cinema"));

    // The export reads back in
    let fresh = setup_test_db();
    let stats = commands::cmd_import(&fresh, &path).unwrap();
    assert_eq!(stats.imported, 1);
}

// ========== Predict Command Tests ==========

#[tokio::test]
async fn test_cmd_predict() {
    let server = MockPredictorServer::start().await;
    let predictor = mock_predictor(&server);

    let prediction = commands::predict(predictor.as_ref(), "Netflix", Some(15.99))
        .await
        .unwrap();
    assert_eq!(prediction.category, "Entertainment");

    assert!(commands::cmd_predict(predictor.as_ref(), "maybe shoes", None, 0.6)
        .await
        .is_ok());
    assert!(commands::cmd_predict(predictor.as_ref(), "", None, 0.6)
        .await
        .is_err());
}

#[tokio::test]
async fn test_cmd_train() {
    let server = MockPredictorServer::start().await;
    let predictor = mock_predictor(&server);
    let db = setup_test_db();

    for day in 1..=9 {
        seed(&db, "Coffee", 3.0, "Food", &format!("2025-01-{:02}", day));
    }
    assert!(commands::train(&db, predictor.as_ref()).await.is_err());

    seed(&db, "Rent", 900.0, "Housing", "2025-01-28");
    let result = commands::train(&db, predictor.as_ref()).await.unwrap();
    assert_eq!(result.samples, 10);
    assert!(commands::cmd_train(&db, predictor.as_ref()).await.is_ok());
}

#[tokio::test]
async fn test_cmd_predictor_health() {
    let server = MockPredictorServer::start().await;
    let predictor = mock_predictor(&server);
    assert!(commands::cmd_predictor_health(predictor.as_ref()).await.is_ok());

    // Nothing listens on the discard port
    let unreachable =
        HttpPredictor::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
    assert!(commands::cmd_predictor_health(&unreachable).await.is_err());
}
