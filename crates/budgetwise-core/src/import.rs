//! CSV import of expenses
//!
//! Expects a header row. Columns are matched case-insensitively:
//! `title` (or `description`), `amount`, `category`, and an optional date
//! column (`date`, `occurred_at` or `createdAt`). Dates go through
//! [`normalize_date`], so `15-03-2025` works and junk becomes "now".

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::coerce_amount;
use crate::dates::normalize_date;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::NewExpense;

/// A data row that could not be imported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based line number in the file (the header is line 1)
    pub line: u64,
    pub reason: String,
}

/// Rows parsed from a CSV file
#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub expenses: Vec<NewExpense>,
    pub skipped: Vec<SkippedRow>,
}

/// Outcome of importing into the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: Vec<SkippedRow>,
}

struct Columns {
    title: usize,
    amount: usize,
    category: usize,
    date: Option<usize>,
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

fn resolve_columns(headers: &StringRecord) -> Result<Columns> {
    let missing = |name: &str| Error::InvalidData(format!("CSV is missing a '{}' column", name));
    Ok(Columns {
        title: find_column(headers, &["title", "description"]).ok_or_else(|| missing("title"))?,
        amount: find_column(headers, &["amount"]).ok_or_else(|| missing("amount"))?,
        category: find_column(headers, &["category"]).ok_or_else(|| missing("category"))?,
        date: find_column(headers, &["date", "occurred_at", "createdAt"]),
    })
}

fn parse_row(record: &StringRecord, columns: &Columns) -> std::result::Result<NewExpense, String> {
    let field = |i: usize| record.get(i).unwrap_or("").trim();

    let raw_amount = field(columns.amount);
    let amount = coerce_amount(&serde_json::Value::String(raw_amount.to_string()));
    if amount <= 0.0 {
        return Err(format!("invalid amount '{}'", raw_amount));
    }

    let expense = NewExpense {
        title: field(columns.title).to_string(),
        amount,
        category: field(columns.category).to_string(),
        occurred_at: normalize_date(columns.date.map(field)),
    };
    expense.validate().map_err(|e| match e {
        Error::InvalidData(msg) => msg,
        other => other.to_string(),
    })?;
    Ok(expense)
}

/// Parse expenses from CSV, collecting bad rows instead of failing
///
/// Only a missing required column (or unreadable CSV) is an error.
pub fn parse_csv<R: Read>(reader: R) -> Result<ParsedImport> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let columns = resolve_columns(&headers)?;

    let mut parsed = ParsedImport::default();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        match parse_row(&record, &columns) {
            Ok(expense) => parsed.expenses.push(expense),
            Err(reason) => {
                debug!("Skipping CSV line {}: {}", line, reason);
                parsed.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    Ok(parsed)
}

/// Parse a CSV file and insert every valid row
///
/// The inserts share one transaction, so a failed import stores nothing and
/// can simply be run again.
pub fn import_csv<R: Read>(db: &Database, reader: R) -> Result<ImportStats> {
    let parsed = parse_csv(reader)?;
    let imported = db.insert_expenses(&parsed.expenses)?;

    info!(
        "Imported {} expenses ({} skipped)",
        imported,
        parsed.skipped.len()
    );
    Ok(ImportStats {
        imported,
        skipped: parsed.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DateRange;
    use chrono::{Datelike, TimeZone, Utc};

    #[test]
    fn test_parse_basic_csv() {
        let data = "title,amount,category,date\n\
                    Coffee,3.50,Food,2025-03-15\n\
                    Train,12,Transport,15-03-2025\n";
        let parsed = parse_csv(data.as_bytes()).unwrap();
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.expenses.len(), 2);
        assert_eq!(parsed.expenses[0].amount, 3.5);
        let expected = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(parsed.expenses[0].occurred_at, expected);
        assert_eq!(parsed.expenses[1].occurred_at, expected);
    }

    #[test]
    fn test_header_aliases_and_case() {
        let data = "Description,AMOUNT,Category,createdAt\nRent,1200,Housing,2025-01-01\n";
        let parsed = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(parsed.expenses[0].title, "Rent");
        assert_eq!(parsed.expenses[0].occurred_at.month(), 1);
    }

    #[test]
    fn test_missing_date_column_uses_now() {
        let data = "title,amount,category\nLunch,9,Food\n";
        let before = Utc::now();
        let parsed = parse_csv(data.as_bytes()).unwrap();
        assert!(parsed.expenses[0].occurred_at >= before);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let data = "title,amount,category,date\n\
                    Good,10,Food,2025-01-01\n\
                    NoAmount,abc,Food,2025-01-01\n\
                    ,5,Food,2025-01-01\n\
                    Negative,-3,Food,2025-01-01\n\
                    NoCategory,4,,2025-01-01\n";
        let parsed = parse_csv(data.as_bytes()).unwrap();
        assert_eq!(parsed.expenses.len(), 1);
        assert_eq!(parsed.skipped.len(), 4);
        assert_eq!(parsed.skipped[0].line, 3);
        assert!(parsed.skipped[0].reason.contains("abc"));
    }

    #[test]
    fn test_missing_required_column() {
        let data = "title,category\nCoffee,Food\n";
        let err = parse_csv(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("amount"));
    }

    #[test]
    fn test_import_into_database() {
        let db = Database::in_memory().unwrap();
        let data = "title,amount,category,date\n\
                    Coffee,3.5,Food,2025-03-15\n\
                    Broken,zero,Food,2025-03-15\n";
        let stats = import_csv(&db, data.as_bytes()).unwrap();
        assert_eq!(stats.imported, 1);
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(db.list_expenses(&DateRange::all()).unwrap().len(), 1);
    }

    #[test]
    fn test_failed_import_stores_nothing() {
        let db = Database::in_memory().unwrap();
        db.conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_row BEFORE INSERT ON expenses
                 WHEN NEW.title = 'Rejected'
                 BEGIN SELECT RAISE(ABORT, 'row rejected'); END;",
            )
            .unwrap();

        let data = "title,amount,category,date\n\
                    Coffee,3.5,Food,2025-03-15\n\
                    Rejected,8,Food,2025-03-16\n\
                    Bus,2.8,Transport,2025-03-17\n";
        let err = import_csv(&db, data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(db.count_expenses().unwrap(), 0);

        // The retry after fixing the file imports everything exactly once
        let fixed = data.replace("Rejected", "Lunch");
        let stats = import_csv(&db, fixed.as_bytes()).unwrap();
        assert_eq!(stats.imported, 3);
        assert_eq!(db.count_expenses().unwrap(), 3);
    }
}
