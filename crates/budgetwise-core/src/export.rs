//! CSV export of expenses
//!
//! Columns are `id,title,amount,category,date,created_at`, with RFC 3339
//! timestamps. The output re-imports cleanly through `import::parse_csv`.

use std::io::Write;

use chrono::SecondsFormat;
use serde::Serialize;

use crate::error::Result;
use crate::models::Expense;

#[derive(Debug, Serialize)]
struct ExpenseRow<'a> {
    id: i64,
    title: &'a str,
    amount: f64,
    category: &'a str,
    date: String,
    created_at: String,
}

impl<'a> From<&'a Expense> for ExpenseRow<'a> {
    fn from(e: &'a Expense) -> Self {
        Self {
            id: e.id,
            title: &e.title,
            amount: e.amount,
            category: &e.category,
            date: e.occurred_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            created_at: e.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Write expenses as CSV. Returns the number of rows written.
pub fn export_csv<W: Write>(expenses: &[Expense], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    if expenses.is_empty() {
        wtr.write_record(["id", "title", "amount", "category", "date", "created_at"])?;
    }
    for expense in expenses {
        wtr.serialize(ExpenseRow::from(expense))?;
    }
    wtr.flush()?;
    Ok(expenses.len())
}
