//! Expense operations

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, parse_datetime, parse_timestamp, Database};
use crate::error::Result;
use crate::models::{DateRange, Expense, ExpenseUpdate, NewExpense, ReportPeriod, SpendingSummary};

const EXPENSE_COLUMNS: &str = "id, title, amount, category, occurred_at, created_at";

// Both bounds are optional; NULL disables the check
const RANGE_CLAUSE: &str = "(?1 IS NULL OR substr(occurred_at, 1, 10) >= ?1) \
     AND (?2 IS NULL OR substr(occurred_at, 1, 10) <= ?2)";

fn row_to_expense(row: &Row<'_>) -> rusqlite::Result<Expense> {
    let occurred_at: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(Expense {
        id: row.get(0)?,
        title: row.get(1)?,
        amount: row.get(2)?,
        category: row.get(3)?,
        occurred_at: parse_timestamp(&occurred_at),
        created_at: parse_datetime(&created_at),
    })
}

fn range_params(range: &DateRange) -> (Option<String>, Option<String>) {
    (
        range.from.map(|d| d.format("%Y-%m-%d").to_string()),
        range.to.map(|d| d.format("%Y-%m-%d").to_string()),
    )
}

fn insert_row(conn: &Connection, expense: &NewExpense) -> Result<i64> {
    expense.validate()?;
    conn.execute(
        "INSERT INTO expenses (title, amount, category, occurred_at) VALUES (?, ?, ?, ?)",
        params![
            expense.title.trim(),
            expense.amount,
            expense.category.trim(),
            format_timestamp(expense.occurred_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Insert a validated expense and return the stored record
    pub fn insert_expense(&self, expense: &NewExpense) -> Result<Expense> {
        let conn = self.conn()?;
        let id = insert_row(&conn, expense)?;

        let stored = conn.query_row(
            &format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS),
            params![id],
            row_to_expense,
        )?;
        Ok(stored)
    }

    /// Insert a batch of expenses in one transaction
    ///
    /// Either every expense is stored or none is.
    pub fn insert_expenses(&self, expenses: &[NewExpense]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        for expense in expenses {
            insert_row(&tx, expense)?;
        }

        tx.commit()?;
        Ok(expenses.len())
    }

    /// Get an expense by ID
    pub fn get_expense(&self, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS),
                params![id],
                row_to_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// List expenses inside a date range, oldest first
    pub fn list_expenses(&self, range: &DateRange) -> Result<Vec<Expense>> {
        let conn = self.conn()?;
        let (from, to) = range_params(range);

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM expenses WHERE {} ORDER BY occurred_at ASC, id ASC",
            EXPENSE_COLUMNS, RANGE_CLAUSE
        ))?;

        let expenses = stmt
            .query_map(params![from, to], row_to_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Apply a partial update
    ///
    /// Returns `None` when the expense doesn't exist. An empty update returns
    /// the record unchanged. Unset fields keep their stored value inside the
    /// same statement, so concurrent updates to different fields both land.
    pub fn update_expense(&self, id: i64, update: &ExpenseUpdate) -> Result<Option<Expense>> {
        update.validate()?;
        if update.is_empty() {
            return self.get_expense(id);
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            r#"
            UPDATE expenses
            SET title = COALESCE(?1, title),
                amount = COALESCE(?2, amount),
                category = COALESCE(?3, category),
                occurred_at = COALESCE(?4, occurred_at)
            WHERE id = ?5
            "#,
            params![
                update.title.as_deref().map(str::trim),
                update.amount,
                update.category.as_deref().map(str::trim),
                update.occurred_at.map(format_timestamp),
                id,
            ],
        )?;
        if changed == 0 {
            return Ok(None);
        }

        let expense = conn.query_row(
            &format!("SELECT {} FROM expenses WHERE id = ?", EXPENSE_COLUMNS),
            params![id],
            row_to_expense,
        )?;
        Ok(Some(expense))
    }

    /// Delete an expense. Returns false when nothing was deleted.
    pub fn delete_expense(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM expenses WHERE id = ?", params![id])?;
        Ok(deleted > 0)
    }

    /// Count all stored expenses
    pub fn count_expenses(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Total spending and expense count for a date range
    pub fn spending_summary(&self, range: &DateRange) -> Result<SpendingSummary> {
        let conn = self.conn()?;
        let (from, to) = range_params(range);

        let (total, expense_count): (f64, i64) = conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(amount), 0.0), COUNT(*) FROM expenses WHERE {}",
                RANGE_CLAUSE
            ),
            params![from, to],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(SpendingSummary {
            period: ReportPeriod::from(*range),
            total,
            expense_count,
        })
    }
}
