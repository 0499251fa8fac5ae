//! Expense command implementations

use anyhow::{Context, Result};
use budgetwise_core::aggregate::aggregate;
use budgetwise_core::dates::{normalize_date, parse_bound};
use budgetwise_core::db::Database;
use budgetwise_core::models::{DateRange, Expense, ExpenseUpdate, Granularity, NewExpense};
use budgetwise_core::CategoryPredictor;
use tracing::warn;

use super::truncate;

/// Record an expense, asking the predictor for a category when none is given
///
/// Suggestions below `min_confidence` are not used.
pub async fn cmd_add(
    db: &Database,
    predictor: Option<&dyn CategoryPredictor>,
    min_confidence: f64,
    title: &str,
    amount: f64,
    category: Option<&str>,
    date: Option<&str>,
) -> Result<Expense> {
    let category = match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(category) => category.to_string(),
        None => suggest_category(predictor, min_confidence, title, amount).await?,
    };

    let expense = db
        .insert_expense(&NewExpense {
            title: title.to_string(),
            amount,
            category,
            occurred_at: normalize_date(date),
        })
        .context("Failed to add expense")?;

    println!(
        "✅ Added #{}: {} ({}) {:.2} on {}",
        expense.id,
        expense.title,
        expense.category,
        expense.amount,
        expense.occurred_at.format("%Y-%m-%d")
    );

    Ok(expense)
}

async fn suggest_category(
    predictor: Option<&dyn CategoryPredictor>,
    min_confidence: f64,
    title: &str,
    amount: f64,
) -> Result<String> {
    let Some(predictor) = predictor else {
        anyhow::bail!("--category is required (no category predictor configured)");
    };

    match predictor.predict(title, Some(amount)).await {
        Ok(prediction) if prediction.confidence >= min_confidence => {
            println!(
                "🤖 Suggested category: {} ({:.0}% confident)",
                prediction.category,
                prediction.confidence * 100.0
            );
            Ok(prediction.category)
        }
        Ok(prediction) => anyhow::bail!(
            "Predictor is unsure ({} at {:.0}%); pass --category",
            prediction.category,
            prediction.confidence * 100.0
        ),
        Err(e) => {
            warn!("Category prediction failed: {}", e);
            anyhow::bail!("Could not suggest a category; pass --category")
        }
    }
}

pub fn cmd_list(
    db: &Database,
    from: Option<&str>,
    to: Option<&str>,
    group_by: Option<&str>,
    json: bool,
) -> Result<()> {
    let range = DateRange::new(parse_bound(from), parse_bound(to));
    let expenses = db.list_expenses(&range)?;

    if let Some(group_by) = group_by {
        let granularity: Granularity = group_by.parse().map_err(|e: String| anyhow::anyhow!(e))?;
        let totals = aggregate(&expenses, granularity);

        if json {
            println!("{}", serde_json::to_string_pretty(&totals)?);
            return Ok(());
        }

        println!();
        println!("📊 Spending by {}", granularity);
        println!("   ─────────────────────────");
        for (period, total) in &totals {
            println!("   {:12} │ {:>10.2}", period, total);
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&expenses)?);
        return Ok(());
    }

    if expenses.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    println!();
    println!(
        "   {:>5} │ {:10} │ {:30} │ {:15} │ {:>10}",
        "ID", "Date", "Title", "Category", "Amount"
    );
    println!("   ──────┼────────────┼────────────────────────────────┼─────────────────┼───────────");
    for e in &expenses {
        println!(
            "   {:>5} │ {:10} │ {:30} │ {:15} │ {:>10.2}",
            e.id,
            e.occurred_at.format("%Y-%m-%d"),
            truncate(&e.title, 30),
            truncate(&e.category, 15),
            e.amount
        );
    }
    println!();
    println!("   {} expenses", expenses.len());

    Ok(())
}

pub fn cmd_update(
    db: &Database,
    id: i64,
    title: Option<String>,
    amount: Option<f64>,
    category: Option<String>,
    date: Option<&str>,
) -> Result<()> {
    let update = ExpenseUpdate {
        title,
        amount,
        category,
        occurred_at: date.map(|d| normalize_date(Some(d))),
    };

    if update.is_empty() {
        anyhow::bail!("Nothing to update. Pass --title, --amount, --category or --date");
    }

    let expense = db
        .update_expense(id, &update)
        .context("Failed to update expense")?
        .with_context(|| format!("Expense not found: {}", id))?;

    println!(
        "✏️  Updated #{}: {} ({}) {:.2} on {}",
        expense.id,
        expense.title,
        expense.category,
        expense.amount,
        expense.occurred_at.format("%Y-%m-%d")
    );
    Ok(())
}

pub fn cmd_delete(db: &Database, id: i64) -> Result<()> {
    if !db.delete_expense(id)? {
        anyhow::bail!("Expense not found: {}", id);
    }
    println!("🗑️  Deleted expense #{}", id);
    Ok(())
}
