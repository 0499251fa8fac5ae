//! Spending reports built from stored expenses

use chrono::NaiveDate;
use tracing::debug;

use crate::aggregate::{aggregate, trend_points};
use crate::dates::resolve_period;
use crate::db::Database;
use crate::error::Result;
use crate::models::{DateRange, Expense, Granularity, SpendingSummary, TrendsReport};
use crate::outliers::detect_outliers;

/// Bucket expenses into a trend series with outlier analysis
///
/// Outliers are computed over bucket totals. With `exclude_outliers`, flagged
/// buckets are dropped from `data`; `total` always covers every bucket.
pub fn build_trends_report(
    expenses: &[Expense],
    granularity: Granularity,
    range: DateRange,
    exclude_outliers: bool,
) -> TrendsReport {
    let totals = aggregate(expenses, granularity);
    let total: f64 = totals.values().sum();

    let values: Vec<f64> = totals.values().copied().collect();
    let outliers = detect_outliers(&values);

    let points = trend_points(&totals, granularity);
    let excluded = exclude_outliers && outliers.has_outliers;
    let data = if excluded {
        outliers.retain_inliers(points, |p| p.total)
    } else {
        points
    };

    debug!(
        "Trends: {} buckets ({}), {} outliers",
        totals.len(),
        granularity,
        outliers.outlier_values.len()
    );

    TrendsReport {
        granularity,
        period: range.into(),
        data,
        outliers,
        outliers_excluded: excluded,
        total,
    }
}

/// Trend report for a period preset or custom bounds
pub fn trends_report(
    db: &Database,
    granularity: Granularity,
    period: &str,
    from: Option<&str>,
    to: Option<&str>,
    exclude_outliers: bool,
    today: NaiveDate,
) -> Result<TrendsReport> {
    let range = resolve_period(period, from, to, today)?;
    let expenses = db.list_expenses(&range)?;
    Ok(build_trends_report(
        &expenses,
        granularity,
        range,
        exclude_outliers,
    ))
}

/// Total spending for a period preset or custom bounds
pub fn spending_summary(
    db: &Database,
    period: &str,
    from: Option<&str>,
    to: Option<&str>,
    today: NaiveDate,
) -> Result<SpendingSummary> {
    let range = resolve_period(period, from, to, today)?;
    db.spending_summary(&range)
}
