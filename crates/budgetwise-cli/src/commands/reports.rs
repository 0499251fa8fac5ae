//! Report command implementations

use anyhow::Result;
use budgetwise_core::db::Database;
use budgetwise_core::models::{Granularity, ReportPeriod};
use budgetwise_core::reports;
use chrono::Utc;

fn describe_period(period: &ReportPeriod) -> String {
    match (&period.from, &period.to) {
        (None, None) => "all time".to_string(),
        (Some(from), None) => format!("{} onwards", from),
        (None, Some(to)) => format!("up to {}", to),
        (Some(from), Some(to)) => format!("{} to {}", from, to),
    }
}

pub fn cmd_report_trends(
    db: &Database,
    granularity: Granularity,
    period: &str,
    from: Option<&str>,
    to: Option<&str>,
    exclude_outliers: bool,
) -> Result<()> {
    let report = reports::trends_report(
        db,
        granularity,
        period,
        from,
        to,
        exclude_outliers,
        Utc::now().date_naive(),
    )?;

    println!();
    println!("📈 Spending Trends ({})", granularity);
    println!("   Period: {}", describe_period(&report.period));
    println!("   ─────────────────────────────────────────");

    if report.data.is_empty() && report.total == 0.0 {
        println!("   No spending found in this period.");
        return Ok(());
    }

    let max = report
        .data
        .iter()
        .map(|p| p.total)
        .fold(0.0_f64, f64::max);

    for point in &report.data {
        let bar_len = if max > 0.0 {
            ((point.total / max) * 30.0).round() as usize
        } else {
            0
        };
        let marker = if report.outliers.is_inlier(point.total) {
            ""
        } else {
            " ⚠️"
        };
        println!(
            "   {:14} │ {:>10.2} │ {}{}",
            point.label,
            point.total,
            "█".repeat(bar_len),
            marker
        );
    }

    println!();
    println!("   Total: ${:.2}", report.total);

    let outliers = &report.outliers;
    if outliers.has_outliers {
        let values: Vec<String> = outliers
            .outlier_values
            .iter()
            .map(|v| format!("{:.2}", v))
            .collect();
        println!(
            "   ⚠️  Unusual {} totals: {}{}",
            granularity,
            values.join(", "),
            if report.outliers_excluded {
                " (excluded from the series)"
            } else {
                ""
            }
        );
    }
    if let (Some(lower), Some(upper)) = (outliers.lower_bound, outliers.upper_bound) {
        println!("   Typical range: {:.2} to {:.2}", lower, upper);
    }

    Ok(())
}

pub fn cmd_report_summary(
    db: &Database,
    period: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let summary = reports::spending_summary(db, period, from, to, Utc::now().date_naive())?;

    println!();
    println!("📊 Spending Summary");
    println!("   Period: {}", describe_period(&summary.period));
    println!("   ─────────────────────────────");
    println!("   Total: ${:.2}", summary.total);
    println!("   Expenses: {}", summary.expense_count);

    Ok(())
}
