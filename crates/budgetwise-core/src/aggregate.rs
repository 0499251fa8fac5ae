//! Time-bucket aggregation of expenses
//!
//! Totals are keyed by strings that sort chronologically (`2025-01-31`,
//! `2025-W05`, `2025-01`, `2025`), so a `BTreeMap` yields chart-ready order.
//!
//! Weekly keys use `ceil(day_of_year / 7)`, not ISO-8601 week numbering.
//! Days around New Year can land in a different week than a calendar shows.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::normalize_date;
use crate::models::{Expense, Granularity, TrendPoint};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Anything that can be placed in a time bucket
pub trait Bucketable {
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Amount to add to the bucket. Must be finite; unusable values are 0.
    fn amount(&self) -> f64;
}

impl Bucketable for Expense {
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn amount(&self) -> f64 {
        if self.amount.is_finite() {
            self.amount
        } else {
            0.0
        }
    }
}

/// An untyped record as it arrives from a client or an old export
///
/// Amount may be a number, a numeric string, or junk; the date may be any
/// string `normalize_date` understands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub amount: serde_json::Value,
    #[serde(default, alias = "createdAt", alias = "date")]
    pub occurred_at: Option<String>,
}

impl Bucketable for RawRecord {
    fn occurred_at(&self) -> DateTime<Utc> {
        normalize_date(self.occurred_at.as_deref())
    }

    fn amount(&self) -> f64 {
        coerce_amount(&self.amount)
    }
}

/// Coerce a JSON value to an amount: numbers and numeric strings pass,
/// everything else (null, bools, junk, NaN) counts as zero
pub fn coerce_amount(value: &serde_json::Value) -> f64 {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Bucket key for a timestamp at the given granularity
pub fn bucket_key(at: DateTime<Utc>, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => {
            // Truncate the stored ISO timestamp instead of re-deriving the day
            let iso = at.to_rfc3339_opts(SecondsFormat::Millis, true);
            iso.split('T').next().unwrap_or_default().to_string()
        }
        Granularity::Weekly => {
            let week = (at.ordinal() + 6) / 7;
            format!("{:04}-W{:02}", at.year(), week)
        }
        Granularity::Monthly => format!("{:04}-{:02}", at.year(), at.month()),
        Granularity::Yearly => format!("{:04}", at.year()),
    }
}

/// Sum amounts per bucket. Every record lands in exactly one bucket.
pub fn aggregate<R: Bucketable>(records: &[R], granularity: Granularity) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals
            .entry(bucket_key(record.occurred_at(), granularity))
            .or_insert(0.0) += record.amount();
    }
    totals
}

/// Sum of all amounts
pub fn total_spending<R: Bucketable>(records: &[R]) -> f64 {
    records.iter().map(Bucketable::amount).sum()
}

/// Human-readable label for a bucket key
///
/// Keys that don't have the expected shape are returned unchanged.
pub fn bucket_label(key: &str, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily | Granularity::Yearly => key.to_string(),
        Granularity::Monthly => key
            .split_once('-')
            .and_then(|(year, month)| {
                let idx = month.parse::<usize>().ok()?.checked_sub(1)?;
                MONTH_NAMES.get(idx).map(|name| format!("{} {}", name, year))
            })
            .unwrap_or_else(|| key.to_string()),
        Granularity::Weekly => key
            .split_once("-W")
            .and_then(|(year, week)| {
                let week = week.parse::<u32>().ok()?;
                Some(format!("Week {}, {}", week, year))
            })
            .unwrap_or_else(|| key.to_string()),
    }
}

/// Turn an aggregate into labelled chart points, in key order
pub fn trend_points(totals: &BTreeMap<String, f64>, granularity: Granularity) -> Vec<TrendPoint> {
    totals
        .iter()
        .map(|(key, total)| TrendPoint {
            period: key.clone(),
            label: bucket_label(key, granularity),
            total: *total,
        })
        .collect()
}
