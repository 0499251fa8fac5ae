//! Outlier detection for aggregated spending totals
//!
//! Uses Tukey's fences (1.5 × IQR) with lower-index quartiles. Series of two
//! or three points get a ratio/range rule instead because quartiles of so few
//! values are meaningless.

use crate::models::OutlierReport;

/// Multiplier applied to the IQR for the fences
const IQR_FENCE: f64 = 1.5;

/// Small series: max more than this many times min is an outlier
const SMALL_RATIO_LIMIT: f64 = 10.0;

/// Small series: a range wider than this many mins is an outlier
const SMALL_RANGE_LIMIT: f64 = 5.0;

/// Flag anomalous values in a series of non-negative totals
pub fn detect_outliers(values: &[f64]) -> OutlierReport {
    match values.len() {
        0 | 1 => OutlierReport::default(),
        2 | 3 => detect_small(values),
        _ => detect_iqr(values),
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn detect_small(values: &[f64]) -> OutlierReport {
    let sorted = sorted(values);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let range = max - min;

    // max / min is undefined here; nothing to compare against
    if min <= 0.0 {
        return OutlierReport {
            outlier_values: vec![],
            lower_bound: Some(0.0),
            upper_bound: Some(max),
            has_outliers: false,
        };
    }

    let flag_max = |upper: f64| OutlierReport {
        outlier_values: vec![max],
        lower_bound: Some(0.0),
        upper_bound: Some(upper),
        has_outliers: true,
    };

    if max / min > SMALL_RATIO_LIMIT {
        return flag_max(min * SMALL_RATIO_LIMIT);
    }

    if range > min * SMALL_RANGE_LIMIT {
        return flag_max(min * SMALL_RANGE_LIMIT);
    }

    OutlierReport {
        outlier_values: vec![],
        lower_bound: Some(min),
        upper_bound: Some(max),
        has_outliers: false,
    }
}

fn detect_iqr(values: &[f64]) -> OutlierReport {
    let sorted = sorted(values);
    let n = sorted.len();
    let q1 = sorted[n / 4];
    let q3 = sorted[(n * 3) / 4];
    let iqr = q3 - q1;

    let lower = q1 - IQR_FENCE * iqr;
    let upper = q3 + IQR_FENCE * iqr;

    let outlier_values: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| *v < lower || *v > upper)
        .collect();

    OutlierReport {
        has_outliers: !outlier_values.is_empty(),
        outlier_values,
        lower_bound: Some(lower),
        upper_bound: Some(upper),
    }
}

impl OutlierReport {
    /// Whether a value falls inside the bounds (always true when unset)
    pub fn is_inlier(&self, value: f64) -> bool {
        self.lower_bound.map_or(true, |lo| value >= lo)
            && self.upper_bound.map_or(true, |hi| value <= hi)
    }

    /// Keep only items whose value falls inside the bounds
    ///
    /// A no-op when nothing was flagged.
    pub fn retain_inliers<T, F>(&self, items: Vec<T>, value: F) -> Vec<T>
    where
        F: Fn(&T) -> f64,
    {
        if !self.has_outliers {
            return items;
        }
        items
            .into_iter()
            .filter(|item| self.is_inlier(value(item)))
            .collect()
    }
}
