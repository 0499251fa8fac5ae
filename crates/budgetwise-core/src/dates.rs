//! Date normalization and report period resolution
//!
//! `normalize_date` is deliberately lossy: expenses typed by hand arrive as
//! `2025-03-15`, `15/03/2025`, `15.3.25` and worse. Anything that cannot be
//! read as a calendar date becomes "now" instead of an error, so callers must
//! treat the result as advisory.

use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::DateRange;

/// Date-time layouts tried before falling back to date-only layouts
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts, resolved to midnight UTC
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", // 2025-03-15
    "%Y/%m/%d", // 2025/03/15
    "%m/%d/%Y", // 03/15/2025
];

fn separator_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-/.]").expect("valid regex"))
}

/// Normalize a free-form date string, falling back to the current time
pub fn normalize_date(input: Option<&str>) -> DateTime<Utc> {
    normalize_date_at(input, Utc::now())
}

/// Normalize a free-form date string against an explicit "now"
///
/// 1. Missing or blank input yields `now`.
/// 2. Standard layouts (RFC 3339, ISO date/time, `MM/DD/YYYY`) are tried first.
/// 3. Otherwise the input must split on `-`, `/` or `.` into exactly three
///    parts whose first part is a number in `[1, 31]`; it is then read as
///    day-month-year. Any other shape yields `now`.
pub fn normalize_date_at(input: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let raw = match input.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return now,
    };

    if let Some(parsed) = parse_standard(raw) {
        return parsed;
    }

    let parts: Vec<&str> = separator_re().split(raw).map(str::trim).collect();
    if parts.len() != 3 {
        debug!(input = raw, "Date has no three-part shape, using now");
        return now;
    }

    let (day, month, year) = (parts[0], parts[1], parts[2]);
    let looks_like_day = day
        .parse::<f64>()
        .map(|d| d > 0.0 && d <= 31.0)
        .unwrap_or(false);
    if !looks_like_day {
        debug!(input = raw, "Leading date part is not a day, using now");
        return now;
    }

    let candidate = format!("{:0>4}-{:0>2}-{:0>2}", year, month, day);
    match NaiveDate::parse_from_str(&candidate, "%Y-%m-%d") {
        Ok(date) => midnight_utc(date),
        Err(_) => {
            debug!(input = raw, candidate = %candidate, "Day-month-year candidate invalid, using now");
            now
        }
    }
}

/// Parse the layouts a strict date parser accepts, without any heuristics
pub fn parse_standard(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // chrono's %Y happily reads "15" as year 15, which would swallow
    // day-first input like "15-03-25" before the heuristic sees it
    if leading_year(s) {
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(dt.and_utc());
            }
        }
    }

    for fmt in DATE_FORMATS {
        let year_ok = if fmt.starts_with("%Y") {
            leading_year(s)
        } else {
            trailing_year(s)
        };
        if !year_ok {
            continue;
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(midnight_utc(date));
        }
    }

    None
}

fn is_year(part: &str) -> bool {
    part.len() == 4 && part.bytes().all(|b| b.is_ascii_digit())
}

fn leading_year(s: &str) -> bool {
    s.get(..4).map_or(false, is_year) && !s[4..].starts_with(|c: char| c.is_ascii_digit())
}

fn trailing_year(s: &str) -> bool {
    s.rsplit('/').next().map_or(false, is_year)
}

/// Parse a listing bound; unreadable values are ignored rather than rejected
pub fn parse_bound(s: Option<&str>) -> Option<NaiveDate> {
    s.and_then(parse_standard).map(|dt| dt.date_naive())
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn first_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidData(format!("Invalid month {}-{}", year, month)))
}

fn last_of_month(year: i32, month: u32) -> Result<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_of_month(next_year, next_month)?
        .pred_opt()
        .ok_or_else(|| Error::InvalidData(format!("Invalid month {}-{}", year, month)))
}

/// Resolve a period preset (or custom bounds) into an inclusive date range
///
/// Presets: `all`, `this-month`, `last-month`, `this-year`, `last-year`,
/// `last-30-days`, `custom`. Custom bounds may be one-sided and take
/// precedence over the preset whenever either is given.
pub fn resolve_period(
    period: &str,
    custom_from: Option<&str>,
    custom_to: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange> {
    if custom_from.is_some() || custom_to.is_some() || period.eq_ignore_ascii_case("custom") {
        let parse = |s: &str, which: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                Error::InvalidData(format!("Invalid {} date format (use YYYY-MM-DD)", which))
            })
        };
        let from = custom_from.map(|s| parse(s, "from")).transpose()?;
        let to = custom_to.map(|s| parse(s, "to")).transpose()?;
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(Error::InvalidData(
                    "from date must not be after to date".into(),
                ));
            }
        }
        return Ok(DateRange::new(from, to));
    }

    match period.to_lowercase().as_str() {
        "all" | "all-time" => Ok(DateRange::all()),
        "this-month" => Ok(DateRange::new(
            Some(first_of_month(today.year(), today.month())?),
            Some(last_of_month(today.year(), today.month())?),
        )),
        "last-month" => {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            Ok(DateRange::new(
                Some(first_of_month(year, month)?),
                Some(last_of_month(year, month)?),
            ))
        }
        "this-year" => Ok(DateRange::new(
            Some(first_of_month(today.year(), 1)?),
            Some(last_of_month(today.year(), 12)?),
        )),
        "last-year" => Ok(DateRange::new(
            Some(first_of_month(today.year() - 1, 1)?),
            Some(last_of_month(today.year() - 1, 12)?),
        )),
        "last-30-days" => Ok(DateRange::new(
            Some(today - Duration::days(30)),
            Some(today),
        )),
        _ => Err(Error::InvalidData(format!(
            "Unknown period: {}. Available: all, this-month, last-month, this-year, last-year, last-30-days, custom",
            period
        ))),
    }
}
