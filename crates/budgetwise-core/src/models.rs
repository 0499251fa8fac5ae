//! Domain models for BudgetWise

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ========== Expenses ==========

/// A stored expense record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub title: String,
    pub amount: f64,
    /// Free-form category tag
    pub category: String,
    /// When the money was spent (what reports bucket on)
    pub occurred_at: DateTime<Utc>,
    /// When the record was written to the store
    pub created_at: DateTime<Utc>,
}

/// A new expense to insert (id and created_at are assigned by the store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub amount: f64,
    pub category: String,
    pub occurred_at: DateTime<Utc>,
}

impl NewExpense {
    /// Check the invariants the store relies on: non-empty title and
    /// category, and a finite positive amount
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::Error::InvalidData("Title is required".into()));
        }
        if self.category.trim().is_empty() {
            return Err(crate::Error::InvalidData("Category is required".into()));
        }
        validate_amount(self.amount)
    }
}

/// Field-by-field changes to an expense. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseUpdate {
    pub title: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl ExpenseUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.occurred_at.is_none()
    }

    pub fn validate(&self) -> crate::Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(crate::Error::InvalidData("Title cannot be empty".into()));
            }
        }
        if let Some(category) = &self.category {
            if category.trim().is_empty() {
                return Err(crate::Error::InvalidData("Category cannot be empty".into()));
            }
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        Ok(())
    }
}

fn validate_amount(amount: f64) -> crate::Result<()> {
    if !amount.is_finite() {
        return Err(crate::Error::InvalidData("Invalid amount".into()));
    }
    if amount <= 0.0 {
        return Err(crate::Error::InvalidData(
            "Amount must be greater than zero".into(),
        ));
    }
    Ok(())
}

/// Inclusive date bounds for listing expenses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether a timestamp falls on or between the bounding days
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from.map_or(true, |from| day >= from) && self.to.map_or(true, |to| day <= to)
    }
}

// ========== Report Models ==========

/// Report time granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            _ => Err(format!(
                "Unknown granularity: {} (valid: daily, weekly, monthly, yearly)",
                s
            )),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outlier analysis over a series of aggregated totals
///
/// Bounds are `None` when the series is too short to say anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub outlier_values: Vec<f64>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub has_outliers: bool,
}

/// Report period info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl From<DateRange> for ReportPeriod {
    fn from(range: DateRange) -> Self {
        Self {
            from: range.from.map(|d| d.to_string()),
            to: range.to.map(|d| d.to_string()),
        }
    }
}

/// One bucket of a spending trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// Bucket key (`2025-01`, `2025-W03`, ...)
    pub period: String,
    /// Display label (`Jan 2025`, `Week 3, 2025`, ...)
    pub label: String,
    pub total: f64,
}

/// Spending trends over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendsReport {
    pub granularity: Granularity,
    pub period: ReportPeriod,
    pub data: Vec<TrendPoint>,
    pub outliers: OutlierReport,
    /// True when outlier buckets were removed from `data`
    pub outliers_excluded: bool,
    /// Sum of every bucket, including excluded outliers
    pub total: f64,
}

/// Total spending for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    pub period: ReportPeriod,
    pub total: f64,
    pub expense_count: i64,
}

// ========== Users ==========

/// A registered user. The password hash never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user as shown to API clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
        }
    }
}

/// Successful signup or login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: PublicUser,
    /// Bearer token for subsequent requests
    pub token: String,
}

// ========== Category Prediction ==========

/// A category suggested by the prediction service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub category: String,
    pub confidence: f64,
}

/// Result of training the prediction model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    #[serde(default)]
    pub message: String,
    pub accuracy: f64,
    pub samples: i64,
}
