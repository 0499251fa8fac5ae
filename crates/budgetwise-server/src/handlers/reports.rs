//! Report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{AppError, AppState, CurrentUser};
use budgetwise_core::models::{Granularity, SpendingSummary, TrendsReport};
use budgetwise_core::reports;

/// Query parameters for reports
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// all, this-month, last-month, this-year, last-year, last-30-days or custom
    #[serde(default = "default_period")]
    pub period: String,
    /// Custom start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// Custom end date (YYYY-MM-DD)
    pub to: Option<String>,
}

fn default_period() -> String {
    "all".to_string()
}

/// Query parameters for the trends report
#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    #[serde(default = "default_granularity")]
    pub granularity: String,
    #[serde(default = "default_period")]
    pub period: String,
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default)]
    pub exclude_outliers: bool,
}

fn default_granularity() -> String {
    "monthly".to_string()
}

/// GET /api/reports/trends - Spending per time bucket with outlier analysis
pub async fn get_trends(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<TrendsQuery>,
) -> Result<Json<TrendsReport>, AppError> {
    let granularity: Granularity = params
        .granularity
        .parse()
        .map_err(|e: String| AppError::bad_request(&e))?;

    let report = reports::trends_report(
        &state.db,
        granularity,
        &params.period,
        params.from.as_deref(),
        params.to.as_deref(),
        params.exclude_outliers,
        Utc::now().date_naive(),
    )
    .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user,
        "report",
        Some("trends"),
        None,
        Some(&format!(
            "period={}, granularity={}, exclude_outliers={}",
            params.period, granularity, params.exclude_outliers
        )),
    )?;

    Ok(Json(report))
}

/// GET /api/reports/summary - Total spending for a period
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ReportQuery>,
) -> Result<Json<SpendingSummary>, AppError> {
    let summary = reports::spending_summary(
        &state.db,
        &params.period,
        params.from.as_deref(),
        params.to.as_deref(),
        Utc::now().date_naive(),
    )
    .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user,
        "report",
        Some("summary"),
        None,
        Some(&format!("period={}", params.period)),
    )?;

    Ok(Json(summary))
}
