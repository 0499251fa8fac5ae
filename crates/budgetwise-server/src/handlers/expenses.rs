//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{preference_user_id, AppError, AppState, CurrentUser};
use budgetwise_core::aggregate::{aggregate, coerce_amount};
use budgetwise_core::dates::{normalize_date, parse_bound};
use budgetwise_core::models::{DateRange, Expense, ExpenseUpdate, Granularity, NewExpense};

/// Query parameters for listing expenses
#[derive(Debug, Deserialize)]
pub struct ExpenseQuery {
    /// Start date (invalid values are ignored)
    pub from: Option<String>,
    /// End date (invalid values are ignored)
    pub to: Option<String>,
    /// daily, weekly, monthly or yearly
    #[serde(rename = "groupBy")]
    pub group_by: Option<String>,
}

/// One bucket of a grouped listing
#[derive(Debug, Serialize)]
pub struct PeriodTotal {
    pub period: String,
    pub total: f64,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ExpenseListResponse {
    Expenses(Vec<Expense>),
    Grouped(Vec<PeriodTotal>),
}

/// Body for creating an expense
///
/// `amount` may be a number or a numeric string; the date may be any format
/// the normalizer understands.
#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    pub title: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub category: Option<String>,
    #[serde(alias = "occurred_at", alias = "createdAt")]
    pub date: Option<String>,
}

/// Body for a partial update. Empty title/category strings are ignored.
#[derive(Debug, Deserialize)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub category: Option<String>,
    #[serde(alias = "occurred_at", alias = "createdAt")]
    pub date: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse an amount from JSON. Anything that doesn't coerce to a finite
/// number is rejected; the value check happens in validation.
fn parse_amount(value: &serde_json::Value) -> Result<f64, AppError> {
    let is_numeric = match value {
        serde_json::Value::Number(_) => true,
        serde_json::Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    };
    if !is_numeric {
        return Err(AppError::bad_request("Invalid amount"));
    }
    Ok(coerce_amount(value))
}

/// GET /api/expenses - List expenses, optionally grouped into time buckets
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(params): Query<ExpenseQuery>,
) -> Result<Json<ExpenseListResponse>, AppError> {
    let range = DateRange::new(
        parse_bound(params.from.as_deref()),
        parse_bound(params.to.as_deref()),
    );

    let granularity = params
        .group_by
        .as_deref()
        .filter(|g| !g.is_empty())
        .map(|g| g.parse::<Granularity>())
        .transpose()
        .map_err(|e| AppError::bad_request(&e))?;

    let expenses = state.db.list_expenses(&range)?;

    state.db.log_audit(
        &user,
        "list",
        Some("expense"),
        None,
        Some(&format!(
            "from={:?}, to={:?}, groupBy={:?}",
            range.from, range.to, granularity
        )),
    )?;

    let response = match granularity {
        Some(granularity) => ExpenseListResponse::Grouped(
            aggregate(&expenses, granularity)
                .into_iter()
                .map(|(period, total)| PeriodTotal { period, total })
                .collect(),
        ),
        None => ExpenseListResponse::Expenses(expenses),
    };

    Ok(Json(response))
}

/// POST /api/expenses - Create an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    let title = non_empty(body.title);
    let category = non_empty(body.category);
    let amount = body.amount.filter(|a| !a.is_null());

    let (Some(title), Some(amount), Some(category)) = (title, amount, category) else {
        return Err(AppError::bad_request(
            "Title, amount, and category are required",
        ));
    };

    let new_expense = NewExpense {
        title,
        amount: parse_amount(&amount)?,
        category,
        occurred_at: normalize_date(body.date.as_deref()),
    };

    let expense = state
        .db
        .insert_expense(&new_expense)
        .map_err(AppError::from_core)?;

    state
        .db
        .log_audit(&user, "create", Some("expense"), Some(expense.id), None)?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /api/expenses/:id - Get a single expense
pub async fn get_expense(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<Expense>, AppError> {
    let expense = state
        .db
        .get_expense(id)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    state
        .db
        .log_audit(&user, "view", Some("expense"), Some(id), None)?;

    Ok(Json(expense))
}

/// PUT /api/expenses/:id - Partially update an expense
///
/// When both title and category are supplied, the pair is reported to the
/// category predictor. That call is best effort; failures are only logged.
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, AppError> {
    let amount = body
        .amount
        .as_ref()
        .filter(|a| !a.is_null())
        .map(parse_amount)
        .transpose()?;

    let update = ExpenseUpdate {
        title: non_empty(body.title),
        amount,
        category: non_empty(body.category),
        occurred_at: body
            .date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| normalize_date(Some(d))),
    };

    let expense = state
        .db
        .update_expense(id, &update)
        .map_err(AppError::from_core)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    state.db.log_audit(
        &user,
        "update",
        Some("expense"),
        Some(id),
        Some(&format!(
            "title={}, amount={}, category={}, date={}",
            update.title.is_some(),
            update.amount.is_some(),
            update.category.is_some(),
            update.occurred_at.is_some()
        )),
    )?;

    if let (Some(title), Some(category), Some(predictor)) =
        (&update.title, &update.category, &state.predictor)
    {
        let preference_user = preference_user_id(&headers);
        match predictor
            .learn_preference(title, category, &preference_user)
            .await
        {
            Ok(()) => debug!("Predictor learned '{}' -> '{}'", title, category),
            Err(e) => warn!("Predictor preference learning skipped: {}", e),
        }
    }

    Ok(Json(expense))
}

/// DELETE /api/expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.db.delete_expense(id)? {
        return Err(AppError::not_found("Expense not found"));
    }

    state
        .db
        .log_audit(&user, "delete", Some("expense"), Some(id), None)?;

    Ok(Json(MessageResponse {
        message: "Expense deleted".to_string(),
    }))
}
