//! Category prediction handlers
//!
//! Thin proxies to the external prediction service.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use crate::{AppError, AppState, CurrentUser};
use budgetwise_core::models::{CategoryPrediction, DateRange, TrainingResult};
use budgetwise_core::predictor::{CategoryPredictor, MIN_TRAINING_SAMPLES};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub title: Option<String>,
    pub amount: Option<f64>,
}

fn predictor(state: &AppState) -> Result<&Arc<dyn CategoryPredictor>, AppError> {
    state
        .predictor
        .as_ref()
        .ok_or_else(|| AppError::unavailable("Category predictor not configured"))
}

/// POST /api/predict-category - Suggest a category for a title
pub async fn predict_category(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<PredictRequest>,
) -> Result<Json<CategoryPrediction>, AppError> {
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Title is required"))?;

    let prediction = predictor(&state)?
        .predict(title, body.amount)
        .await
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user,
        "predict",
        Some("category"),
        None,
        Some(&format!(
            "category={}, confidence={:.2}",
            prediction.category, prediction.confidence
        )),
    )?;

    Ok(Json(prediction))
}

/// POST /api/train-model - Retrain the predictor on every stored expense
pub async fn train_model(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<TrainingResult>, AppError> {
    let predictor = predictor(&state)?;

    let expenses = state.db.list_expenses(&DateRange::all())?;
    if expenses.len() < MIN_TRAINING_SAMPLES {
        return Err(AppError::bad_request(&format!(
            "At least {} expenses required for training",
            MIN_TRAINING_SAMPLES
        )));
    }

    let result = predictor
        .train(&expenses)
        .await
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &user,
        "train",
        Some("predictor"),
        None,
        Some(&format!(
            "samples={}, accuracy={:.3}",
            result.samples, result.accuracy
        )),
    )?;

    Ok(Json(result))
}
