//! Category prediction service commands

use anyhow::{Context, Result};
use budgetwise_core::db::Database;
use budgetwise_core::models::{CategoryPrediction, DateRange, TrainingResult};
use budgetwise_core::predictor::MIN_TRAINING_SAMPLES;
use budgetwise_core::CategoryPredictor;

pub async fn cmd_predict(
    predictor: &dyn CategoryPredictor,
    title: &str,
    amount: Option<f64>,
    min_confidence: f64,
) -> Result<()> {
    let prediction = predict(predictor, title, amount).await?;

    if prediction.confidence >= min_confidence {
        println!(
            "🤖 {} → {} ({:.0}% confident)",
            title,
            prediction.category,
            prediction.confidence * 100.0
        );
    } else {
        println!(
            "🤷 No confident suggestion for {} (best guess {} at {:.0}%)",
            title,
            prediction.category,
            prediction.confidence * 100.0
        );
    }
    Ok(())
}

pub async fn predict(
    predictor: &dyn CategoryPredictor,
    title: &str,
    amount: Option<f64>,
) -> Result<CategoryPrediction> {
    predictor
        .predict(title, amount)
        .await
        .context("Category prediction failed")
}

pub async fn cmd_train(db: &Database, predictor: &dyn CategoryPredictor) -> Result<()> {
    let result = train(db, predictor).await?;
    println!(
        "✅ {} ({} samples, accuracy {:.1}%)",
        if result.message.is_empty() {
            "Model trained"
        } else {
            result.message.as_str()
        },
        result.samples,
        result.accuracy * 100.0
    );
    Ok(())
}

/// Send every stored expense to the predictor for retraining
pub async fn train(db: &Database, predictor: &dyn CategoryPredictor) -> Result<TrainingResult> {
    let expenses = db.list_expenses(&DateRange::all())?;
    if expenses.len() < MIN_TRAINING_SAMPLES {
        anyhow::bail!(
            "At least {} expenses required for training (have {})",
            MIN_TRAINING_SAMPLES,
            expenses.len()
        );
    }

    println!("🧠 Training on {} expenses...", expenses.len());
    predictor
        .train(&expenses)
        .await
        .context("Model training failed")
}

pub async fn cmd_predictor_health(predictor: &dyn CategoryPredictor) -> Result<()> {
    if predictor.health_check().await {
        println!("✅ Category predictor is healthy");
        Ok(())
    } else {
        anyhow::bail!("Category predictor is not responding")
    }
}
