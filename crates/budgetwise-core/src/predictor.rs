//! Client for the external category prediction service
//!
//! The service is an HTTP collaborator that suggests a category for an
//! expense title, can be retrained on stored expenses, and learns from
//! manual category corrections. Endpoints:
//!
//! - `POST /api/predict-category` `{title, amount}` → `{category, confidence}`
//! - `POST /api/train-model` `{expenses: [{title, category, amount}]}` → `{message, accuracy, samples}`
//! - `POST /api/learn-preference` `{title, category, user_id}`
//! - `GET /health`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::PredictorConfig;
use crate::error::{Error, Result};
use crate::models::{CategoryPrediction, Expense, TrainingResult};

/// Environment variable holding the service base URL
pub const PREDICTOR_URL_ENV: &str = "BW_PREDICTOR_URL";

/// Environment variable overriding the request timeout
pub const PREDICTOR_TIMEOUT_ENV: &str = "BW_PREDICTOR_TIMEOUT_SECS";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// The service refuses to train on fewer samples than this
pub const MIN_TRAINING_SAMPLES: usize = 10;

/// Category prediction backend
#[async_trait]
pub trait CategoryPredictor: Send + Sync {
    /// Suggest a category for an expense title
    async fn predict(&self, title: &str, amount: Option<f64>) -> Result<CategoryPrediction>;

    /// Retrain on stored expenses. Needs at least `MIN_TRAINING_SAMPLES`.
    async fn train(&self, expenses: &[Expense]) -> Result<TrainingResult>;

    /// Report a manual title → category assignment
    async fn learn_preference(&self, title: &str, category: &str, user_id: &str) -> Result<()>;

    /// Whether the service answers
    async fn health_check(&self) -> bool;
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount: Option<f64>,
}

#[derive(Debug, Serialize)]
struct TrainingSample<'a> {
    title: &'a str,
    category: &'a str,
    amount: f64,
}

#[derive(Debug, Serialize)]
struct TrainRequest<'a> {
    expenses: Vec<TrainingSample<'a>>,
}

#[derive(Debug, Serialize)]
struct LearnRequest<'a> {
    title: &'a str,
    category: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for the prediction service
#[derive(Clone)]
pub struct HttpPredictor {
    http_client: Client,
    base_url: String,
}

impl HttpPredictor {
    /// Create a client with the given base URL and per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Build from config. `None` when no URL is configured.
    pub fn from_config(config: &PredictorConfig) -> Result<Option<Self>> {
        match config.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                Self::new(url, Duration::from_secs(config.timeout_secs)).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Build from `BW_PREDICTOR_URL` / `BW_PREDICTOR_TIMEOUT_SECS`
    pub fn from_env() -> Result<Option<Self>> {
        let config = PredictorConfig::default().with_env_overrides();
        Self::from_config(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Turn a non-2xx response into an error carrying the service's message
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("service returned {}", status),
        };
        if status.is_client_error() {
            Err(Error::InvalidData(message))
        } else {
            Err(Error::Predictor(message))
        }
    }
}

#[async_trait]
impl CategoryPredictor for HttpPredictor {
    async fn predict(&self, title: &str, amount: Option<f64>) -> Result<CategoryPrediction> {
        if title.trim().is_empty() {
            return Err(Error::InvalidData("Title is required".into()));
        }

        let response = self
            .http_client
            .post(format!("{}/api/predict-category", self.base_url))
            .json(&PredictRequest { title, amount })
            .send()
            .await?;
        let prediction: CategoryPrediction = Self::check(response).await?.json().await?;

        debug!(
            "Predicted '{}' for '{}' ({:.2})",
            prediction.category, title, prediction.confidence
        );
        Ok(prediction)
    }

    async fn train(&self, expenses: &[Expense]) -> Result<TrainingResult> {
        if expenses.len() < MIN_TRAINING_SAMPLES {
            return Err(Error::InvalidData(format!(
                "At least {} expenses required for training",
                MIN_TRAINING_SAMPLES
            )));
        }

        let request = TrainRequest {
            expenses: expenses
                .iter()
                .map(|e| TrainingSample {
                    title: &e.title,
                    category: &e.category,
                    amount: e.amount,
                })
                .collect(),
        };

        let response = self
            .http_client
            .post(format!("{}/api/train-model", self.base_url))
            .json(&request)
            .send()
            .await?;
        let result: TrainingResult = Self::check(response).await?.json().await?;

        debug!(
            "Predictor trained on {} samples (accuracy {:.2})",
            result.samples, result.accuracy
        );
        Ok(result)
    }

    async fn learn_preference(&self, title: &str, category: &str, user_id: &str) -> Result<()> {
        let response = self
            .http_client
            .post(format!("{}/api/learn-preference", self.base_url))
            .json(&LearnRequest {
                title,
                category,
                user_id,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("Predictor health check failed: {}", e);
                false
            }
        }
    }
}
