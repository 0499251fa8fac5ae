//! Test utilities for budgetwise-core
//!
//! Provides a mock category prediction service that speaks the same HTTP
//! protocol as the real one, for predictor and server tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

/// A preference reported to the mock service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LearnedPreference {
    pub title: String,
    pub category: String,
    pub user_id: String,
}

type Learned = Arc<Mutex<Vec<LearnedPreference>>>;

/// Mock prediction server bound to a random local port
pub struct MockPredictorServer {
    addr: SocketAddr,
    learned: Learned,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockPredictorServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        let learned: Learned = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route("/health", get(handle_health))
            .route("/api/predict-category", post(handle_predict))
            .route("/api/train-model", post(handle_train))
            .route("/api/learn-preference", post(handle_learn))
            .with_state(learned.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            learned,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Preferences received so far
    pub fn learned(&self) -> Vec<LearnedPreference> {
        self.learned.lock().unwrap().clone()
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockPredictorServer {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn handle_health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

/// Keyword guesses with fixed confidences
fn guess_category(title: &str) -> (&'static str, f64) {
    let t = title.to_lowercase();
    if t.contains("uber") || t.contains("taxi") || t.contains("bus") {
        ("Transport", 0.92)
    } else if t.contains("coffee") || t.contains("grocer") || t.contains("pizza") {
        ("Food", 0.88)
    } else if t.contains("netflix") || t.contains("cinema") {
        ("Entertainment", 0.9)
    } else if t.contains("rent") {
        ("Housing", 0.95)
    } else if t.contains("maybe") {
        ("Shopping", 0.4)
    } else {
        ("Other", 0.3)
    }
}

async fn handle_predict(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    let title = body.get("title").and_then(|t| t.as_str()).unwrap_or("");
    if title.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Title is required"})),
        );
    }
    let (category, confidence) = guess_category(title);
    (
        StatusCode::OK,
        Json(json!({"category": category, "confidence": confidence})),
    )
}

async fn handle_train(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    let samples = body
        .get("expenses")
        .and_then(|e| e.as_array())
        .map(|e| e.len())
        .unwrap_or(0);
    if samples < 10 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "At least 10 expenses required for training"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "message": "Model trained successfully",
            "accuracy": 0.85,
            "samples": samples,
        })),
    )
}

async fn handle_learn(
    State(learned): State<Learned>,
    Json(preference): Json<LearnedPreference>,
) -> impl IntoResponse {
    learned.lock().unwrap().push(preference);
    Json(json!({"status": "learned"}))
}
