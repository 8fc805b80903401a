//! REST endpoints — health, spam classification, and response generation.
//!
//! Thin I/O layer: request-field validation happens here (missing fields are
//! the caller's fault, rejected with 400 before any collaborator runs), and
//! every handler returns a well-formed JSON envelope — pipeline failures
//! surface as `success: false` with an error string, never as a bare 500.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Json;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::pipeline::Pipeline;
use crate::spam::SpamClassifier;

/// Fixed email used by the `/test` endpoint.
const SAMPLE_EMAIL: &str = "I would like to return my laptop that I purchased last week. \
     It has a screen issue.";

/// Shared state for the service routes.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Absent when the spam model failed to load — classification endpoints
    /// then report 500, and `/generate-response` skips the gate.
    pub spam: Option<Arc<dyn SpamClassifier>>,
}

/// Build the service routes. CORS is permissive — the browser extension
/// calls these endpoints cross-origin.
pub fn service_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/classify-email", post(classify_email))
        .route("/predict", post(classify_email))
        .route("/generate-response", post(generate_response))
        .route("/test", get(test_pipeline))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Pull the email text out of a request body, accepting either field name.
fn extract_email(body: &Value) -> Option<&str> {
    body.get("email")
        .or_else(|| body.get("text"))
        .and_then(Value::as_str)
}

fn missing_field_response() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Missing 'email' in request body"})),
    )
}

/// GET /health
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "spam_classifier": state.spam.is_some(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /classify-email (alias: /predict)
///
/// Body: `{"email": "..."}` (or `{"text": "..."}`). Returns the spam
/// verdict; 400 on a missing field, 500 when the classifier is unavailable.
async fn classify_email(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let Some(email) = extract_email(&body) else {
        return missing_field_response();
    };

    let Some(classifier) = &state.spam else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Spam classifier not initialized"})),
        );
    };

    let verdict = classifier.classify(email);
    (
        StatusCode::OK,
        Json(serde_json::to_value(verdict).unwrap_or(Value::Null)),
    )
}

/// POST /generate-response
///
/// Body: `{"email": "..."}`. Spam is gated out before the pipeline runs;
/// otherwise the pipeline result is wrapped into the response envelope.
async fn generate_response(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let Some(email) = extract_email(&body) else {
        return missing_field_response();
    };

    // Step 1: spam gate.
    let spam_confidence = match &state.spam {
        Some(classifier) => {
            let verdict = classifier.classify(email);
            if verdict.is_spam() {
                info!(
                    spam_probability = verdict.spam_probability,
                    "Email classified as spam — skipping response generation"
                );
                return (
                    StatusCode::OK,
                    Json(json!({
                        "is_spam": true,
                        "spam_confidence": verdict.confidence,
                        "response": Value::Null,
                        "message": "Email classified as spam. No response generated.",
                        "success": true,
                    })),
                );
            }
            1.0 - verdict.spam_probability
        }
        None => 0.5,
    };

    // Step 2: run the pipeline.
    let result = state.pipeline.run(email).await;

    if !result.success {
        let error = result
            .error
            .unwrap_or_else(|| "Unknown error during response generation".to_string());
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "is_spam": false,
                "spam_confidence": spam_confidence,
                "response": Value::Null,
                "success": false,
                "error": error,
            })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "is_spam": false,
            "spam_confidence": spam_confidence,
            "response": result.response_text,
            "classification": result.classification,
            "validation": result.validation,
            "success": true,
        })),
    )
}

/// GET /test
///
/// Runs the pipeline on a fixed sample email. Useful as a smoke check that
/// the generator and store are wired up.
async fn test_pipeline(State(state): State<AppState>) -> impl IntoResponse {
    let result = state.pipeline.run(SAMPLE_EMAIL).await;
    Json(json!({
        "test_email": SAMPLE_EMAIL,
        "result": result,
    }))
}
