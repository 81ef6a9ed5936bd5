//! REST API Server for the history-backed chatbot
//!
//! A thin HTTP front end over one `ChatSession`. All handlers share a single
//! async mutex, and compaction keeps holding it after the reply is sent, so
//! the next request always sees the compacted history.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::conversational::ChatSession;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub query: String,
    /// Overrides the session model for this and later turns
    pub model: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    /// `None` when no API key was configured
    pub session: Option<Arc<Mutex<ChatSession>>>,
}

fn missing_key() -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiResponse::error(
            "OPENROUTER_API_KEY not found in environment or .env file".into(),
        )),
    )
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let Some(session) = state.session else {
        return missing_key();
    };

    let query = req.query.trim();
    if query.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Query must not be empty".into())),
        );
    }

    let mut guard = session.lock_owned().await;
    if let Some(model) = req.model.filter(|m| !m.trim().is_empty()) {
        guard.set_model(model);
    }

    info!("Received chat request ({} chars)", query.len());
    let reply = match guard.ask(query).await {
        Ok(reply) => reply,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Failed to save history: {}", e))),
            )
        }
    };

    if !reply.completed {
        return (StatusCode::BAD_GATEWAY, Json(ApiResponse::error(reply.text)));
    }

    let summarizing = reply.needs_summarization();
    let body = serde_json::json!({
        "response": reply.text,
        "model": guard.model(),
        "summarizing": summarizing,
    });

    if let Some(overflow) = reply.overflow {
        // The guard moves into the task; the next request waits for compaction.
        tokio::spawn(async move {
            match guard.compact(overflow).await {
                Ok(history) => info!("Summarization complete ({} turns)", history.len()),
                Err(e) => warn!("Failed to save compacted history: {}", e),
            }
        });
    }

    (StatusCode::OK, Json(ApiResponse::success(body)))
}

/// =============================
/// History Endpoints
/// =============================

async fn history_handler(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let Some(session) = state.session else {
        return missing_key();
    };

    let guard = session.lock().await;
    let history = guard.history();
    let usage = guard.usage();
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({
            "turns": history,
            "usage": usage.to_string(),
        }))),
    )
}

async fn clear_handler(State(state): State<ApiState>) -> (StatusCode, Json<ApiResponse>) {
    let Some(session) = state.session else {
        return missing_key();
    };

    let guard = session.lock().await;
    match guard.clear() {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({ "cleared": true }))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Failed to clear history: {}", e))),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(session: Option<ChatSession>) -> Router {
    let state = ApiState {
        session: session.map(|s| Arc::new(Mutex::new(s))),
    };

    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/history", get(history_handler).delete(clear_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    session: Option<ChatSession>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(session);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
