// src/http.rs

//! HTTP boundary: a thin axum router over [`RunCoordinator`].

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, info};

use crate::engine::RunCoordinator;
use crate::errors::RunError;
use crate::event::encode;
use crate::types::{RunRequest, RunState};

/// HTTP API service builder.
#[derive(Debug, Clone)]
pub struct HttpApi {
    coordinator: RunCoordinator,
    cors_origins: Vec<HeaderValue>,
}

impl HttpApi {
    pub fn new(coordinator: RunCoordinator) -> Self {
        Self {
            coordinator,
            cors_origins: Vec::new(),
        }
    }

    /// Allow browser clients served from `origins`. No CORS layer is added
    /// when the list is empty.
    pub fn with_cors_origins(mut self, origins: Vec<HeaderValue>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - GET /health - Liveness plus current run state
    /// - POST /run - Start a task and stream its events (text/event-stream)
    /// - POST /stop - Interrupt the running task
    pub fn router(self) -> Router {
        let router = Router::new()
            .route("/health", get(health))
            .route("/run", post(run_task))
            .route("/stop", post(stop_task))
            .with_state(self.coordinator);

        if self.cors_origins.is_empty() {
            router
        } else {
            router.layer(cors_layer(self.cors_origins))
        }
    }
}

fn cors_layer(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub run: RunState,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub stopped: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// `RunError` rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(RunError);

impl From<RunError> for ApiError {
    fn from(err: RunError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            RunError::InvalidArgument => StatusCode::BAD_REQUEST,
            RunError::AlreadyRunning => StatusCode::CONFLICT,
            RunError::SpawnFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorResponse {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health(State(coordinator): State<RunCoordinator>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        run: coordinator.state(),
    })
}

/// POST /run
///
/// Each event is written as its own body chunk so the client sees it as soon
/// as the process prints it.
async fn run_task(
    State(coordinator): State<RunCoordinator>,
    Json(req): Json<RunRequest>,
) -> Result<Response, ApiError> {
    debug!(credentials = req.credentials.len(), "run requested");
    let stream = coordinator.start(&req)?;
    info!(run_id = stream.run_id(), "streaming run to client");

    let frames = stream.map(|event| Ok::<_, Infallible>(encode(&event)));
    let headers = [
        (header::CONTENT_TYPE, "text/event-stream"),
        (header::CACHE_CONTROL, "no-cache"),
    ];

    Ok((headers, Body::from_stream(frames)).into_response())
}

/// POST /stop
async fn stop_task(State(coordinator): State<RunCoordinator>) -> Json<StopResponse> {
    let outcome = coordinator.stop().await;
    Json(StopResponse {
        stopped: outcome.stopped(),
    })
}
