//! REST API for the mixer
//!
//! Every mutating route is translated into an `Intent` and handed to the
//! service loop; reads return data produced by the loop as well.

pub mod handlers;
pub mod sse;

use crate::error::Error;
use crate::service::MixerHandle;
use ambimix_common::events::EventBus;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub mixer: MixerHandle,
    /// Bus the mixer's presenter publishes on
    pub events: EventBus,
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest(
            "/api/v1",
            Router::new()
                // Read-only views
                .route("/mix", get(handlers::get_mix))
                .route("/tracks", get(handlers::get_tracks))
                .route("/presets", get(handlers::get_presets))
                // Generic intent endpoint
                .route("/intent", post(handlers::post_intent))
                // Track and master controls
                .route("/tracks/:track_id/toggle", post(handlers::toggle_track))
                .route("/tracks/:track_id/volume", post(handlers::set_track_volume))
                .route("/master/volume", post(handlers::set_master_volume))
                .route("/playback/toggle", post(handlers::toggle_all))
                // Presets
                .route("/presets", post(handlers::save_preset))
                .route("/presets/:preset_id", delete(handlers::delete_preset))
                .route("/presets/:preset_id/apply", post(handlers::apply_preset))
                // Sleep timer
                .route("/timer", post(handlers::start_timer))
                .route("/timer", delete(handlers::stop_timer))
                .route("/reset", post(handlers::reset))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or out-of-range request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Mixer(#[from] Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Mixer(err) => match err {
                Error::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                Error::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_FAILED"),
                Error::Play(_) => (StatusCode::CONFLICT, "PLAYBACK_FAILED"),
                Error::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR"),
                Error::ServiceStopped => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_STOPPED"),
                Error::Load(_) | Error::Common(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
