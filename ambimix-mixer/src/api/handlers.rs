//! HTTP request handlers

use super::{ApiError, ApiResult, AppState};
use crate::controller::{Intent, IntentOutcome, MixSnapshot, PresetEntry};
use ambimix_common::events::TrackInfo;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    volume: u8, // 0-100 user-facing scale
}

#[derive(Debug, Deserialize)]
pub struct SavePresetRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct TimerRequest {
    minutes: i64,
}

#[derive(Debug, Deserialize)]
pub struct ApplyPresetQuery {
    #[serde(default)]
    custom: bool,
}

// ============================================================================
// Health and views
// ============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "ambimix-mixer",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
    }))
}

/// GET /api/v1/mix - current mix, timer and aggregate play state
pub async fn get_mix(State(state): State<AppState>) -> ApiResult<Json<MixSnapshot>> {
    Ok(Json(state.mixer.snapshot().await?))
}

/// GET /api/v1/tracks
pub async fn get_tracks(State(state): State<AppState>) -> ApiResult<Json<Vec<TrackInfo>>> {
    Ok(Json(state.mixer.tracks().await?))
}

/// GET /api/v1/presets - built-in presets first, then custom ones
pub async fn get_presets(State(state): State<AppState>) -> ApiResult<Json<Vec<PresetEntry>>> {
    Ok(Json(state.mixer.presets().await?))
}

// ============================================================================
// Intents
// ============================================================================

/// POST /api/v1/intent - submit any intent as tagged JSON
pub async fn post_intent(
    State(state): State<AppState>,
    payload: Result<Json<Intent>, JsonRejection>,
) -> ApiResult<Json<IntentOutcome>> {
    let Json(intent) = payload?;
    dispatch(&state, intent).await
}

/// POST /api/v1/tracks/:track_id/toggle
pub async fn toggle_track(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
) -> ApiResult<Json<IntentOutcome>> {
    dispatch(&state, Intent::ToggleTrack { track_id }).await
}

/// POST /api/v1/tracks/:track_id/volume
pub async fn set_track_volume(
    State(state): State<AppState>,
    Path(track_id): Path<String>,
    payload: Result<Json<VolumeRequest>, JsonRejection>,
) -> ApiResult<Json<IntentOutcome>> {
    let Json(req) = payload?;
    dispatch(
        &state,
        Intent::SetTrackVolume {
            track_id,
            volume: req.volume,
        },
    )
    .await
}

/// POST /api/v1/master/volume
pub async fn set_master_volume(
    State(state): State<AppState>,
    payload: Result<Json<VolumeRequest>, JsonRejection>,
) -> ApiResult<Json<IntentOutcome>> {
    let Json(req) = payload?;
    dispatch(&state, Intent::SetMasterVolume { volume: req.volume }).await
}

/// POST /api/v1/playback/toggle - main play/pause button
pub async fn toggle_all(State(state): State<AppState>) -> ApiResult<Json<IntentOutcome>> {
    dispatch(&state, Intent::ToggleAll).await
}

/// POST /api/v1/presets/:preset_id/apply[?custom=true]
pub async fn apply_preset(
    State(state): State<AppState>,
    Path(preset_id): Path<String>,
    Query(query): Query<ApplyPresetQuery>,
) -> ApiResult<Json<IntentOutcome>> {
    dispatch(
        &state,
        Intent::ApplyPreset {
            preset_id,
            custom: query.custom,
        },
    )
    .await
}

/// POST /api/v1/presets - save the current mix as a custom preset
pub async fn save_preset(
    State(state): State<AppState>,
    payload: Result<Json<SavePresetRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IntentOutcome>)> {
    let Json(req) = payload?;
    let Json(outcome) = dispatch(&state, Intent::SavePreset { name: req.name }).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// DELETE /api/v1/presets/:preset_id
pub async fn delete_preset(
    State(state): State<AppState>,
    Path(preset_id): Path<String>,
) -> ApiResult<Json<IntentOutcome>> {
    dispatch(&state, Intent::DeletePreset { preset_id }).await
}

/// POST /api/v1/timer
pub async fn start_timer(
    State(state): State<AppState>,
    payload: Result<Json<TimerRequest>, JsonRejection>,
) -> ApiResult<Json<IntentOutcome>> {
    let Json(req) = payload?;
    dispatch(&state, Intent::StartTimer { minutes: req.minutes }).await
}

/// DELETE /api/v1/timer
pub async fn stop_timer(State(state): State<AppState>) -> ApiResult<Json<IntentOutcome>> {
    dispatch(&state, Intent::StopTimer).await
}

/// POST /api/v1/reset
pub async fn reset(State(state): State<AppState>) -> ApiResult<Json<IntentOutcome>> {
    dispatch(&state, Intent::Reset).await
}

async fn dispatch(state: &AppState, intent: Intent) -> ApiResult<Json<IntentOutcome>> {
    if let Some(volume) = intent.volume() {
        if volume > 100 {
            return Err(ApiError::BadRequest(format!(
                "volume must be 0-100, got {}",
                volume
            )));
        }
    }

    info!("API intent: {:?}", intent);
    Ok(Json(state.mixer.dispatch(intent).await?))
}
