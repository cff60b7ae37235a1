use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::prediction::PredictionResult;
use crate::models::system::{ConfigCommand, Location, LocationPatch, SystemConfiguration};
use crate::services::metrics::{self, ChartSeries, DerivedMetrics};
use crate::services::prediction_service::Predictor;
use crate::shared_state::{AppState, PredictionState};

// ─── Prediction view ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Idle,
    Pending,
    Success,
    Failure,
}

/// Everything the dashboard needs in one poll: lifecycle status plus, on
/// success, the raw result, the derived metrics and the chart-ready series.
/// Metrics and series are recomputed from the stored result on every read.
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictionView {
    pub timestamp: DateTime<Utc>,
    pub status: PredictionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<PredictionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DerivedMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_series: Option<ChartSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_series: Option<ChartSeries>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionView {
    pub fn from_state(state: PredictionState) -> Self {
        let mut view = PredictionView {
            timestamp: Utc::now(),
            status: PredictionStatus::Idle,
            sequence: None,
            result: None,
            metrics: None,
            monthly_series: None,
            loss_series: None,
            error: None,
        };
        match state {
            PredictionState::Idle => {}
            PredictionState::Pending { seq } => {
                view.status = PredictionStatus::Pending;
                view.sequence = Some(seq);
            }
            PredictionState::Success { seq, result } => {
                view.status = PredictionStatus::Success;
                view.sequence = Some(seq);
                view.metrics = Some(DerivedMetrics::from_result(&result));
                view.monthly_series = Some(metrics::monthly_series(&result.monthly_energy_kwh));
                view.loss_series = Some(metrics::loss_series(&result.loss_breakdown_kwh));
                view.result = Some(result);
            }
            PredictionState::Failure { seq, message } => {
                view.status = PredictionStatus::Failure;
                view.sequence = Some(seq);
                view.error = Some(message);
            }
        }
        view
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmittedResponse {
    /// Sequence number of this submission; `GET /api/prediction` reports the
    /// same number once resolved
    pub sequence: u64,
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// GET /api/system
/// Get the current system configuration
///
/// Returns the full installation description (location, array geometry, module/inverter specs, loss percentages) as it will be sent to the prediction service.
#[utoipa::path(
    get,
    path = "/api/system",
    responses(
        (status = 200, description = "Current system configuration", body = SystemConfiguration)
    )
)]
pub async fn get_system(State(app): State<AppState>) -> impl IntoResponse {
    Json(app.system_snapshot()).into_response()
}

/// POST /api/system/command
/// Apply a configuration edit
///
/// Applies one edit command to the session configuration and returns the updated configuration.
/// Raw values that fail to parse as numbers are stored as 0 — an edit never fails and never
/// touches sibling fields. Range hints (tilt 0–90° etc.) are advisory; out-of-range values are
/// accepted and left for the prediction service to judge.
#[utoipa::path(
    post,
    path = "/api/system/command",
    request_body = ConfigCommand,
    responses(
        (status = 200, description = "Updated system configuration", body = SystemConfiguration),
        (status = 422, description = "Unknown command or field")
    )
)]
pub async fn apply_config_command(
    State(app): State<AppState>,
    Json(command): Json<ConfigCommand>,
) -> impl IntoResponse {
    Json(app.apply_command(&command)).into_response()
}

/// POST /api/system/location
/// Merge a partial location update
///
/// Used by the map picker: any subset of latitude/longitude/altitude; unspecified fields
/// keep their current value. Returns the merged location.
#[utoipa::path(
    post,
    path = "/api/system/location",
    request_body = LocationPatch,
    responses(
        (status = 200, description = "Merged location", body = Location)
    )
)]
pub async fn patch_location(
    State(app): State<AppState>,
    Json(patch): Json<LocationPatch>,
) -> impl IntoResponse {
    let updated = app.apply_command(&ConfigCommand::PatchLocation { patch });
    Json(updated.location).into_response()
}

/// POST /api/predict
/// Submit the configuration for prediction
///
/// Snapshots the current configuration, enters the Pending state with a fresh sequence number
/// and calls the external prediction service in the background. A new submission supersedes any
/// outstanding one: the older call keeps running but its resolution is discarded.
/// Poll GET /api/prediction for the outcome.
#[utoipa::path(
    post,
    path = "/api/predict",
    responses(
        (status = 202, description = "Prediction started", body = SubmittedResponse)
    )
)]
pub async fn generate_prediction(
    State(app): State<AppState>,
    State(predictor): State<Arc<Predictor>>,
) -> impl IntoResponse {
    let seq = app.begin_prediction();
    let config = app.system_snapshot();
    let worker_app = app.clone();

    tokio::spawn(async move {
        let outcome = match predictor.predict(&config).await {
            Ok(result) => {
                println!(
                    "[PREDICT] seq {} resolved: {:.1} kWh/year",
                    seq, result.annual_energy_kwh
                );
                Ok(result)
            }
            Err(e) => {
                eprintln!("[PREDICT] seq {} failed: {}", seq, e);
                Err(e.user_message())
            }
        };
        worker_app.resolve_prediction(seq, outcome);
    });

    (StatusCode::ACCEPTED, Json(SubmittedResponse { sequence: seq })).into_response()
}

/// GET /api/prediction
/// Get the current prediction state
///
/// Returns the request lifecycle status (idle/pending/success/failure) and, on success, the raw
/// forecast plus derived metrics (total losses, system efficiency, peak month) and chart-ready
/// monthly/loss series. On failure, a human-readable error message.
#[utoipa::path(
    get,
    path = "/api/prediction",
    responses(
        (status = 200, description = "Current prediction state and derived metrics", body = PredictionView)
    )
)]
pub async fn get_prediction(State(app): State<AppState>) -> impl IntoResponse {
    Json(PredictionView::from_state(app.prediction_state())).into_response()
}
