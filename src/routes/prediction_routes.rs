use axum::{
    routing::{get, post},
    Router,
};

use crate::controllers::prediction_controller::{
    apply_config_command, generate_prediction, get_prediction, get_system, patch_location,
};
use crate::shared_state::SharedState;

/// Build the `/api/*` sub-router.
/// Handlers extract `State<AppState>` and/or `State<Arc<Predictor>>` via
/// `FromRef<SharedState>` — a single `.with_state(shared)` covers both.
pub fn api_routes(shared: SharedState) -> Router {
    Router::new()
        .route("/system", get(get_system))
        .route("/system/command", post(apply_config_command))
        .route("/system/location", post(patch_location))
        .route("/predict", post(generate_prediction))
        .route("/prediction", get(get_prediction))
        .with_state(shared)
}
