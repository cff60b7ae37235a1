use utoipa::OpenApi;

use crate::controllers::prediction_controller;
use crate::models::{prediction, system};
use crate::services::metrics;

#[derive(OpenApi)]
#[openapi(
    paths(
        prediction_controller::get_system,
        prediction_controller::apply_config_command,
        prediction_controller::patch_location,
        prediction_controller::generate_prediction,
        prediction_controller::get_prediction
    ),
    components(
        schemas(
            system::SystemConfiguration,
            system::Location,
            system::LocationPatch,
            system::ConfigCommand,
            system::LossCategory,
            prediction::PredictionResult,
            metrics::DerivedMetrics,
            metrics::ChartSeries,
            prediction_controller::PredictionView,
            prediction_controller::SubmittedResponse
        )
    ),
    tags(
        (name = "heliotelligence", description = "PV energy prediction API")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds_with_all_schemas() {
        // Building the document runs schema() for every registered type,
        // including the hand-deserialized loss breakdown map.
        let doc = ApiDoc::openapi();
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("SystemConfiguration"));
        assert!(json.contains("PredictionResult"));
        assert!(json.contains("loss_breakdown_kwh"));
        assert!(json.contains("/api/predict"));
    }
}
