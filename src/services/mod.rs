pub mod metrics;
pub mod prediction_service;
