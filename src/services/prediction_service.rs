use std::fmt;
use std::time::Duration;

use reqwest::Client;

use crate::config::PredictorConfig;
use crate::models::prediction::{PredictionResult, ServiceErrorBody};
use crate::models::system::SystemConfiguration;

/// Fallback shown when the service gives no structured error.
pub const GENERIC_FAILURE: &str = "Failed to generate prediction";

#[derive(Debug)]
pub enum PredictError {
    /// The service answered non-2xx with a structured `{ "error": ... }` body
    Service(String),
    /// The request never completed (connect, timeout, non-2xx without a body)
    Transport(String),
    /// The service answered 2xx but the body was not a prediction result
    Decode(String),
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PredictError::Service(e) => write!(f, "PredictError::Service: {}", e),
            PredictError::Transport(e) => write!(f, "PredictError::Transport: {}", e),
            PredictError::Decode(e) => write!(f, "PredictError::Decode: {}", e),
        }
    }
}

impl From<reqwest::Error> for PredictError {
    fn from(e: reqwest::Error) -> PredictError {
        if e.is_decode() {
            PredictError::Decode(e.to_string())
        } else {
            PredictError::Transport(e.to_string())
        }
    }
}

impl PredictError {
    /// Human-readable message for the `Failure` state: the service's own
    /// error text when it sent one, the generic fallback otherwise.
    pub fn user_message(&self) -> String {
        match self {
            PredictError::Service(message) => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

/// HTTP client for the external prediction engine.
pub struct Predictor {
    base_url: String,
    client: Client,
}

impl Predictor {
    pub fn new(config: &PredictorConfig) -> Result<Self, PredictError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_s.unwrap_or(30)))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Submit a system configuration and wait for the forecast.
    ///
    /// The configuration serializes directly as the request body — its field
    /// names are the wire contract.
    pub async fn predict(
        &self,
        config: &SystemConfiguration,
    ) -> Result<PredictionResult, PredictError> {
        let url = format!("{}/api/v1/predict", self.base_url);

        let response = self.client.post(&url).json(config).send().await?;
        let status = response.status();

        if !status.is_success() {
            // Prefer the service's own error text over the HTTP status.
            if let Ok(ServiceErrorBody { error: Some(text) }) =
                response.json::<ServiceErrorBody>().await
            {
                return Err(PredictError::Service(text));
            }
            return Err(PredictError::Transport(format!(
                "prediction service returned {}",
                status
            )));
        }

        let result = response.json::<PredictionResult>().await?;
        Ok(result)
    }
}
