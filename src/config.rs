use serde::Deserialize;

fn default_predict_timeout_s() -> Option<u64> {
    Some(30)
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub predictor: PredictorConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PredictorConfig {
    /// Base URL of the external prediction service, e.g. "http://localhost:9000"
    pub base_url: String,
    /// Request timeout in seconds; `null` disables the default
    #[serde(default = "default_predict_timeout_s")]
    pub timeout_s: Option<u64>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }
}
