use std::env;
use std::time::Duration;

use crate::error::{GenerationError, Result};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/generate-image";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub request_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `GENERATOR_ENDPOINT` and `GENERATOR_TIMEOUT_SECS`, keeping the
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let endpoint = env::var("GENERATOR_ENDPOINT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let timeout_secs = env::var("GENERATOR_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        GeneratorConfig {
            endpoint,
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(GenerationError::Config("endpoint is required".into()));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(GenerationError::Config(format!(
                "endpoint must be an http(s) URL, got {}",
                endpoint
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(GenerationError::Config("request timeout must be positive".into()));
        }
        Ok(())
    }
}
