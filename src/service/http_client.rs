use crate::{
    config::GeneratorConfig,
    error::{GenerationError, Result},
    models::{EncodedRequest, GeneratedImage, ImageGenerationResponse},
    service::GenerationService,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};

#[derive(Clone)]
pub struct HttpGenerationService {
    client: Client,
    endpoint: String,
}

impl HttpGenerationService {
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim().to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Maps an endpoint reply to images or an error. Failure bodies are kept
/// verbatim; success bodies must match `{"images": [...]}`.
pub fn interpret_response(status: StatusCode, body: &str) -> Result<Vec<GeneratedImage>> {
    if !status.is_success() {
        log::warn!("Generation service returned {}", status);
        return Err(GenerationError::Service(body.to_string()));
    }
    ImageGenerationResponse::parse(body)
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate(&self, request: &EncodedRequest) -> Result<Vec<GeneratedImage>> {
        log::info!(
            "Requesting {} image from {} ({} reference images)",
            request.model(),
            self.endpoint,
            request.encoded_images().len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                log::error!("Generation request failed: {}", e);
                if e.is_timeout() {
                    GenerationError::Transport(format!("request timed out: {}", e))
                } else {
                    GenerationError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Transport(format!("failed to read response body: {}", e)))?;

        interpret_response(status, &body)
    }
}
