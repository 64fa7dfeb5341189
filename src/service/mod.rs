pub mod http_client;

use crate::{
    error::Result,
    models::{EncodedRequest, GeneratedImage},
};
use async_trait::async_trait;

pub use http_client::HttpGenerationService;

/// The remote generation endpoint as seen by the form.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Returns the generated images in the order the service produced them.
    async fn generate(&self, request: &EncodedRequest) -> Result<Vec<GeneratedImage>>;
}
