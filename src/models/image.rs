use serde::{Deserialize, Serialize};

use super::params::{AspectRatio, Mode, Model, Resolution};
use crate::error::{GenerationError, Result};

/// Fallback when a file declares no usable media type.
pub const DEFAULT_MIME_TYPE: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub data: String, // Base64 encoded
    pub mime_type: String,
}

/// Snapshot sent to the generation endpoint. Built once per submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedRequest {
    mode: Mode,
    model: Model,
    resolution: Resolution,
    aspect_ratio: AspectRatio,
    prompt: String,
    #[serde(rename = "base64Images")]
    encoded_images: Vec<EncodedImage>,
    #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
    remote_url: Option<String>,
}

impl EncodedRequest {
    pub(crate) fn new(
        mode: Mode,
        model: Model,
        resolution: Resolution,
        aspect_ratio: AspectRatio,
        prompt: String,
        encoded_images: Vec<EncodedImage>,
        remote_url: Option<String>,
    ) -> Self {
        Self {
            mode,
            model,
            resolution,
            aspect_ratio,
            prompt,
            encoded_images,
            remote_url,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect_ratio
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn encoded_images(&self) -> &[EncodedImage] {
        &self.encoded_images
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GenerationError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String, // data url or remote reference
}

/// Success body of the generation endpoint.
#[derive(Debug, Deserialize)]
pub struct ImageGenerationResponse {
    pub images: Vec<String>,
}

impl ImageGenerationResponse {
    /// Parses and validates a success body. Anything that is not a
    /// non-empty list of non-empty strings is rejected.
    pub fn parse(body: &str) -> Result<Vec<GeneratedImage>> {
        let response: ImageGenerationResponse = serde_json::from_str(body).map_err(|e| {
            GenerationError::Service(format!("Malformed response from generation service: {}", e))
        })?;

        if response.images.is_empty() {
            return Err(GenerationError::Service("No images generated".into()));
        }
        if let Some(index) = response.images.iter().position(|url| url.trim().is_empty()) {
            return Err(GenerationError::Service(format!(
                "Malformed response from generation service: image {} is empty",
                index
            )));
        }

        Ok(response
            .images
            .into_iter()
            .map(|url| GeneratedImage { url })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(images: Vec<EncodedImage>, url: Option<&str>) -> EncodedRequest {
        EncodedRequest::new(
            Mode::TextToImage,
            Model::Standard,
            Resolution::TwoK,
            AspectRatio::Square,
            "a banana on a table".into(),
            images,
            url.map(str::to_string),
        )
    }

    #[test]
    fn request_body_uses_wire_field_names() {
        let body = serde_json::to_value(request(vec![], None)).unwrap();
        assert_eq!(
            body,
            json!({
                "mode": "text-to-image",
                "model": "nano-banana",
                "resolution": "2k",
                "aspectRatio": "1:1",
                "prompt": "a banana on a table",
                "base64Images": []
            })
        );
    }

    #[test]
    fn image_url_is_present_only_when_set() {
        let body = serde_json::to_value(request(vec![], Some("https://cdn.example/cat.png"))).unwrap();
        assert_eq!(body["imageUrl"], "https://cdn.example/cat.png");

        let with_image = request(
            vec![EncodedImage {
                data: "AAEC".into(),
                mime_type: "image/webp".into(),
            }],
            None,
        );
        let body = serde_json::to_value(with_image).unwrap();
        assert_eq!(body["base64Images"][0], json!({"data": "AAEC", "mimeType": "image/webp"}));
        assert!(body.get("imageUrl").is_none());
    }

    #[test]
    fn response_keeps_service_order() {
        let images =
            ImageGenerationResponse::parse(r#"{"images":["data:image/png;base64,b","data:image/png;base64,a"]}"#)
                .unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].url, "data:image/png;base64,b");
        assert_eq!(images[1].url, "data:image/png;base64,a");
    }

    #[test]
    fn malformed_responses_fail_closed() {
        for body in [
            "",
            "not json",
            r#"{"images": "data:x"}"#,
            r#"{"images": [1, 2]}"#,
            r#"{"imgs": []}"#,
            r#"{"images": []}"#,
            r#"{"images": ["ok", ""]}"#,
        ] {
            assert!(
                matches!(ImageGenerationResponse::parse(body), Err(GenerationError::Service(_))),
                "accepted {:?}",
                body
            );
        }
    }
}
