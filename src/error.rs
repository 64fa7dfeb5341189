use thiserror::Error;

pub const GENERIC_FAILURE: &str = "Generation failed, please try again later.";
pub const ENCODE_FAILURE: &str = "Could not read the selected images. Please choose them again.";
pub const TRANSPORT_FAILURE: &str =
    "Could not reach the generation service. Please check your connection and try again.";
pub const TIMEOUT_FAILURE: &str = "The generation request timed out. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Encode error: {0}")]
    Encode(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Service error: {0}")]
    Service(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Submission cancelled")]
    Cancelled,
    #[error("A generation request is already in flight")]
    Busy,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GenerationError {
    /// Text shown to the user when a submission ends in this error.
    ///
    /// Service errors carry the endpoint's body verbatim; causes the user
    /// cannot act on get a generic message and keep their detail in the logs.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::Validation(msg) => msg.clone(),
            GenerationError::Service(body) if body.trim().is_empty() => GENERIC_FAILURE.to_string(),
            GenerationError::Service(body) => body.clone(),
            GenerationError::Encode(_) => ENCODE_FAILURE.to_string(),
            GenerationError::Transport(_) => TRANSPORT_FAILURE.to_string(),
            GenerationError::Timeout(_) => TIMEOUT_FAILURE.to_string(),
            GenerationError::Cancelled => "Generation cancelled.".to_string(),
            GenerationError::Busy => "A generation is already running.".to_string(),
            GenerationError::Config(_) | GenerationError::Serialization(_) => {
                GENERIC_FAILURE.to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_body_is_forwarded_verbatim() {
        let err = GenerationError::Service("quota exceeded".into());
        assert_eq!(err.user_message(), "quota exceeded");
    }

    #[test]
    fn empty_service_body_falls_back_to_generic_text() {
        let err = GenerationError::Service("  ".into());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn internal_causes_are_not_shown_to_the_user() {
        let err = GenerationError::Encode("permission denied: /tmp/a.png".into());
        assert_eq!(err.user_message(), ENCODE_FAILURE);
        let err = GenerationError::Transport("dns error".into());
        assert_eq!(err.user_message(), TRANSPORT_FAILURE);
    }
}
