pub mod config;
pub mod error;
pub mod form;
pub mod logger;
pub mod models;
pub mod service;

pub use config::GeneratorConfig;
pub use error::{GenerationError, Result};
pub use form::{GenerationForm, ImageIntake, LocalImage, PendingSubmission, ResultView, SubmissionState};
pub use models::*;
pub use service::{GenerationService, HttpGenerationService};
