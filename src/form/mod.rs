pub mod encoder;
pub mod intake;
pub mod orchestrator;
pub mod renderer;

pub use encoder::encode;
pub use intake::{accepts, ImageIntake, ImageSource, LocalImage, ACCEPTED_EXTENSIONS, MAX_LOCAL_IMAGES};
pub use orchestrator::{GenerationForm, PendingSubmission, SubmissionOutcome, SubmissionState};
pub use renderer::{render, ResultBody, ResultView, Tile};
