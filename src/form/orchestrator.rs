use std::time::Duration;

use futures::future::{AbortHandle, AbortRegistration, Abortable};
use uuid::Uuid;

use super::{
    encoder,
    intake::{ImageIntake, LocalImage},
    renderer::{self, ResultView},
};
use crate::{
    config::GeneratorConfig,
    error::{GenerationError, Result},
    logger,
    models::{AspectRatio, GeneratedImage, GenerationParameters, Mode, Model, Resolution},
    service::GenerationService,
};

pub const MISSING_PROMPT: &str = "Please enter a prompt first.";
pub const MISSING_REFERENCE: &str = "Add a reference image or an image URL, or switch to text to image.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(Vec<GeneratedImage>),
    Failed(String),
}

impl SubmissionState {
    pub fn name(&self) -> &'static str {
        match self {
            SubmissionState::Idle => "idle",
            SubmissionState::Submitting => "submitting",
            SubmissionState::Succeeded(_) => "succeeded",
            SubmissionState::Failed(_) => "failed",
        }
    }
}

struct InFlight {
    id: Uuid,
    abort: AbortHandle,
}

/// A submission that has left the form: a snapshot of the inputs plus the
/// handle the form uses to cancel it.
pub struct PendingSubmission {
    id: Uuid,
    params: GenerationParameters,
    intake: ImageIntake,
    abort: AbortRegistration,
    timeout: Duration,
}

#[derive(Debug)]
pub struct SubmissionOutcome {
    id: Uuid,
    result: Result<Vec<GeneratedImage>>,
}

impl SubmissionOutcome {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn result(&self) -> &Result<Vec<GeneratedImage>> {
        &self.result
    }
}

impl PendingSubmission {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    /// Encodes the snapshot, then calls the service. Never touches the form.
    pub async fn run<S>(self, service: &S) -> SubmissionOutcome
    where
        S: GenerationService + ?Sized,
    {
        let PendingSubmission {
            id,
            params,
            intake,
            abort,
            timeout,
        } = self;

        let mut timer = logger::timer(&format!("generation {}", id));
        let work = async {
            let request = encoder::encode(&params, &intake).await?;
            service.generate(&request).await
        };

        let result = match Abortable::new(tokio::time::timeout(timeout, work), abort).await {
            Ok(Ok(result)) => result,
            Ok(Err(_elapsed)) => Err(GenerationError::Timeout(timeout.as_secs())),
            Err(_aborted) => Err(GenerationError::Cancelled),
        };
        timer.stop();

        SubmissionOutcome { id, result }
    }
}

/// Owns the form inputs and the submission state machine. All mutation goes
/// through these methods; at most one submission is in flight at a time.
pub struct GenerationForm {
    params: GenerationParameters,
    intake: ImageIntake,
    state: SubmissionState,
    last_results: Option<Vec<GeneratedImage>>,
    validation_error: Option<String>,
    in_flight: Option<InFlight>,
    request_timeout: Duration,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self::with_config(&GeneratorConfig::default())
    }
}

impl GenerationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &GeneratorConfig) -> Self {
        Self {
            params: GenerationParameters::default(),
            intake: ImageIntake::default(),
            state: SubmissionState::Idle,
            last_results: None,
            validation_error: None,
            in_flight: None,
            request_timeout: config.request_timeout,
        }
    }

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    pub fn intake(&self) -> &ImageIntake {
        &self.intake
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn last_results(&self) -> Option<&[GeneratedImage]> {
        self.last_results.as_deref()
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SubmissionState::Submitting)
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_submitting() && self.params.has_prompt()
    }

    pub fn in_flight_id(&self) -> Option<Uuid> {
        self.in_flight.as_ref().map(|flight| flight.id)
    }

    pub fn view(&self) -> ResultView {
        renderer::render(&self.state, self.last_results())
    }

    // Edits. A finished submission's message is dismissed by the next edit;
    // an in-flight one is unaffected since it runs on a snapshot.

    fn edited(&mut self) {
        self.validation_error = None;
        if matches!(
            self.state,
            SubmissionState::Succeeded(_) | SubmissionState::Failed(_)
        ) {
            self.transition(SubmissionState::Idle);
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.params.mode = mode;
        self.edited();
    }

    pub fn set_model(&mut self, model: Model) {
        self.params.model = model;
        self.edited();
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.params.resolution = resolution;
        self.edited();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.params.aspect_ratio = aspect_ratio;
        self.edited();
    }

    /// Returns how many characters past the limit were refused.
    pub fn set_prompt(&mut self, prompt: &str) -> usize {
        let refused = self.params.set_prompt(prompt);
        self.edited();
        refused
    }

    /// Returns how many files past the cap were dropped.
    pub fn select_local_files<I>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = LocalImage>,
    {
        let dropped = self.intake.select_local_files(candidates);
        self.edited();
        dropped
    }

    pub fn drop_files<I>(&mut self, dropped: I) -> usize
    where
        I: IntoIterator<Item = LocalImage>,
    {
        let dropped = self.intake.drop_files(dropped);
        self.edited();
        dropped
    }

    pub fn set_remote_url(&mut self, url: &str) {
        self.intake.set_remote_url(url);
        self.edited();
    }

    pub fn clear_local_files(&mut self) {
        self.intake.clear_local_files();
        self.edited();
    }

    pub fn clear_images(&mut self) {
        self.intake.clear();
        self.edited();
    }

    // Submission lifecycle.

    fn validate(&self) -> std::result::Result<(), &'static str> {
        if !self.params.has_prompt() {
            return Err(MISSING_PROMPT);
        }
        if self.params.mode.uses_reference_images() && self.intake.is_empty() {
            return Err(MISSING_REFERENCE);
        }
        Ok(())
    }

    /// Moves to `Submitting` and hands out the snapshot to run. Rejected
    /// while another submission is in flight or when the inputs are invalid;
    /// neither case dispatches anything.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission> {
        if self.is_submitting() {
            log::warn!("Submit ignored, a generation is already in flight");
            return Err(GenerationError::Busy);
        }
        if let Err(message) = self.validate() {
            log::info!("Submit blocked: {}", message);
            self.validation_error = Some(message.to_string());
            return Err(GenerationError::Validation(message.to_string()));
        }

        let id = Uuid::new_v4();
        let (abort, registration) = AbortHandle::new_pair();
        self.in_flight = Some(InFlight { id, abort });
        self.validation_error = None;
        self.transition(SubmissionState::Submitting);
        log::info!(
            "Submitting {} ({}, {}, {}, {})",
            id,
            self.params.mode,
            self.params.model,
            self.params.resolution,
            self.params.aspect_ratio
        );

        Ok(PendingSubmission {
            id,
            params: self.params.clone(),
            intake: self.intake.clone(),
            abort: registration,
            timeout: self.request_timeout,
        })
    }

    /// Applies a finished submission. Outcomes of cancelled or superseded
    /// submissions are ignored; returns whether the outcome was applied.
    pub fn complete(&mut self, outcome: SubmissionOutcome) -> bool {
        match &self.in_flight {
            Some(flight) if flight.id == outcome.id => {}
            _ => {
                log::debug!("Ignoring stale outcome for {}", outcome.id);
                return false;
            }
        }
        self.in_flight = None;

        match outcome.result {
            Ok(images) => {
                log::info!("Generation {} returned {} images", outcome.id, images.len());
                self.last_results = Some(images.clone());
                self.transition(SubmissionState::Succeeded(images));
            }
            Err(GenerationError::Cancelled) => {
                self.transition(SubmissionState::Idle);
            }
            Err(err) => {
                log::error!("Generation {} failed: {}", outcome.id, err);
                self.transition(SubmissionState::Failed(err.user_message()));
            }
        }
        true
    }

    /// Full cycle: validate, encode, call the service, apply the outcome.
    /// Only validation and busy rejections are returned as errors; service
    /// failures end up in [`SubmissionState::Failed`].
    pub async fn submit<S>(&mut self, service: &S) -> Result<()>
    where
        S: GenerationService + ?Sized,
    {
        let pending = self.begin_submit()?;
        let outcome = pending.run(service).await;
        self.complete(outcome);
        Ok(())
    }

    /// Aborts the in-flight submission and returns to `Idle`. Previous
    /// results stay visible.
    pub fn cancel(&mut self) -> bool {
        match self.in_flight.take() {
            Some(flight) => {
                flight.abort.abort();
                log::info!("Generation {} cancelled", flight.id);
                self.transition(SubmissionState::Idle);
                true
            }
            None => false,
        }
    }

    fn transition(&mut self, next: SubmissionState) {
        log::debug!("Submission state {} -> {}", self.state.name(), next.name());
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Scripted {
        calls: Mutex<Vec<String>>,
        reply: Result<Vec<GeneratedImage>>,
    }

    impl Scripted {
        fn replying(reply: Result<Vec<GeneratedImage>>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                reply,
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerationService for Scripted {
        async fn generate(
            &self,
            request: &crate::models::EncodedRequest,
        ) -> Result<Vec<GeneratedImage>> {
            self.calls.lock().unwrap().push(request.prompt().to_string());
            self.reply.clone()
        }
    }

    fn image(url: &str) -> GeneratedImage {
        GeneratedImage { url: url.into() }
    }

    fn text_form(prompt: &str) -> GenerationForm {
        let mut form = GenerationForm::new();
        form.set_mode(Mode::TextToImage);
        form.set_prompt(prompt);
        form
    }

    #[tokio::test]
    async fn empty_prompt_blocks_submission() {
        let service = Scripted::replying(Ok(vec![image("data:a")]));
        let mut form = text_form("   ");
        assert!(!form.can_submit());

        let err = form.submit(&service).await.unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
        assert_eq!(form.state(), &SubmissionState::Idle);
        assert_eq!(form.validation_error(), Some(MISSING_PROMPT));
        assert!(service.prompts().is_empty());

        form.set_prompt("a banana");
        assert_eq!(form.validation_error(), None);
    }

    #[tokio::test]
    async fn image_mode_needs_a_reference() {
        let mut form = GenerationForm::new();
        form.set_prompt("restyle this");
        assert_eq!(
            form.begin_submit().err(),
            Some(GenerationError::Validation(MISSING_REFERENCE.into()))
        );
        form.set_remote_url("https://cdn.example/ref.png");
        assert!(form.begin_submit().is_ok());
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_rejected() {
        let service = Scripted::replying(Ok(vec![image("data:a")]));
        let mut form = text_form("a banana");

        let pending = form.begin_submit().unwrap();
        assert!(form.is_submitting());
        assert!(!form.can_submit());
        assert_eq!(form.begin_submit().err(), Some(GenerationError::Busy));

        let outcome = pending.run(&service).await;
        assert!(form.complete(outcome));
        assert_eq!(service.prompts().len(), 1);
        assert_eq!(form.state(), &SubmissionState::Succeeded(vec![image("data:a")]));
    }

    #[tokio::test]
    async fn edits_during_flight_only_affect_the_next_submission() {
        let service = Scripted::replying(Ok(vec![image("data:a")]));
        let mut form = text_form("first prompt");

        let pending = form.begin_submit().unwrap();
        form.set_prompt("second prompt");
        assert!(form.is_submitting());
        let outcome = pending.run(&service).await;
        form.complete(outcome);

        form.submit(&service).await.unwrap();
        assert_eq!(service.prompts(), vec!["first prompt", "second prompt"]);
    }

    #[tokio::test]
    async fn failure_keeps_previous_results_visible() {
        let ok = Scripted::replying(Ok(vec![image("data:1"), image("data:2")]));
        let failing = Scripted::replying(Err(GenerationError::Service("quota exceeded".into())));
        let mut form = text_form("a banana");

        form.submit(&ok).await.unwrap();
        let pending = form.begin_submit().unwrap();
        assert_eq!(form.last_results().map(|r| r.len()), Some(2));
        form.complete(pending.run(&failing).await);

        assert_eq!(form.state(), &SubmissionState::Failed("quota exceeded".into()));
        assert_eq!(form.last_results().map(|r| r.len()), Some(2));

        // retry uses current inputs and returns to the success path
        form.set_prompt("a banana, retry");
        assert_eq!(form.state(), &SubmissionState::Idle);
        form.submit(&ok).await.unwrap();
        assert!(matches!(form.state(), SubmissionState::Succeeded(_)));
    }

    #[tokio::test]
    async fn cancel_returns_to_idle_and_ignores_late_outcome() {
        let service = Scripted::replying(Ok(vec![image("data:late")]));
        let mut form = text_form("a banana");

        let pending = form.begin_submit().unwrap();
        assert!(form.cancel());
        assert_eq!(form.state(), &SubmissionState::Idle);
        assert!(!form.cancel());

        let outcome = pending.run(&service).await;
        assert_eq!(outcome.result(), &Err(GenerationError::Cancelled));
        assert!(service.prompts().is_empty());
        assert!(!form.complete(outcome));
        assert_eq!(form.last_results(), None);
    }

    #[tokio::test]
    async fn encode_failure_becomes_failed_without_calling_the_service() {
        let service = Scripted::replying(Ok(vec![image("data:a")]));
        let mut form = GenerationForm::new();
        form.set_prompt("restyle");
        form.select_local_files(vec![LocalImage::from_path("/no/such/file.png")]);

        form.submit(&service).await.unwrap();
        assert_eq!(
            form.state(),
            &SubmissionState::Failed(crate::error::ENCODE_FAILURE.into())
        );
        assert!(service.prompts().is_empty());
    }

    #[test]
    fn mode_switch_keeps_the_intake() {
        let mut form = GenerationForm::new();
        form.select_local_files(vec![LocalImage::from_bytes("a.png", vec![1])]);
        form.set_mode(Mode::TextToImage);
        form.set_mode(Mode::ImageToImage);
        assert_eq!(form.intake().file_names(), vec!["a.png"]);
    }
}
