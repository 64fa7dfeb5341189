use banana_studio::{
    form::{accepts, LocalImage},
    logger::{self, LoggerConfig},
    AspectRatio, GenerationError, GenerationForm, GeneratorConfig, HttpGenerationService, Mode,
    Model, Resolution, SubmissionState,
};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "banana-studio", about = "Submit one generation request and print the result panel")]
struct Cli {
    #[arg(long, default_value_t = Mode::default())]
    mode: Mode,

    #[arg(long, default_value_t = Model::default())]
    model: Model,

    #[arg(long, default_value_t = Resolution::default())]
    resolution: Resolution,

    #[arg(long = "aspect-ratio", default_value_t = AspectRatio::default())]
    aspect_ratio: AspectRatio,

    #[arg(long, short)]
    prompt: String,

    /// Reference image, may be repeated (up to 8 are kept)
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    /// Reference image URL, used instead of local images
    #[arg(long = "image-url", conflicts_with = "images")]
    image_url: Option<String>,

    /// Overrides GENERATOR_ENDPOINT
    #[arg(long)]
    endpoint: Option<String>,

    /// Print the result panel as HTML
    #[arg(long)]
    html: bool,

    #[arg(long, short)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LoggerConfig::development()
    } else {
        LoggerConfig::default()
    };
    if let Err(e) = logger::init_with_config(log_config) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }
    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using system environment variables");
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, GenerationError> {
    let mut config = GeneratorConfig::from_env();
    if let Some(endpoint) = cli.endpoint {
        config = config.with_endpoint(endpoint);
    }
    logger::log_config_info(&config);

    let service = HttpGenerationService::new(&config)?;
    let mut form = GenerationForm::with_config(&config);

    form.set_mode(cli.mode);
    form.set_model(cli.model);
    form.set_resolution(cli.resolution);
    form.set_aspect_ratio(cli.aspect_ratio);
    let refused = form.set_prompt(&cli.prompt);
    if refused > 0 {
        log::warn!("Prompt truncated, {} characters over the limit", refused);
    }

    if let Some(url) = cli.image_url.as_deref() {
        form.set_remote_url(url);
    } else if !cli.images.is_empty() {
        let (picked, skipped): (Vec<LocalImage>, Vec<LocalImage>) = cli
            .images
            .into_iter()
            .map(LocalImage::from_path)
            .partition(accepts);
        for image in &skipped {
            log::warn!("Skipping {}, not an accepted image type", image.name);
        }
        let dropped = form.select_local_files(picked);
        if dropped > 0 {
            println!("Note: only the first 8 images are used, {} ignored.", dropped);
        }
    }

    if let Err(e) = form.submit(&service).await {
        if let Some(message) = form.validation_error() {
            println!("{}", message);
            return Ok(ExitCode::FAILURE);
        }
        return Err(e);
    }

    let view = form.view();
    if cli.html {
        println!("{}", view.to_html());
    } else {
        println!("{}", view);
    }

    Ok(match form.state() {
        SubmissionState::Succeeded(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
