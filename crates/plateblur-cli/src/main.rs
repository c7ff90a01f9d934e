//! Plateblur CLI - anonymize license plates in a photo using precomputed detections.

use clap::Parser;
use plateblur_core::{
    AnonymizeError, AnonymizeResponse, Anonymizer, AnonymizerConfig, DetectionBox, ErrorResponse,
    FixedDetections,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::time::Duration;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "plateblur")]
#[command(about = "Pixelate license plates in an image")]
#[command(version)]
struct Cli {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to the detector output: a JSON array of `{"xyxy": [x1, y1, x2, y2]}`
    /// boxes in the coordinates of the size-capped image.
    #[arg(long)]
    detections: PathBuf,

    /// Optional JSON file overriding pipeline parameters.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the anonymized JPEG here.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Abort processing after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

/// Why a run failed: before the pipeline started, or inside it.
#[derive(Debug)]
enum Failure {
    Setup(CliError),
    Pipeline(AnonymizeError),
}

impl From<AnonymizeError> for Failure {
    fn from(err: AnonymizeError) -> Self {
        Failure::Pipeline(err)
    }
}

impl Failure {
    fn response(&self) -> ErrorResponse {
        match self {
            Failure::Setup(e) => ErrorResponse {
                error: e.to_string(),
            },
            Failure::Pipeline(e) => e.to_response(),
        }
    }

    fn exit_code(&self) -> u8 {
        match self {
            Failure::Setup(_) => 2,
            Failure::Pipeline(e) => match e.status_code() {
                400 | 415 => 3,
                504 => 4,
                _ => 1,
            },
        }
    }
}

fn main() -> ExitCode {
    // stdout carries the JSON response
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let (body, code) = match run(&cli) {
        Ok(response) => (serde_json::to_string(&response), ExitCode::SUCCESS),
        Err(failure) => {
            if let Failure::Pipeline(e) = &failure {
                tracing::error!(status = e.status_code(), "{e}");
            } else {
                tracing::error!("{}", failure.response().error);
            }
            (
                serde_json::to_string(&failure.response()),
                ExitCode::from(failure.exit_code()),
            )
        }
    };

    match body {
        Ok(json) => {
            println!("{json}");
            code
        }
        Err(e) => {
            tracing::error!("Failed to serialize response: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<AnonymizeResponse, Failure> {
    let bytes = read_file(&cli.image).map_err(Failure::Setup)?;
    let boxes = load_detections(&cli.detections).map_err(Failure::Setup)?;
    let config = match &cli.config {
        Some(path) => load_config(path).map_err(Failure::Setup)?,
        None => AnonymizerConfig::default(),
    };

    tracing::info!(
        "Anonymizing {} ({} bytes, {} detections)",
        cli.image.display(),
        bytes.len(),
        boxes.len()
    );

    let anonymizer = Anonymizer::with_config(FixedDetections::new(boxes), config)
        .map_err(|e| Failure::Pipeline(e.into()))?;
    let timeout = cli.timeout_secs.map(Duration::from_secs);
    let response = run_with_timeout(timeout, move || anonymizer.process(&bytes))?;

    if let Some(out) = &cli.out {
        write_jpeg(out, &response).map_err(Failure::Setup)?;
        tracing::info!("Anonymized image written to {}", out.display());
    }

    Ok(response)
}

/// Run `job` on a worker thread, giving up after `timeout`.
///
/// On timeout the worker is detached; the process exits shortly after.
fn run_with_timeout<T, F>(timeout: Option<Duration>, job: F) -> Result<T, AnonymizeError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AnonymizeError> + Send + 'static,
{
    let Some(timeout) = timeout else {
        return job();
    };

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        // receiver may already be gone after a timeout
        let _ = tx.send(job());
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(AnonymizeError::Timeout(timeout)),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(AnonymizeError::Internal(
            "worker thread panicked".to_string(),
        )),
    }
}

fn read_file(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| -> CliError { format!("Failed to read {}: {}", path.display(), e).into() })
}

fn load_detections(path: &Path) -> CliResult<Vec<DetectionBox>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| -> CliError { format!("Failed to read {}: {}", path.display(), e).into() })?;
    serde_json::from_str(&text).map_err(|e| -> CliError {
        format!("Invalid detections in {}: {}", path.display(), e).into()
    })
}

fn load_config(path: &Path) -> CliResult<AnonymizerConfig> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| -> CliError { format!("Failed to read {}: {}", path.display(), e).into() })?;
    serde_json::from_str(&text).map_err(|e| -> CliError {
        format!("Invalid config in {}: {}", path.display(), e).into()
    })
}

fn write_jpeg(path: &Path, response: &AnonymizeResponse) -> CliResult<()> {
    let jpeg = response.jpeg_bytes()?;
    std::fs::write(path, jpeg)?;
    Ok(())
}
