mod settings;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use facetag_core::detection::domain::annotator::Annotator;
use facetag_core::detection::domain::face_detector::FaceDetector;
use facetag_core::detection::domain::recognizing_annotator::RecognizingAnnotator;
use facetag_core::detection::infrastructure::cached_face_detector::CachedFaceDetector;
use facetag_core::detection::infrastructure::downscaled_face_detector::DownscaledFaceDetector;
use facetag_core::identity::domain::identity_store::IdentityStore;
use facetag_core::identity::infrastructure::json_identity_store::JsonIdentityStore;
use facetag_core::pipeline::analyse_directory_use_case::AnalyseDirectoryUseCase;
use facetag_core::pipeline::annotate_video_use_case::AnnotateVideoUseCase;
use facetag_core::pipeline::cancellation::CancellationToken;
use facetag_core::pipeline::enroll_identities_use_case::EnrollIdentitiesUseCase;
use facetag_core::pipeline::infrastructure::chunked_pipeline_executor::ChunkedPipelineExecutor;
use facetag_core::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor};
use facetag_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facetag_core::rendering::domain::frame_renderer::FrameRenderer;
use facetag_core::rendering::infrastructure::overlay_renderer::OverlayRenderer;
use facetag_core::shared::constants::DEFAULT_MAX_CONSECUTIVE_FAILURES;
use facetag_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facetag_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

use settings::Settings;

/// Suffix of the per-video detections file read when `--detections` is absent.
const DETECTIONS_SUFFIX: &str = "faces.json";

/// Annotates faces in videos, spreading frames across parallel workers.
#[derive(Parser)]
#[command(name = "facetag", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (defaults to the per-user config directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Number of parallel workers.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Maximum encoding distance for a face to match a known identity.
    #[arg(long, global = true)]
    tolerance: Option<f64>,

    /// Identity store file.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Consecutive detection failures before a worker abandons its chunk (0 = never).
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CONSECUTIVE_FAILURES)]
    max_failures: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Annotate a single video.
    Annotate {
        input: PathBuf,
        output: PathBuf,

        /// Detections file (JSON: frame index -> faces). Defaults to
        /// `<input>.faces.json` next to the video.
        #[arg(long)]
        detections: Option<PathBuf>,

        /// Resolution divisor the detections were recorded at.
        #[arg(long, default_value = "1")]
        detection_scale: u32,
    },
    /// Annotate every mp4/mov video in the input directory.
    Analyse {
        #[arg(long)]
        input_dir: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Resolution divisor the detections were recorded at.
        #[arg(long, default_value = "1")]
        detection_scale: u32,
    },
    /// Add the people pictured in the known-people directory to the store.
    Enroll {
        #[arg(long)]
        known_people: Option<PathBuf>,

        /// Detections file keyed by the image's 1-based position in the
        /// sorted directory listing.
        #[arg(long)]
        detections: Option<PathBuf>,
    },
}

/// Effective options after layering CLI flags over settings.
struct RunOptions {
    settings: Settings,
    max_failures: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let options = resolve_options(&cli);
    validate(&options, &cli.command)?;

    let store = JsonIdentityStore::new(&options.settings.identity_store);
    let cancel = CancellationToken::new();
    if let Err(e) = install_interrupt_handler(&cancel) {
        log::warn!("Ctrl-C will not stop the run: {e}");
    }

    match cli.command {
        Command::Annotate {
            input,
            output,
            detections,
            detection_scale,
        } => {
            let known = store.load()?;
            let detections = detections.unwrap_or_else(|| sidecar_path(&input));
            let detector = build_detector(&detections, detection_scale)?;
            let mut use_case = build_pipeline(&options, detector);
            let report = use_case.execute(
                &input,
                &output,
                &known,
                options.settings.workers,
                &cancel,
            )?;
            println!("{}", report.status_text());
        }
        Command::Analyse {
            input_dir,
            output_dir,
            detection_scale,
        } => {
            let known = store.load()?;
            let input_dir = input_dir.unwrap_or_else(|| options.settings.input_directory.clone());
            let output_dir =
                output_dir.unwrap_or_else(|| options.settings.output_directory.clone());
            let batch = build_batch(&options, detection_scale);
            let results = batch.execute(
                &input_dir,
                &output_dir,
                &known,
                options.settings.workers,
                &cancel,
            )?;
            for video in &results {
                match &video.result {
                    Ok(report) => println!("{}: {}", video.input.display(), report.status_text()),
                    Err(e) => println!("{}: failed: {e}", video.input.display()),
                }
            }
        }
        Command::Enroll {
            known_people,
            detections,
        } => {
            let dir = known_people
                .unwrap_or_else(|| options.settings.known_people_directory.clone());
            let detections = detections.unwrap_or_else(|| sidecar_path(&dir));
            let detector = build_detector(&detections, 1)?;
            let use_case = EnrollIdentitiesUseCase::new(Box::new(store), detector);
            let (known, report) = use_case.execute(&dir)?;
            println!(
                "Enrolled {} face(s), skipped {} known, {} failed; {} identities stored",
                report.enrolled.len(),
                report.skipped.len(),
                report.failed.len(),
                known.len()
            );
        }
    }

    Ok(())
}

/// Routes Ctrl-C to `cancel` so workers stop at the next frame and the
/// frames finished so far are still written.
fn install_interrupt_handler(cancel: &CancellationToken) -> Result<(), ctrlc::Error> {
    let cancel = cancel.clone();
    ctrlc::set_handler(move || on_interrupt(&cancel))
}

fn on_interrupt(cancel: &CancellationToken) {
    if !cancel.is_cancelled() {
        eprintln!("Interrupted, finishing frames in progress...");
    }
    cancel.cancel();
}

fn resolve_options(cli: &Cli) -> RunOptions {
    let mut settings = Settings::load(cli.settings.as_deref());
    if let Some(workers) = cli.workers {
        settings.workers = workers;
    }
    if let Some(tolerance) = cli.tolerance {
        settings.tolerance = tolerance;
    }
    if let Some(store) = &cli.store {
        settings.identity_store = store.clone();
    }
    RunOptions {
        settings,
        max_failures: cli.max_failures,
    }
}

fn validate(options: &RunOptions, command: &Command) -> Result<(), Box<dyn std::error::Error>> {
    if options.settings.workers == 0 {
        return Err("Workers must be at least 1".into());
    }
    let tolerance = options.settings.tolerance;
    if !tolerance.is_finite() || tolerance <= 0.0 {
        return Err(format!("Tolerance must be a positive number, got {tolerance}").into());
    }
    let scale = match command {
        Command::Annotate {
            detection_scale, ..
        }
        | Command::Analyse {
            detection_scale, ..
        } => *detection_scale,
        Command::Enroll { .. } => 1,
    };
    if scale == 0 {
        return Err("Detection scale must be at least 1".into());
    }
    Ok(())
}

/// `clip.mp4` -> `clip.mp4.faces.json`.
fn sidecar_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(DETECTIONS_SUFFIX);
    PathBuf::from(name)
}

fn build_detector(
    detections: &Path,
    scale: u32,
) -> Result<Arc<dyn FaceDetector>, Box<dyn std::error::Error>> {
    let cached: Box<dyn FaceDetector> = if detections.exists() {
        Box::new(CachedFaceDetector::from_json_file(detections)?)
    } else {
        log::warn!(
            "No detections at {}, frames will pass through unannotated",
            detections.display()
        );
        Box::new(CachedFaceDetector::new(Arc::default()))
    };

    if scale == 1 {
        return Ok(Arc::from(cached));
    }
    Ok(Arc::new(DownscaledFaceDetector::new(cached, scale)?))
}

fn build_pipeline(options: &RunOptions, detector: Arc<dyn FaceDetector>) -> AnnotateVideoUseCase {
    let annotator: Arc<dyn Annotator> =
        Arc::new(RecognizingAnnotator::new(detector, options.settings.tolerance));
    let renderer: Arc<dyn FrameRenderer> = Arc::new(OverlayRenderer::new());
    AnnotateVideoUseCase::new(
        Box::new(FfmpegReader::new()),
        Box::new(FfmpegWriter::new()),
        annotator,
        renderer,
        build_executor(options),
        Box::new(StdoutPipelineLogger::default()),
    )
}

fn build_executor(options: &RunOptions) -> Arc<dyn PipelineExecutor> {
    Arc::new(ChunkedPipelineExecutor::new(PipelineConfig {
        max_consecutive_failures: options.max_failures,
    }))
}

fn build_batch(options: &RunOptions, detection_scale: u32) -> AnalyseDirectoryUseCase {
    let tolerance = options.settings.tolerance;
    let executor = build_executor(options);
    let renderer: Arc<dyn FrameRenderer> = Arc::new(OverlayRenderer::new());

    AnalyseDirectoryUseCase::new(Box::new(move |input: &Path| {
        let detector = build_detector(&sidecar_path(input), detection_scale).unwrap_or_else(|e| {
            log::warn!("Ignoring detections for {}: {e}", input.display());
            let empty: Arc<dyn FaceDetector> = Arc::new(CachedFaceDetector::new(Arc::default()));
            empty
        });
        AnnotateVideoUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            Arc::new(RecognizingAnnotator::new(detector, tolerance)),
            Arc::clone(&renderer),
            Arc::clone(&executor),
            Box::new(StdoutPipelineLogger::default()),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_cancels_token_and_its_clones() {
        let cancel = CancellationToken::new();
        let observer = cancel.clone();

        on_interrupt(&cancel);
        on_interrupt(&cancel);

        assert!(observer.is_cancelled());
    }

    #[test]
    fn test_interrupt_handler_installs() {
        let cancel = CancellationToken::new();
        assert!(install_interrupt_handler(&cancel).is_ok());
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_sidecar_path_appends_suffix() {
        assert_eq!(
            sidecar_path(Path::new("videos/clip.mp4")),
            PathBuf::from("videos/clip.mp4.faces.json")
        );
    }

    #[test]
    fn test_missing_detections_give_empty_detector() {
        let detector = build_detector(Path::new("/nonexistent/clip.faces.json"), 1).unwrap();
        assert_eq!(detector.coordinate_scale(), 1);
    }

    #[test]
    fn test_detection_scale_wraps_detector() {
        let detector = build_detector(Path::new("/nonexistent/clip.faces.json"), 4).unwrap();
        assert_eq!(detector.coordinate_scale(), 4);
    }

    #[test]
    fn test_malformed_detections_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4.faces.json");
        std::fs::write(&path, "[").unwrap();
        assert!(build_detector(&path, 1).is_err());
    }

    #[test]
    fn test_cli_flags_override_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("settings.json");
        Settings::default().save_to(&settings_path);

        let cli = Cli::parse_from([
            "facetag",
            "--settings",
            settings_path.to_str().unwrap(),
            "--workers",
            "6",
            "analyse",
        ]);
        let options = resolve_options(&cli);

        assert_eq!(options.settings.workers, 6);
        assert_eq!(options.settings.input_directory, PathBuf::from("videos"));
        assert!(validate(&options, &cli.command).is_ok());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let cli = Cli::parse_from(["facetag", "--workers", "0", "annotate", "a.mp4", "b.mp4"]);
        let options = RunOptions {
            settings: Settings {
                workers: 0,
                ..Settings::default()
            },
            max_failures: cli.max_failures,
        };
        assert!(validate(&options, &cli.command).is_err());
    }

    #[test]
    fn test_zero_detection_scale_rejected() {
        let cli = Cli::parse_from(["facetag", "annotate", "a.mp4", "b.mp4", "--detection-scale", "0"]);
        let options = RunOptions {
            settings: Settings::default(),
            max_failures: cli.max_failures,
        };
        assert!(validate(&options, &cli.command).is_err());
    }
}
