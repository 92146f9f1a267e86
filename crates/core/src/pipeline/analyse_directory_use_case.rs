use std::path::{Path, PathBuf};

use crate::shared::constants::VIDEO_EXTENSIONS;
use crate::shared::identity::KnownIdentitySet;
use crate::shared::media_files::list_files;

use super::annotate_video_use_case::AnnotateVideoUseCase;
use super::cancellation::CancellationToken;
use super::error::PipelineError;
use super::run_report::RunReport;

/// Builds a fresh single-video pipeline for the given input file.
pub type PipelineFactory = Box<dyn Fn(&Path) -> AnnotateVideoUseCase + Send + Sync>;

/// Outcome of one video in a batch.
#[derive(Debug)]
pub struct VideoResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub result: Result<RunReport, PipelineError>,
}

/// Annotates every supported video in a directory, one after another.
///
/// Each video is written to the output directory under its own file name.
/// A fatal error on one video is recorded and the batch moves on; a
/// cancellation stops the batch before the next video.
pub struct AnalyseDirectoryUseCase {
    make_pipeline: PipelineFactory,
}

impl AnalyseDirectoryUseCase {
    pub fn new(make_pipeline: PipelineFactory) -> Self {
        Self { make_pipeline }
    }

    pub fn execute(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        known: &KnownIdentitySet,
        worker_count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<VideoResult>, PipelineError> {
        let videos =
            list_files(input_dir, VIDEO_EXTENSIONS).map_err(|source| PipelineError::Directory {
                path: input_dir.display().to_string(),
                source,
            })?;
        log::info!("Found {} videos in {}", videos.len(), input_dir.display());

        let mut results = Vec::with_capacity(videos.len());
        for input in videos {
            if cancel.is_cancelled() {
                log::info!("Finished processing early: cancellation requested");
                break;
            }

            let Some(name) = input.file_name() else {
                continue;
            };
            let output = output_dir.join(name);
            log::info!("Starting video {}", input.display());

            let result =
                (self.make_pipeline)(&input).execute(&input, &output, known, worker_count, cancel);
            match &result {
                Ok(report) => log::info!("Finished video {}: {}", input.display(), report.status_text()),
                Err(e) => log::error!("An error has occurred on {}: {e}", input.display()),
            }

            results.push(VideoResult {
                input,
                output,
                result,
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::annotator::Annotator;
    use crate::detection::domain::face_detector::DetectionError;
    use crate::pipeline::infrastructure::chunked_pipeline_executor::ChunkedPipelineExecutor;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::rendering::infrastructure::overlay_renderer::OverlayRenderer;
    use crate::shared::annotation::Annotation;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use crate::video::domain::video_reader::{SourceError, VideoReader};
    use crate::video::domain::video_writer::{SinkError, VideoWriter};
    use std::sync::{Arc, Mutex};

    struct StubReader {
        remaining: usize,
    }

    impl VideoReader for StubReader {
        fn open(&mut self, path: &Path) -> Result<VideoMetadata, SourceError> {
            if path.file_name().is_some_and(|n| n == "broken.mp4") {
                return Err(SourceError::Open {
                    path: path.display().to_string(),
                    reason: "moov atom not found".into(),
                });
            }
            Ok(VideoMetadata {
                width: 2,
                height: 2,
                fps: 30.0,
                total_frames: self.remaining,
                codec: String::new(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
            let n = std::mem::take(&mut self.remaining);
            Box::new((1..=n).map(|i| Ok(Frame::new(vec![0u8; 12], 2, 2, 3, i))))
        }

        fn close(&mut self) {}
    }

    struct RecordingWriter {
        opened: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl VideoWriter for RecordingWriter {
        fn open(&mut self, path: &Path, _metadata: &VideoMetadata) -> Result<(), SinkError> {
            self.opened.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }

        fn write(&mut self, _frame: &Frame) -> Result<(), SinkError> {
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            Ok(())
        }
    }

    /// Cancels the batch the first time it sees a frame.
    struct CancellingAnnotator {
        cancel: Option<CancellationToken>,
    }

    impl Annotator for CancellingAnnotator {
        fn annotate(
            &self,
            _frame: &Frame,
            _known: &KnownIdentitySet,
        ) -> Result<Vec<Annotation>, DetectionError> {
            if let Some(cancel) = &self.cancel {
                cancel.cancel();
            }
            Ok(Vec::new())
        }
    }

    fn batch(
        opened: &Arc<Mutex<Vec<PathBuf>>>,
        cancel: Option<CancellationToken>,
    ) -> AnalyseDirectoryUseCase {
        let opened = Arc::clone(opened);
        let annotator: Arc<dyn Annotator> = Arc::new(CancellingAnnotator { cancel });
        AnalyseDirectoryUseCase::new(Box::new(move |_input: &Path| {
            AnnotateVideoUseCase::new(
                Box::new(StubReader { remaining: 4 }),
                Box::new(RecordingWriter {
                    opened: Arc::clone(&opened),
                }),
                Arc::clone(&annotator),
                Arc::new(OverlayRenderer::new()),
                Arc::new(ChunkedPipelineExecutor::default()),
                Box::new(NullPipelineLogger),
            )
        }))
    }

    fn input_dir(names: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        dir
    }

    #[test]
    fn test_processes_supported_videos_into_output_dir() {
        let input = input_dir(&["b.MOV", "a.mp4", "notes.txt"]);
        let opened = Arc::new(Mutex::new(Vec::new()));

        let results = batch(&opened, None)
            .execute(
                input.path(),
                Path::new("output_videos"),
                &KnownIdentitySet::empty(),
                2,
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.result.as_ref().unwrap().frames_written == 4));
        assert_eq!(
            opened.lock().unwrap().as_slice(),
            [
                PathBuf::from("output_videos/a.mp4"),
                PathBuf::from("output_videos/b.MOV")
            ]
        );
    }

    #[test]
    fn test_continues_after_failed_video() {
        let input = input_dir(&["a.mp4", "broken.mp4", "c.mp4"]);
        let opened = Arc::new(Mutex::new(Vec::new()));

        let results = batch(&opened, None)
            .execute(
                input.path(),
                Path::new("out"),
                &KnownIdentitySet::empty(),
                2,
                &CancellationToken::new(),
            )
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(matches!(results[1].result, Err(PipelineError::SourceOpen(_))));
        assert!(results[2].result.is_ok());
        assert_eq!(opened.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_cancellation_stops_before_next_video() {
        let input = input_dir(&["a.mp4", "b.mp4", "c.mp4"]);
        let opened = Arc::new(Mutex::new(Vec::new()));
        let cancel = CancellationToken::new();

        let results = batch(&opened, Some(cancel.clone()))
            .execute(
                input.path(),
                Path::new("out"),
                &KnownIdentitySet::empty(),
                1,
                &cancel,
            )
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].result.as_ref().unwrap().cancelled);
    }

    #[test]
    fn test_missing_input_directory_is_empty_batch() {
        let opened = Arc::new(Mutex::new(Vec::new()));
        let results = batch(&opened, None)
            .execute(
                Path::new("/nonexistent/videos"),
                Path::new("out"),
                &KnownIdentitySet::empty(),
                2,
                &CancellationToken::new(),
            )
            .unwrap();
        assert!(results.is_empty());
    }
}
