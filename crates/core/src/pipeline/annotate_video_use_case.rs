use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::annotator::Annotator;
use crate::rendering::domain::frame_renderer::FrameRenderer;
use crate::shared::frame::Frame;
use crate::shared::identity::KnownIdentitySet;
use crate::video::domain::video_reader::{SourceError, VideoReader};
use crate::video::domain::video_writer::VideoWriter;

use super::cancellation::CancellationToken;
use super::chunker::partition;
use super::error::PipelineError;
use super::pipeline_executor::PipelineExecutor;
use super::pipeline_logger::PipelineLogger;
use super::reassembler::reassemble;
use super::result_set::ResultSet;
use super::run_report::RunReport;

/// Annotates one video: read every frame, fan the frames out to workers,
/// put them back in order and encode the result.
///
/// This is a single-use struct: `execute` consumes the reader and writer,
/// so calling it twice fails with [`PipelineError::AlreadyExecuted`].
pub struct AnnotateVideoUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    annotator: Arc<dyn Annotator>,
    renderer: Arc<dyn FrameRenderer>,
    executor: Arc<dyn PipelineExecutor>,
    logger: Box<dyn PipelineLogger>,
}

impl AnnotateVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        annotator: Arc<dyn Annotator>,
        renderer: Arc<dyn FrameRenderer>,
        executor: Arc<dyn PipelineExecutor>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            annotator,
            renderer,
            executor,
            logger,
        }
    }

    /// Runs the pipeline from `input` to `output`.
    ///
    /// Per-frame failures end up as warnings in the report. Cancellation
    /// stops workers at the next frame boundary; frames finished by then
    /// are still written. When cancellation arrives while frames are
    /// still being read, no output is created.
    pub fn execute(
        &mut self,
        input: &Path,
        output: &Path,
        known: &KnownIdentitySet,
        worker_count: usize,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        if worker_count == 0 {
            return Err(PipelineError::InvalidWorkerCount(worker_count));
        }
        let mut reader = self.reader.take().ok_or(PipelineError::AlreadyExecuted)?;
        let mut writer = self.writer.take().ok_or(PipelineError::AlreadyExecuted)?;

        let mut metadata = reader.open(input).map_err(PipelineError::SourceOpen)?;
        let read = read_all_frames(reader.as_mut(), cancel);
        reader.close();
        let frames = read.map_err(PipelineError::SourceRead)?;

        let mut report = RunReport {
            frames_read: frames.len(),
            ..RunReport::default()
        };
        self.logger.info(&format!(
            "Read {} frames from {} ({}x{} @ {:.2} fps)",
            frames.len(),
            input.display(),
            metadata.width,
            metadata.height,
            metadata.fps
        ));

        if cancel.is_cancelled() {
            report.cancelled = true;
            self.logger.info(&report.status_text());
            return Ok(report);
        }

        metadata.total_frames = frames.len();
        let chunks = partition(frames, worker_count);
        let results = ResultSet::new();
        self.logger.info(&format!(
            "Annotating with {} workers, {} known identities",
            chunks.len(),
            known.len()
        ));

        report.warnings = self.executor.execute(
            chunks,
            self.annotator.as_ref(),
            self.renderer.as_ref(),
            known,
            &results,
            cancel,
            self.logger.as_mut(),
        );
        report.cancelled = cancel.is_cancelled();
        for warning in &report.warnings {
            self.logger.warning(warning);
        }

        writer
            .open(output, &metadata)
            .map_err(PipelineError::SinkCreation)?;
        report.output = Some(output.to_path_buf());

        for annotated in reassemble(results) {
            if let Err(e) = writer.write(&annotated.frame) {
                let _ = writer.close();
                return Err(PipelineError::SinkWrite(e));
            }
            report.frames_written += 1;
        }
        writer.close().map_err(PipelineError::SinkWrite)?;

        self.logger.info(&report.status_text());
        self.logger.summary();
        Ok(report)
    }
}

/// Pulls every frame from an opened reader, checking for cancellation
/// between reads.
fn read_all_frames(
    reader: &mut dyn VideoReader,
    cancel: &CancellationToken,
) -> Result<Vec<Frame>, SourceError> {
    let mut frames = Vec::new();
    for frame in reader.frames() {
        if cancel.is_cancelled() {
            log::debug!("Cancelled after reading {} frames", frames.len());
            break;
        }
        frames.push(frame?);
    }
    Ok(frames)
}
