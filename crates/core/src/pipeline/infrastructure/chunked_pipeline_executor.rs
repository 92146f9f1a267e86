use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crate::detection::domain::annotator::Annotator;
use crate::pipeline::cancellation::CancellationToken;
use crate::pipeline::chunker::Chunk;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor, WorkerStatus};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::result_set::{AnnotatedFrame, ResultSet};
use crate::pipeline::run_report::PipelineWarning;
use crate::rendering::domain::frame_renderer::FrameRenderer;
use crate::shared::frame::Frame;
use crate::shared::identity::KnownIdentitySet;

/// Runs every chunk on its own scoped OS thread.
///
/// All workers are spawned before any is joined. The calling thread drains
/// worker status updates into the logger until the last worker exits, then
/// joins them and collects their warnings.
pub struct ChunkedPipelineExecutor {
    config: PipelineConfig,
}

impl ChunkedPipelineExecutor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }
}

impl Default for ChunkedPipelineExecutor {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// Read-only state every worker borrows.
struct WorkerContext<'a> {
    annotator: &'a dyn Annotator,
    renderer: &'a dyn FrameRenderer,
    known: &'a KnownIdentitySet,
    results: &'a ResultSet,
    cancel: &'a CancellationToken,
    max_consecutive_failures: usize,
}

impl PipelineExecutor for ChunkedPipelineExecutor {
    fn execute(
        &self,
        chunks: Vec<Chunk>,
        annotator: &dyn Annotator,
        renderer: &dyn FrameRenderer,
        known: &KnownIdentitySet,
        results: &ResultSet,
        cancel: &CancellationToken,
        logger: &mut dyn PipelineLogger,
    ) -> Vec<PipelineWarning> {
        let total: usize = chunks.iter().map(Chunk::len).sum();
        let ctx = WorkerContext {
            annotator,
            renderer,
            known,
            results,
            cancel,
            max_consecutive_failures: self.config.max_consecutive_failures,
        };

        // Frames each worker has finished with, read back if it panics.
        let cursors: Vec<AtomicUsize> = chunks.iter().map(|_| AtomicUsize::new(0)).collect();
        let (status_tx, status_rx) = crossbeam_channel::unbounded::<WorkerStatus>();
        let mut warnings = Vec::new();

        std::thread::scope(|s| {
            let mut handles = Vec::with_capacity(chunks.len());

            for (chunk, cursor) in chunks.into_iter().zip(&cursors) {
                let id = chunk.id;
                let indices: Vec<usize> = chunk.frames.iter().map(Frame::index).collect();
                let tx = status_tx.clone();
                let ctx = &ctx;

                let spawned = std::thread::Builder::new()
                    .name(format!("chunk-{id}"))
                    .spawn_scoped(s, move || run_chunk(chunk, ctx, cursor, &tx));

                match spawned {
                    Ok(handle) => handles.push((id, indices, cursor, handle)),
                    Err(e) => warnings.push(PipelineWarning::ChunkAborted {
                        chunk: id,
                        skipped: indices,
                        reason: format!("failed to start worker: {e}"),
                    }),
                }
            }
            drop(status_tx);

            log::debug!("Started {} workers for {total} frames", handles.len());

            let mut handled = 0;
            for status in status_rx.iter() {
                handled += 1;
                match status {
                    WorkerStatus::Processed {
                        faces,
                        annotate_ms,
                        render_ms,
                        ..
                    } => {
                        logger.timing("annotate", annotate_ms);
                        logger.timing("render", render_ms);
                        logger.metric("faces", faces as f64);
                    }
                    WorkerStatus::Dropped { chunk, index } => {
                        log::debug!("Worker {chunk} dropped frame {index}");
                    }
                }
                logger.progress(handled, total);
            }

            for (id, indices, cursor, handle) in handles {
                match handle.join() {
                    Ok(mut chunk_warnings) => warnings.append(&mut chunk_warnings),
                    Err(payload) => {
                        let done = cursor.load(Ordering::Acquire).min(indices.len());
                        warnings.push(PipelineWarning::ChunkAborted {
                            chunk: id,
                            skipped: indices[done..].to_vec(),
                            reason: format!("worker panicked: {}", panic_message(&*payload)),
                        });
                    }
                }
            }
        });

        warnings
    }
}

/// Annotates and renders one chunk in order, stopping early on cancellation
/// or when the chunk has to be abandoned.
fn run_chunk(
    chunk: Chunk,
    ctx: &WorkerContext<'_>,
    cursor: &AtomicUsize,
    status: &crossbeam_channel::Sender<WorkerStatus>,
) -> Vec<PipelineWarning> {
    let id = chunk.id;
    let indices: Vec<usize> = chunk.frames.iter().map(Frame::index).collect();
    let mut warnings = Vec::new();
    let mut consecutive_failures = 0;

    for (pos, frame) in chunk.frames.into_iter().enumerate() {
        if ctx.cancel.is_cancelled() {
            log::debug!("Worker {id} observed cancellation before frame {}", frame.index());
            break;
        }
        let index = frame.index();
        let frame = match ctx.annotator.conversion() {
            Some(conversion) => frame.with_conversion(conversion),
            None => frame,
        };

        let annotate_start = Instant::now();
        let annotations = match ctx.annotator.annotate(&frame, ctx.known) {
            Ok(annotations) => {
                consecutive_failures = 0;
                annotations
            }
            Err(e) => {
                consecutive_failures += 1;
                warnings.push(PipelineWarning::FrameDropped {
                    index,
                    reason: e.to_string(),
                });
                let _ = status.send(WorkerStatus::Dropped { chunk: id, index });
                cursor.store(pos + 1, Ordering::Release);

                if ctx.max_consecutive_failures > 0
                    && consecutive_failures >= ctx.max_consecutive_failures
                    && pos + 1 < indices.len()
                {
                    warnings.push(PipelineWarning::ChunkAborted {
                        chunk: id,
                        skipped: indices[pos + 1..].to_vec(),
                        reason: format!("{consecutive_failures} consecutive detection failures"),
                    });
                    break;
                }
                continue;
            }
        };
        let annotate_ms = annotate_start.elapsed().as_secs_f64() * 1000.0;

        let render_start = Instant::now();
        let rendered = match ctx.renderer.render(&frame, &annotations) {
            Ok(rendered) => rendered,
            Err(e) => {
                warnings.push(PipelineWarning::ChunkAborted {
                    chunk: id,
                    skipped: indices[pos..].to_vec(),
                    reason: e.to_string(),
                });
                break;
            }
        };
        let render_ms = render_start.elapsed().as_secs_f64() * 1000.0;

        let faces = annotations.len();
        ctx.results.insert(AnnotatedFrame::new(rendered, faces));
        cursor.store(pos + 1, Ordering::Release);
        let _ = status.send(WorkerStatus::Processed {
            chunk: id,
            index,
            faces,
            annotate_ms,
            render_ms,
        });
    }

    warnings
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
