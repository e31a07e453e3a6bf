use crate::batch::{progress_percent, BatchJob, BatchSummary, ImageRecord, OutputPair};
use crate::canvas;
use crate::error::CompositorError;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Receives progress from a running batch and answers the overwrite question.
pub trait BatchObserver {
    /// Called once the file list is known, before any image is touched.
    fn on_started(&mut self, _job_id: Uuid, _total: usize) {}

    fn on_progress(&mut self, percent: u8);

    /// Called at most once per batch, when the output folder already exists.
    /// Returning `false` aborts the batch before anything is written.
    fn confirm_overwrite(&mut self, directory: &Path) -> bool;
}

#[derive(Debug)]
pub enum BatchEvent {
    Started { job_id: Uuid, total: usize },
    Progress(u8),
    ConfirmOverwrite {
        directory: PathBuf,
        reply: oneshot::Sender<bool>,
    },
    Complete(BatchSummary),
    Aborted(CompositorError),
}

/// Called after every event is queued, so an idle UI knows to look at the channel.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Forwards observer calls to the UI thread over a channel.
pub struct ChannelObserver {
    events: mpsc::UnboundedSender<BatchEvent>,
    waker: Waker,
}

impl ChannelObserver {
    pub fn new(events: mpsc::UnboundedSender<BatchEvent>, waker: Waker) -> Self {
        Self { events, waker }
    }

    fn send(&self, event: BatchEvent) -> bool {
        let sent = self.events.send(event).is_ok();
        (self.waker)();
        sent
    }
}

impl BatchObserver for ChannelObserver {
    fn on_started(&mut self, job_id: Uuid, total: usize) {
        self.send(BatchEvent::Started { job_id, total });
    }

    fn on_progress(&mut self, percent: u8) {
        self.send(BatchEvent::Progress(percent));
    }

    fn confirm_overwrite(&mut self, directory: &Path) -> bool {
        let (reply, answer) = oneshot::channel();
        let request = BatchEvent::ConfirmOverwrite {
            directory: directory.to_path_buf(),
            reply,
        };
        if !self.send(request) {
            return false;
        }
        // Blocks the worker until the user answers. A dropped reply counts as "no".
        answer.blocking_recv().unwrap_or(false)
    }
}

/// Run one batch to completion on the calling thread.
///
/// `progress` is the shared progress state; it is left at 0 when this returns, whatever the outcome.
pub fn run_batch(
    job: &mut BatchJob,
    observer: &mut dyn BatchObserver,
    progress: &AtomicU8,
) -> Result<BatchSummary, CompositorError> {
    let started_at = Utc::now();
    let result = process_files(job, observer, progress);
    progress.store(0, Ordering::Release);

    result.map(|outputs| BatchSummary {
        job_id: job.id,
        processed: outputs.len(),
        outputs,
        started_at,
        completed_at: Utc::now(),
    })
}

fn process_files(
    job: &mut BatchJob,
    observer: &mut dyn BatchObserver,
    progress: &AtomicU8,
) -> Result<Vec<OutputPair>, CompositorError> {
    let total = job.load_file_list()?;
    let job = &*job;
    info!(
        "[{}] {} image(s) found in {}",
        job.id,
        total,
        job.source_directory.display()
    );
    observer.on_started(job.id, total);

    if total == 0 {
        return Ok(Vec::new());
    }

    prepare_output_directory(&job.output_directory(), observer)?;

    let mut outputs = Vec::with_capacity(total);
    for (index, source_path) in job.file_list.iter().enumerate() {
        let pair = process_image(source_path, job)?;
        outputs.push(pair);

        let percent = progress_percent(index + 1, total);
        progress.store(percent, Ordering::Release);
        observer.on_progress(percent);
    }

    Ok(outputs)
}

/// Create the output folder, or ask before reusing one that is already there.
/// A non-directory in its place fails in `create_dir_all`.
fn prepare_output_directory(
    directory: &Path,
    observer: &mut dyn BatchObserver,
) -> Result<(), CompositorError> {
    if directory.is_dir() {
        warn!("Output folder already exists: {}", directory.display());
        if !observer.confirm_overwrite(directory) {
            info!("Overwrite declined, stopping batch");
            return Err(CompositorError::OverwriteDeclined {
                directory: directory.to_path_buf(),
            });
        }
        return Ok(());
    }

    fs::create_dir_all(directory).map_err(|source| CompositorError::Io {
        path: directory.to_path_buf(),
        source,
    })?;
    debug!("Created output folder: {}", directory.display());
    Ok(())
}

fn image_error(path: &Path) -> impl FnOnce(image::ImageError) -> CompositorError {
    let path = path.to_path_buf();
    move |source| CompositorError::ImageIo { path, source }
}

fn process_image(source_path: &Path, job: &BatchJob) -> Result<OutputPair, CompositorError> {
    let source = image::open(source_path).map_err(image_error(source_path))?;
    let record = ImageRecord::new(source_path.to_path_buf(), source.width(), source.height());
    debug!(
        "{}: {}x{} -> canvas width {} (offset {})",
        record.source_path.display(),
        record.original_width,
        record.original_height,
        record.canvas_width,
        record.offset_x()
    );

    let bordered = canvas::render_bordered(&source, job.border_color);
    let monochrome = canvas::render_monochrome(
        record.canvas_width,
        record.original_width,
        record.original_height,
    );

    let pair = OutputPair::for_source(source_path)?;
    bordered
        .save(&pair.bordered_path)
        .map_err(image_error(&pair.bordered_path))?;
    monochrome
        .save(&pair.monochrome_path)
        .map_err(image_error(&pair.monochrome_path))?;

    info!("[{}] Wrote {}", job.id, pair.bordered_path.display());
    Ok(pair)
}

/// Clears the busy flag when the worker finishes, including on panic.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs at most one batch at a time on a background worker and publishes its progress.
#[derive(Clone, Default)]
pub struct BorderCompositor {
    busy: Arc<AtomicBool>,
    progress: Arc<AtomicU8>,
}

impl BorderCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Latest published progress, 0-100.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Acquire)
    }

    /// Start `job` on the runtime's blocking pool.
    ///
    /// Every accepted job ends with exactly one `Complete` or `Aborted` event on `events`,
    /// and `waker` runs after each event is queued.
    pub fn start(
        &self,
        runtime: &Handle,
        mut job: BatchJob,
        events: mpsc::UnboundedSender<BatchEvent>,
        waker: Waker,
    ) -> Result<(), CompositorError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CompositorError::BatchAlreadyRunning);
        }
        if events.is_closed() {
            self.busy.store(false, Ordering::Release);
            return Err(CompositorError::WorkerUnavailable);
        }

        let guard = BusyGuard(self.busy.clone());
        let progress = self.progress.clone();

        runtime.spawn_blocking(move || {
            let mut observer = ChannelObserver::new(events, waker);
            let result = run_batch(&mut job, &mut observer, &progress);

            // Free the compositor before reporting, so a listener can start the next batch right away.
            drop(guard);

            let event = match result {
                Ok(summary) => {
                    info!("[{}] Batch complete: {} image(s)", summary.job_id, summary.processed);
                    BatchEvent::Complete(summary)
                }
                Err(e) => {
                    if e.is_cancellation() {
                        info!("[{}] {}", job.id, e);
                    } else {
                        error!("[{}] Batch failed: {}", job.id, e);
                    }
                    BatchEvent::Aborted(e)
                }
            };
            observer.send(event);
        });

        Ok(())
    }
}
