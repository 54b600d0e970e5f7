//! Task queue and worker loops

use super::registry::TaskRegistry;
use super::QueueSettings;
use crate::core::exporters::ExporterSet;
use crate::domain::task::{PROGRESS_DISPATCHED, PROGRESS_PRODUCED};
use crate::domain::{ExportResult, ExportTask, QuireError, Result, TaskId};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::error::Elapsed;

/// Snapshot of queue activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Tasks waiting for a worker
    pub pending: usize,
    /// Tasks currently being exported
    pub in_progress: usize,
    /// Tasks finished with an output file
    pub completed: usize,
    /// Tasks finished with an error
    pub failed: usize,
    /// Highest number of exports observed running at once
    pub peak_in_progress: usize,
    /// Live worker loops
    pub workers: usize,
}

/// Tracks concurrent exports and their high-water mark
#[derive(Debug, Default)]
struct Occupancy {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Occupancy {
    fn enter(self: &Arc<Self>) -> OccupancyGuard {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        OccupancyGuard(Arc::clone(self))
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct OccupancyGuard(Arc<Occupancy>);

impl Drop for OccupancyGuard {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

/// State shared by every worker
#[derive(Clone)]
struct WorkerContext {
    settings: QueueSettings,
    registry: Arc<TaskRegistry>,
    exporters: Arc<ExporterSet>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<TaskId>>>,
    occupancy: Arc<Occupancy>,
    live_workers: Arc<AtomicUsize>,
}

/// Worker handles of the current run
#[derive(Default)]
struct WorkerSet {
    handles: Vec<JoinHandle<()>>,
    // Stop signal of the current run; each start() creates a new one
    shutdown: Option<watch::Sender<bool>>,
    // Workers that outlived the shutdown timeout of an earlier run
    stragglers: Vec<JoinHandle<()>>,
}

/// FIFO export queue served by a bounded pool of workers
pub struct TaskQueue {
    context: WorkerContext,
    sender: mpsc::UnboundedSender<TaskId>,
    workers: Mutex<WorkerSet>,
    running: AtomicBool,
    stopped: AtomicBool,
}

impl TaskQueue {
    /// Create a queue that has not been started yet
    ///
    /// Tasks added before [`Self::start`] wait in the queue.
    pub fn new(settings: QueueSettings, exporters: Arc<ExporterSet>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            context: WorkerContext {
                settings,
                registry: Arc::new(TaskRegistry::new()),
                exporters,
                receiver: Arc::new(Mutex::new(receiver)),
                occupancy: Arc::new(Occupancy::default()),
                live_workers: Arc::new(AtomicUsize::new(0)),
            },
            sender,
            workers: Mutex::new(WorkerSet::default()),
            running: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Queue settings
    pub fn settings(&self) -> &QueueSettings {
        &self.context.settings
    }

    /// Registry backing this queue
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.context.registry
    }

    /// Spawn the workers; does nothing if already running
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::WorkersStillRunning`] while workers of an
    /// earlier run are still finishing their last task.
    pub async fn start(&self) -> Result<()> {
        let mut workers = self.workers.lock().await;
        if !workers.handles.is_empty() {
            tracing::debug!("Task queue already running");
            return Ok(());
        }

        workers.stragglers.retain(|handle| !handle.is_finished());
        if !workers.stragglers.is_empty() {
            tracing::warn!(
                stragglers = workers.stragglers.len(),
                "Refusing to start while earlier workers are still running"
            );
            return Err(QuireError::WorkersStillRunning(workers.stragglers.len()));
        }

        let (shutdown, _) = watch::channel(false);
        for index in 0..self.context.settings.workers {
            let context = self.context.clone();
            workers
                .handles
                .push(tokio::spawn(run_worker(context, shutdown.subscribe(), index)));
        }
        workers.shutdown = Some(shutdown);
        self.stopped.store(false, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);

        tracing::info!(
            workers = self.context.settings.workers,
            "Task queue started"
        );
        Ok(())
    }

    /// Stop the workers; does nothing if not running
    ///
    /// Workers finish the task they are exporting and take no further work.
    /// Tasks still queued stay pending until the queue is started again.
    /// Workers still busy when `shutdown_timeout` elapses are logged and
    /// block the next [`Self::start`] until they exit.
    pub async fn stop(&self) {
        let mut workers = self.workers.lock().await;
        if workers.handles.is_empty() {
            return;
        }
        self.running.store(false, Ordering::SeqCst);
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(shutdown) = workers.shutdown.take() {
            shutdown.send_replace(true);
        }

        let deadline = tokio::time::Instant::now() + self.context.settings.shutdown_timeout;
        let handles: Vec<JoinHandle<()>> = workers.handles.drain(..).collect();
        let joins = handles.into_iter().enumerate().map(|(index, mut handle)| async move {
            let joined = tokio::time::timeout_at(deadline, &mut handle).await;
            match joined {
                Ok(Ok(())) => None,
                Ok(Err(e)) => {
                    tracing::error!(worker = index, error = %e, "Export worker aborted");
                    None
                }
                Err(_) => {
                    tracing::warn!(
                        worker = index,
                        "Export worker did not stop within the shutdown timeout"
                    );
                    Some(handle)
                }
            }
        });
        let stragglers: Vec<JoinHandle<()>> = futures::future::join_all(joins)
            .await
            .into_iter()
            .flatten()
            .collect();

        tracing::info!(
            stragglers = stragglers.len(),
            pending = self.context.registry.counts().pending,
            "Task queue stopped"
        );
        workers.stragglers.extend(stragglers);
    }

    /// Whether workers have been started and not stopped
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Register a pending task and enqueue it
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::QueueStopped`] after [`Self::stop`], until the
    /// queue is started again.
    pub fn add_task(&self, task: ExportTask) -> Result<TaskId> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(QuireError::QueueStopped);
        }

        let format = task.format;
        let report_id = task.report_id;
        let id = self.context.registry.insert(task);

        self.sender
            .send(id)
            .map_err(|_| QuireError::Other("Task queue is closed".to_string()))?;

        tracing::debug!(
            task_id = %id,
            report_id = %report_id,
            format = %format,
            "Export task queued"
        );
        Ok(id)
    }

    /// Fail every task still waiting in a stopped queue
    ///
    /// Each task passes through `InProgress` before failing with `reason`.
    /// Does nothing while the queue is running. Returns the number of tasks
    /// failed.
    pub async fn fail_queued(&self, reason: &str) -> usize {
        if self.is_running() {
            return 0;
        }

        let mut receiver = self.context.receiver.lock().await;
        let mut failed = 0;
        while let Ok(id) = receiver.try_recv() {
            let outcome = match self.context.registry.update(id, ExportTask::mark_started) {
                Some(Ok(())) => self
                    .context
                    .registry
                    .update(id, |task| task.mark_failed(reason)),
                other => other,
            };
            match outcome {
                Some(Ok(())) => failed += 1,
                Some(Err(e)) => {
                    tracing::debug!(task_id = %id, error = %e, "Queued task not failed");
                }
                None => {}
            }
        }

        if failed > 0 {
            tracing::warn!(failed, reason, "Failed queued export tasks");
        }
        failed
    }

    /// Current state of a task
    pub fn get_task_status(&self, id: TaskId) -> Option<ExportTask> {
        self.context.registry.snapshot(id)
    }

    /// Wait until the task reaches a terminal state or `timeout` elapses
    ///
    /// Returns the latest snapshot either way, or `None` for unknown ids.
    pub async fn wait_for_completion(&self, id: TaskId, timeout: Duration) -> Option<ExportTask> {
        let mut receiver = self.context.registry.subscribe(id)?;
        let timed_out =
            tokio::time::timeout(timeout, receiver.wait_for(|status| status.is_terminal()))
                .await
                .is_err();
        if timed_out {
            tracing::debug!(task_id = %id, "Timed out waiting for export task");
        }
        self.context.registry.snapshot(id)
    }

    /// Queue activity counters
    pub fn stats(&self) -> QueueStats {
        let counts = self.context.registry.counts();
        QueueStats {
            pending: counts.pending,
            in_progress: counts.in_progress,
            completed: counts.completed,
            failed: counts.failed,
            peak_in_progress: self.context.occupancy.peak(),
            workers: self.context.live_workers.load(Ordering::SeqCst),
        }
    }

    /// Evict terminal tasks older than the retention window
    pub fn purge_expired_tasks(&self) -> usize {
        self.context
            .registry
            .purge_expired(self.context.settings.task_retention)
    }
}

// A dropped sender also counts as a stop request
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

async fn next_task(context: &WorkerContext) -> std::result::Result<Option<TaskId>, Elapsed> {
    let mut receiver = context.receiver.lock().await;
    tokio::time::timeout(context.settings.queue_timeout, receiver.recv()).await
}

async fn run_worker(context: WorkerContext, mut shutdown: watch::Receiver<bool>, index: usize) {
    context.live_workers.fetch_add(1, Ordering::SeqCst);
    tracing::debug!(worker = index, "Export worker started");

    loop {
        // The stop signal wins over queued work
        let message = tokio::select! {
            biased;
            () = stop_requested(&mut shutdown) => break,
            message = next_task(&context) => message,
        };

        match message {
            Err(_) => {
                context
                    .registry
                    .purge_expired(context.settings.task_retention);
            }
            Ok(None) => break,
            Ok(Some(id)) => process_task(&context, index, id).await,
        }
    }

    context.live_workers.fetch_sub(1, Ordering::SeqCst);
    tracing::debug!(worker = index, "Export worker stopped");
}

async fn process_task(context: &WorkerContext, worker: usize, id: TaskId) {
    match context.registry.update(id, ExportTask::mark_started) {
        None => {
            tracing::warn!(worker, task_id = %id, "Dequeued unknown export task");
            return;
        }
        Some(Err(e)) => {
            tracing::warn!(worker, task_id = %id, error = %e, "Skipping export task");
            return;
        }
        Some(Ok(())) => {}
    }

    let _occupied = context.occupancy.enter();
    let Some(task) = context.registry.snapshot(id) else {
        return;
    };

    crate::log_export_start!(worker, id, task.report_id, task.format);
    let started = Instant::now();

    let result = if context.exporters.supports(task.format) {
        record_progress(context, id, PROGRESS_DISPATCHED);
        let result = dispatch(context, &task).await;
        record_progress(context, id, PROGRESS_PRODUCED);
        result
    } else {
        ExportResult::failure(QuireError::UnsupportedFormat(task.format).to_string())
    };

    let success = result.success;
    match context.registry.update(id, |t| t.apply_result(result)) {
        Some(Ok(())) => {
            crate::log_export_complete!(id, success, started.elapsed());
        }
        Some(Err(e)) => {
            crate::log_error_with_context!(e, "Could not record export outcome");
        }
        None => {
            tracing::warn!(worker, task_id = %id, "Export task evicted while running");
        }
    }
}

async fn dispatch(context: &WorkerContext, task: &ExportTask) -> ExportResult {
    let exporters = Arc::clone(&context.exporters);
    let payload = task.payload();
    let destination = task.destination().to_path_buf();
    let options = task.options.clone();
    let format = task.format;

    let outcome = tokio::task::spawn_blocking(move || match exporters.get(format) {
        Some(exporter) => exporter.produce(&payload, &destination, &options),
        None => ExportResult::failure(QuireError::UnsupportedFormat(format).to_string()),
    })
    .await;

    outcome.unwrap_or_else(|e| {
        tracing::error!(task_id = %task.id, error = %e, "Exporter panicked");
        ExportResult::failure(format!("Exporter panicked: {e}"))
    })
}

fn record_progress(context: &WorkerContext, id: TaskId, progress: f64) {
    if let Some(Err(e)) = context
        .registry
        .update(id, |t| t.record_progress(progress))
    {
        tracing::debug!(task_id = %id, error = %e, "Progress not recorded");
    }
}
