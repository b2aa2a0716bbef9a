use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use crate::drivers::export::{CaptureExporter, ExportOutcome};
use crate::drivers::pipeline::ExportSettings;
use crate::drivers::plot::SpectrogramRenderer;
use crate::drivers::{CaptureError, CaptureWindow};
#[derive(Clone, Debug)]
pub struct ExportJob {
    pub id: u64,
    pub window: CaptureWindow,
    pub settings: ExportSettings,
    /// Jobs still queued past this instant are skipped.
    pub deadline: Instant,
}
/// What one capture produced. The CSV and the graph fail independently.
#[derive(Debug)]
pub struct ExportReport {
    pub id: u64,
    pub csv: Result<ExportOutcome, CaptureError>,
    pub graph: Result<ExportOutcome, CaptureError>,
}
impl ExportReport {
    pub fn succeeded(&self) -> bool {
        self.csv.is_ok() && self.graph.is_ok()
    }
    pub fn nothing_exported(&self) -> bool {
        matches!(
            (&self.csv, &self.graph),
            (Ok(ExportOutcome::NothingToExport), Ok(ExportOutcome::NothingToExport))
        )
    }
}
#[derive(Debug)]
pub enum WorkerEvent {
    Finished(ExportReport),
    TimedOut { id: u64, after: Duration },
}
/// Writes the CSV and then the graph for one job.
pub fn run_export(job: &ExportJob, renderer: &SpectrogramRenderer) -> ExportReport {
    let folder = &job.settings.folder;
    if let Err(err) = fs::create_dir_all(folder) {
        log::warn!("could not create {}: {err}", folder.display());
    }
    let csv = CaptureExporter::new(job.settings.csv_stem.as_str()).export(&job.window, folder);
    let graph = renderer.render(&job.window, folder, &job.settings.graph_name);
    ExportReport {
        id: job.id,
        csv,
        graph,
    }
}
/// Single background thread that runs exports one at a time.
///
/// Running every export through one thread keeps the folder scan and the file write of
/// one job from interleaving with another job's. A job that is still queued when its
/// deadline passes or the worker is dropped never runs.
pub struct ExportWorker {
    jobs: Option<Sender<ExportJob>>,
    shutdown: Arc<AtomicBool>,
    reports: Receiver<ExportReport>,
    pending: Vec<(u64, Instant)>,
    next_id: u64,
    timeout: Duration,
    handle: Option<JoinHandle<()>>,
}
impl ExportWorker {
    pub fn spawn(timeout: Duration) -> Self {
        let renderer = SpectrogramRenderer::default();
        Self::spawn_with(timeout, move |job| run_export(job, &renderer))
    }
    pub fn spawn_with<F>(timeout: Duration, mut run: F) -> Self
    where
        F: FnMut(&ExportJob) -> ExportReport + Send + 'static,
    {
        let (job_tx, job_rx) = channel::<ExportJob>();
        let (report_tx, report_rx) = channel::<ExportReport>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let handle = thread::spawn(move || {
            for job in job_rx {
                if stop.load(Ordering::Acquire) {
                    log::info!("export worker stopping, skipping queued job {}", job.id);
                    break;
                }
                if Instant::now() >= job.deadline {
                    log::warn!("export job {} expired in the queue, skipped", job.id);
                    continue;
                }
                log::debug!("export job {} started ({} samples)", job.id, job.window.len());
                if report_tx.send(run(&job)).is_err() {
                    break;
                }
            }
        });
        Self {
            jobs: Some(job_tx),
            shutdown,
            reports: report_rx,
            pending: Vec::new(),
            next_id: 1,
            timeout,
            handle: Some(handle),
        }
    }
    pub fn submit(
        &mut self,
        window: CaptureWindow,
        settings: ExportSettings,
    ) -> Result<u64, CaptureError> {
        let id = self.next_id;
        let deadline = Instant::now() + self.timeout;
        let jobs = self.jobs.as_ref().ok_or(CaptureError::WorkerGone)?;
        jobs.send(ExportJob {
            id,
            window,
            settings,
            deadline,
        })
        .map_err(|_| CaptureError::WorkerGone)?;
        self.next_id += 1;
        self.pending.push((id, deadline));
        Ok(id)
    }
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
    /// Collects finished reports and expires jobs past their deadline. Never blocks.
    pub fn poll(&mut self) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        loop {
            match self.reports.try_recv() {
                Ok(report) => {
                    let before = self.pending.len();
                    self.pending.retain(|(id, _)| *id != report.id);
                    if self.pending.len() == before {
                        log::warn!("export job {} finished after its deadline", report.id);
                        continue;
                    }
                    events.push(WorkerEvent::Finished(report));
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        let now = Instant::now();
        let timeout = self.timeout;
        self.pending.retain(|&(id, deadline)| {
            if deadline <= now {
                events.push(WorkerEvent::TimedOut { id, after: timeout });
                false
            } else {
                true
            }
        });
        events
    }
}
impl Drop for ExportWorker {
    fn drop(&mut self) {
        // The running export completes; everything still queued is skipped.
        self.shutdown.store(true, Ordering::Release);
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
