//! Background document jobs
//!
//! Imports and exports run one at a time on a worker thread so the UI keeps
//! drawing while a conversion upload or image fetch is in progress.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use crate::config::Config;
use crate::export::{ExportFormat, Exporter};
use crate::import::{AssetSource, Converter, FallbackConverter, ImportedDocument, Importer, Preset};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentJob {
    LoadPreset(Preset),
    Upload(PathBuf),
    Export { format: ExportFormat, html: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Loaded(ImportedDocument),
    /// Upload refused; shown as a blocking alert
    Rejected(String),
    LoadFailed(String),
    Exported { format: ExportFormat, path: PathBuf },
    ExportFailed { format: ExportFormat, error: String },
}

/// Spawn the jobs worker thread
///
/// The thread exits when the job channel is closed.
pub fn spawn_jobs_worker(
    config: &Config,
    job_rx: Receiver<DocumentJob>,
    event_tx: Sender<DocumentEvent>,
) -> std::io::Result<std::thread::JoinHandle<()>> {
    let client = reqwest::Client::new();
    let importer = Importer::new(
        FallbackConverter::from_config(client.clone(), &config.convert),
        AssetSource::parse(&config.import.assets_dir),
        client.clone(),
    );
    let exporter = Exporter::new(&config.export, client);

    std::thread::Builder::new()
        .name("document-jobs".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    log::error!("Failed to start jobs runtime: {}", e);
                    return;
                }
            };

            while let Ok(job) = job_rx.recv() {
                let event = runtime.block_on(run_job(&importer, &exporter, job));
                if event_tx.send(event).is_err() {
                    break;
                }
            }
            log::debug!("Jobs worker shutting down");
        })
}

/// Run one job to completion and describe the outcome
pub async fn run_job<C: Converter>(
    importer: &Importer<C>,
    exporter: &Exporter,
    job: DocumentJob,
) -> DocumentEvent {
    match job {
        DocumentJob::LoadPreset(preset) => match importer.load_preset(preset).await {
            Ok(doc) => DocumentEvent::Loaded(doc),
            Err(e) => {
                log::error!("Loading preset {} failed: {}", preset.name(), e);
                DocumentEvent::LoadFailed(e.to_string())
            }
        },
        DocumentJob::Upload(path) => match importer.load_upload(&path).await {
            Ok(doc) => DocumentEvent::Loaded(doc),
            Err(e) if e.is_rejection() => {
                log::warn!("Rejected upload {}", path.display());
                DocumentEvent::Rejected(e.to_string())
            }
            Err(e) => {
                log::error!("Uploading {} failed: {}", path.display(), e);
                DocumentEvent::LoadFailed(e.to_string())
            }
        },
        DocumentJob::Export { format, html } => match exporter.export(format, &html).await {
            Ok(path) => DocumentEvent::Exported { format, path },
            Err(e) => {
                log::error!("{} export failed: {}", format, e);
                DocumentEvent::ExportFailed {
                    format,
                    error: e.to_string(),
                }
            }
        },
    }
}

/// UI side of the jobs worker
#[derive(Default)]
pub struct JobQueue {
    job_tx: Option<Sender<DocumentJob>>,
    event_rx: Option<Receiver<DocumentEvent>>,
    pending: usize,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_channels(&mut self, job_tx: Sender<DocumentJob>, event_rx: Receiver<DocumentEvent>) {
        self.job_tx = Some(job_tx);
        self.event_rx = Some(event_rx);
    }

    /// Queue a job; false when no worker is attached
    pub fn submit(&mut self, job: DocumentJob) -> bool {
        let Some(tx) = &self.job_tx else {
            log::warn!("No jobs worker, dropping {:?}", job_kind(&job));
            return false;
        };
        if tx.send(job).is_err() {
            log::warn!("Jobs worker is gone");
            self.job_tx = None;
            return false;
        }
        self.pending += 1;
        true
    }

    pub fn is_busy(&self) -> bool {
        self.pending > 0
    }

    /// Drain finished jobs without blocking
    pub fn poll(&mut self) -> Vec<DocumentEvent> {
        let mut events = Vec::new();
        let Some(rx) = &self.event_rx else {
            return events;
        };

        loop {
            match rx.try_recv() {
                Ok(event) => {
                    self.pending = self.pending.saturating_sub(1);
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.event_rx = None;
                    self.pending = 0;
                    break;
                }
            }
        }
        events
    }
}

fn job_kind(job: &DocumentJob) -> &'static str {
    match job {
        DocumentJob::LoadPreset(_) => "preset load",
        DocumentJob::Upload(_) => "upload",
        DocumentJob::Export { .. } => "export",
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod jobs_tests;
