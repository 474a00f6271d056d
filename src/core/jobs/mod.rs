//! # Jobs Module
//!
//! Background workers for the two long-running operations.
//!
//! - [`ScanJob`]: validate roots, catalog the source, plan against the
//!   destination, finish with `ScanEvent::Completed`
//! - [`TransferJob`]: execute a plan under a [`TransferControl`]
//!
//! Each job owns one thread and reports through an [`EventSender`]. The
//! caller is expected to run at most one of each at a time.

use crate::core::catalog::{CatalogConfig, MediaCatalog};
use crate::core::planner::{ReconciliationPlanner, ScanSummary};
use crate::core::transfer::{TransferControl, TransferExecutor, TransferReport};
use crate::error::{ScanError, TransferError};
use crate::events::{Event, EventSender, ScanEvent, TransferEvent};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Everything a scan needs
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub source_root: PathBuf,
    pub destination_root: PathBuf,
    pub overwrite_duplicates: bool,
    pub catalog: CatalogConfig,
}

impl ScanRequest {
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination_root: impl Into<PathBuf>,
        overwrite_duplicates: bool,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            overwrite_duplicates,
            catalog: CatalogConfig::default(),
        }
    }
}

/// Run a scan on the current thread
pub fn run_scan(
    request: &ScanRequest,
    events: &EventSender,
    cancelled: Arc<AtomicBool>,
) -> Result<ScanSummary, ScanError> {
    let result = scan_and_plan(request, events, cancelled);

    match &result {
        Ok(summary) => events.send(Event::Scan(ScanEvent::Completed {
            summary: summary.clone(),
        })),
        Err(e) => {
            tracing::warn!("Scan did not complete: {}", e);
            events.send(Event::Scan(ScanEvent::Failed {
                message: e.to_string(),
            }));
        }
    }

    result
}

fn scan_and_plan(
    request: &ScanRequest,
    events: &EventSender,
    cancelled: Arc<AtomicBool>,
) -> Result<ScanSummary, ScanError> {
    if !request.source_root.exists() {
        return Err(ScanError::SourceNotFound {
            path: request.source_root.clone(),
        });
    }
    if !request.destination_root.is_dir() {
        return Err(ScanError::DestinationNotFound {
            path: request.destination_root.clone(),
        });
    }

    events.send(Event::Scan(ScanEvent::Started {
        source: request.source_root.clone(),
        destination: request.destination_root.clone(),
    }));

    let catalog =
        MediaCatalog::new(request.catalog.clone()).with_cancel_flag(cancelled.clone());
    let catalogued = catalog.scan_with_events(&request.source_root, events)?;

    if cancelled.load(Ordering::SeqCst) {
        return Err(ScanError::Cancelled);
    }

    Ok(ReconciliationPlanner::plan_with_events(
        &catalogued.descriptors,
        &request.destination_root,
        request.overwrite_duplicates,
        events,
    ))
}

/// A scan running on a background thread
pub struct ScanJob {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<Result<ScanSummary, ScanError>>,
}

impl ScanJob {
    /// Start scanning. Events go to `events`; the sender is dropped when the
    /// job ends, which closes the channel if it was the last one.
    pub fn spawn(request: ScanRequest, events: EventSender) -> Self {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let handle = thread::spawn(move || run_scan(&request, &events, flag));
        Self { cancelled, handle }
    }

    /// Ask the scan to stop. It ends with `ScanError::Cancelled`.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the plan
    pub fn join(self) -> Result<ScanSummary, ScanError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// A transfer running on a background thread
pub struct TransferJob {
    control: TransferControl,
    handle: JoinHandle<Result<TransferReport, TransferError>>,
}

impl TransferJob {
    /// Start executing `summary` with a fresh control handle
    pub fn spawn(summary: ScanSummary, events: EventSender) -> Self {
        Self::spawn_with_control(summary, events, TransferControl::new())
    }

    /// Start executing `summary` with a caller-supplied control handle
    pub fn spawn_with_control(
        summary: ScanSummary,
        events: EventSender,
        control: TransferControl,
    ) -> Self {
        let executor = TransferExecutor::new(control.clone());
        let handle = thread::spawn(move || {
            let result = executor.execute(&summary, &events);
            if let Err(e) = &result {
                tracing::warn!("Transfer did not start: {}", e);
                events.send(Event::Transfer(TransferEvent::Failed {
                    message: e.to_string(),
                }));
            }
            result
        });
        Self { control, handle }
    }

    /// Handle for pause / resume / cancel
    pub fn control(&self) -> &TransferControl {
        &self.control
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the report
    pub fn join(self) -> Result<TransferReport, TransferError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{null_sender, EventChannel};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn scan_requires_destination() {
        let source = TempDir::new().unwrap();
        let request = ScanRequest::new(source.path(), source.path().join("nas"), false);

        let result = run_scan(&request, &null_sender(), Arc::new(AtomicBool::new(false)));
        assert!(matches!(result, Err(ScanError::DestinationNotFound { .. })));
    }

    #[test]
    fn scan_job_reports_failure_event() {
        let dest = TempDir::new().unwrap();
        let request = ScanRequest::new("/nonexistent/source/777", dest.path(), false);

        let (sender, receiver) = EventChannel::new();
        let job = ScanJob::spawn(request, sender);
        let result = job.join();

        assert!(matches!(result, Err(ScanError::SourceNotFound { .. })));
        let events: Vec<Event> = receiver.iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Scan(ScanEvent::Failed { .. })));
    }

    #[test]
    fn scan_job_ends_with_summary() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"aaa").unwrap();
        fs::write(source.path().join("b.mp4"), b"bbbb").unwrap();

        let (sender, receiver) = EventChannel::new();
        let job = ScanJob::spawn(ScanRequest::new(source.path(), dest.path(), false), sender);
        let summary = job.join().unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.will_upload, 2);
        let last = receiver.iter().last().unwrap();
        assert!(matches!(last, Event::Scan(ScanEvent::Completed { .. })));
    }

    #[test]
    fn transfer_job_runs_plan() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"aaa").unwrap();

        let summary = run_scan(
            &ScanRequest::new(source.path(), dest.path(), false),
            &null_sender(),
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();

        let job = TransferJob::spawn(summary, null_sender());
        let report = job.join().unwrap();
        assert_eq!(report.copied, 1);
        assert!(!report.cancelled);
    }
}
