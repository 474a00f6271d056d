//! Executor for transfer plans.

use super::control::{TransferControl, TransferState};
use crate::core::media::{Disposition, MediaDescriptor};
use crate::core::planner::ScanSummary;
use crate::error::TransferError;
use crate::events::{Event, EventSender, TransferEvent, TransferProgress};
use serde::{Deserialize, Serialize};
use filetime::FileTime;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How often a paused transfer checks for resume or cancel
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What happened to one plan entry, by plan index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileOutcome {
    Copied,
    Overwritten,
    Skipped,
    Failed { message: String },
    /// The transfer was cancelled before reaching this file
    NotReached,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            FileOutcome::Copied | FileOutcome::Overwritten | FileOutcome::Skipped
        )
    }
}

/// Result of executing a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferReport {
    /// One entry per plan index
    pub outcomes: Vec<FileOutcome>,
    pub copied: usize,
    pub overwritten: usize,
    pub skipped: usize,
    pub failed: usize,
    pub bytes_copied: u64,
    pub duration_ms: u64,
    pub cancelled: bool,
}

impl TransferReport {
    /// Failure messages, in plan order
    pub fn errors(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                FileOutcome::Failed { message } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Runs a plan one file at a time
pub struct TransferExecutor {
    control: TransferControl,
    poll_interval: Duration,
}

impl TransferExecutor {
    pub fn new(control: TransferControl) -> Self {
        Self {
            control,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override how often a paused transfer polls for resume
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn control(&self) -> &TransferControl {
        &self.control
    }

    /// Execute a plan.
    ///
    /// Returns an error only if the destination root is missing, in which
    /// case nothing is started. Per-file failures are recorded in the report
    /// and the loop moves on.
    pub fn execute(
        &self,
        summary: &ScanSummary,
        events: &EventSender,
    ) -> Result<TransferReport, TransferError> {
        if !summary.destination_root.is_dir() {
            return Err(TransferError::DestinationNotFound {
                path: summary.destination_root.clone(),
            });
        }

        let start = Instant::now();
        let total = summary.descriptors.len();
        let mut report = TransferReport {
            outcomes: vec![FileOutcome::NotReached; total],
            copied: 0,
            overwritten: 0,
            skipped: 0,
            failed: 0,
            bytes_copied: 0,
            duration_ms: 0,
            cancelled: false,
        };

        tracing::info!(
            "Starting transfer of {} files into {}",
            total,
            summary.destination_root.display()
        );
        events.send(Event::Transfer(TransferEvent::Started { total }));
        send_status(events, format!("Starting transfer of {} media files...", total));
        self.change_state(TransferState::Running, events);

        let mut processed = 0usize;

        for (index, descriptor) in summary.descriptors.iter().enumerate() {
            if !self.wait_while_paused(events) || self.control.is_cancel_requested() {
                report.cancelled = true;
                break;
            }

            let outcome = match process_file(descriptor) {
                Ok(outcome) => {
                    send_status(events, success_message(descriptor, &outcome));
                    outcome
                }
                Err(e) => {
                    tracing::warn!("Failed to transfer {}: {}", descriptor.file_name(), e);
                    send_status(
                        events,
                        format!("Error processing {}: {}", descriptor.file_name(), e),
                    );
                    FileOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };

            match &outcome {
                FileOutcome::Copied => {
                    report.copied += 1;
                    report.bytes_copied += descriptor.size_bytes();
                }
                FileOutcome::Overwritten => {
                    report.overwritten += 1;
                    report.bytes_copied += descriptor.size_bytes();
                }
                FileOutcome::Skipped => report.skipped += 1,
                FileOutcome::Failed { .. } => report.failed += 1,
                FileOutcome::NotReached => {}
            }

            events.send(Event::Transfer(TransferEvent::FileProcessed {
                index,
                path: descriptor.source_path().to_path_buf(),
                success: outcome.is_success(),
            }));
            report.outcomes[index] = outcome;

            processed += 1;
            events.send(Event::Transfer(TransferEvent::Progress(TransferProgress {
                processed,
                total,
            })));
        }

        if report.cancelled {
            tracing::info!("Transfer cancelled after {} of {} files", processed, total);
            send_status(events, "Transfer cancelled".to_string());
            self.change_state(TransferState::Cancelled, events);
        } else {
            tracing::info!(
                "Transfer complete: {} copied, {} overwritten, {} skipped, {} failed",
                report.copied,
                report.overwritten,
                report.skipped,
                report.failed
            );
            send_status(events, "Transfer complete!".to_string());
            self.change_state(TransferState::Completed, events);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        events.send(Event::Transfer(TransferEvent::Completed {
            cancelled: report.cancelled,
        }));

        Ok(report)
    }

    /// Idle while a pause is requested. Returns `false` if cancelled meanwhile.
    fn wait_while_paused(&self, events: &EventSender) -> bool {
        if !self.control.is_pause_requested() {
            return true;
        }

        self.change_state(TransferState::Paused, events);
        send_status(events, "Transfer paused".to_string());

        while self.control.is_pause_requested() {
            if self.control.is_cancel_requested() {
                return false;
            }
            thread::sleep(self.poll_interval);
        }

        if self.control.is_cancel_requested() {
            return false;
        }

        self.change_state(TransferState::Running, events);
        send_status(events, "Resuming transfer...".to_string());
        true
    }

    fn change_state(&self, state: TransferState, events: &EventSender) {
        self.control.set_state(state);
        events.send(Event::Transfer(TransferEvent::StateChanged { state }));
    }
}

fn process_file(descriptor: &MediaDescriptor) -> Result<FileOutcome, TransferError> {
    let destination = match (descriptor.disposition(), descriptor.destination_path()) {
        (Disposition::WillSkip, _) => return Ok(FileOutcome::Skipped),
        (Disposition::WillUpload | Disposition::WillOverwrite, Some(dest)) => dest,
        _ => {
            return Err(TransferError::Unplanned {
                path: descriptor.source_path().to_path_buf(),
            })
        }
    };

    copy_preserving_times(descriptor.source_path(), destination)?;

    if descriptor.disposition() == Disposition::WillOverwrite {
        Ok(FileOutcome::Overwritten)
    } else {
        Ok(FileOutcome::Copied)
    }
}

/// Copy `source` to `destination` with the source's timestamps.
///
/// The bytes go to a hidden sibling first and are renamed into place, so the
/// destination is either the old file or the complete new one.
fn copy_preserving_times(source: &Path, destination: &Path) -> Result<(), TransferError> {
    let source_meta = fs::metadata(source).map_err(|_| TransferError::SourceMissing {
        path: source.to_path_buf(),
    })?;

    let parent = destination.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(parent).map_err(|e| TransferError::CreateDirectory {
        path: parent.to_path_buf(),
        source: e,
    })?;

    let staging = staging_path(destination);

    if let Err(e) = fs::copy(source, &staging) {
        let _ = fs::remove_file(&staging);
        return Err(TransferError::Copy {
            path: source.to_path_buf(),
            source: e,
        });
    }

    if let Err(e) = apply_times(&staging, &source_meta) {
        let _ = fs::remove_file(&staging);
        return Err(TransferError::PreserveTimes {
            path: destination.to_path_buf(),
            source: e,
        });
    }

    fs::rename(&staging, destination).map_err(|e| {
        let _ = fs::remove_file(&staging);
        TransferError::Finalize {
            path: destination.to_path_buf(),
            source: e,
        }
    })
}

/// Set times by path; a read-only copy cannot be opened for writing
fn apply_times(path: &Path, source_meta: &fs::Metadata) -> std::io::Result<()> {
    let modified = FileTime::from_last_modification_time(source_meta);
    let accessed = FileTime::from_last_access_time(source_meta);
    filetime::set_file_times(path, accessed, modified)
}

fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!(".{}.partial", name))
}

fn success_message(descriptor: &MediaDescriptor, outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Copied => format!(
            "Copied ({}): {} -> {}/",
            descriptor.media_kind(),
            descriptor.file_name(),
            descriptor.date_folder()
        ),
        FileOutcome::Overwritten => format!(
            "Overwrote ({}): {} -> {}/",
            descriptor.media_kind(),
            descriptor.file_name(),
            descriptor.date_folder()
        ),
        _ => format!(
            "Skipped ({}): {}",
            descriptor.media_kind(),
            descriptor.file_name()
        ),
    }
}

fn send_status(events: &EventSender, message: String) {
    events.send(Event::Transfer(TransferEvent::Status { message }));
}
