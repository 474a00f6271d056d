//! Event type definitions for progress reporting.

use crate::core::planner::ScanSummary;
use crate::core::transfer::TransferState;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by scan and transfer jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scan job events (catalog + planning)
    Scan(ScanEvent),
    /// Transfer job events
    Transfer(TransferEvent),
}

/// Events during a scan job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started {
        source: PathBuf,
        destination: PathBuf,
    },
    /// Throttled progress update
    Progress(ScanProgress),
    /// A file was dropped from the results but scanning continues
    FileSkipped { path: PathBuf, message: String },
    /// The plan is ready
    Completed { summary: ScanSummary },
    /// The job could not start or was cancelled
    Failed { message: String },
}

/// Progress information during scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Index of the file being looked at
    pub current: usize,
    /// Number of files in the current phase
    pub total: usize,
    /// Human readable description of the current file
    pub label: String,
}

/// Events during a transfer job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransferEvent {
    /// Transfer has started
    Started { total: usize },
    /// A file was finished with (copied, skipped or failed)
    Progress(TransferProgress),
    /// Human readable status line
    Status { message: String },
    /// Outcome of one plan entry
    FileProcessed {
        index: usize,
        path: PathBuf,
        success: bool,
    },
    /// The executor moved to a new state
    StateChanged { state: TransferState },
    /// Terminal signal, sent for both natural completion and cancellation
    Completed { cancelled: bool },
    /// The job could not start
    Failed { message: String },
}

/// Progress information during a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferProgress {
    /// Files finished so far
    pub processed: usize,
    /// Files in the plan
    pub total: usize,
}

impl TransferProgress {
    /// Completion fraction in `0.0..=1.0`
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Scan(ScanEvent::Progress(ScanProgress {
            current: 10,
            total: 50,
            label: "Reading media info: IMG_0001.jpg".to_string(),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Scan(ScanEvent::Progress(p)) => {
                assert_eq!(p.total, 50);
                assert!(p.label.contains("IMG_0001.jpg"));
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn transfer_state_change_is_serializable() {
        let event = Event::Transfer(TransferEvent::StateChanged {
            state: TransferState::Paused,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("Paused"));
    }

    #[test]
    fn progress_fraction_handles_empty_plan() {
        let empty = TransferProgress {
            processed: 0,
            total: 0,
        };
        assert_eq!(empty.fraction(), 1.0);

        let half = TransferProgress {
            processed: 5,
            total: 10,
        };
        assert!((half.fraction() - 0.5).abs() < f64::EPSILON);
    }
}
