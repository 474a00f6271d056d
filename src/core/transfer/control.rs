//! Pause / resume / cancel handle shared between a caller and a transfer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of a transfer job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl TransferState {
    /// Whether the job has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Completed | TransferState::Cancelled)
    }

    fn as_u8(self) -> u8 {
        match self {
            TransferState::Idle => 0,
            TransferState::Running => 1,
            TransferState::Paused => 2,
            TransferState::Completed => 3,
            TransferState::Cancelled => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => TransferState::Running,
            2 => TransferState::Paused,
            3 => TransferState::Completed,
            4 => TransferState::Cancelled,
            _ => TransferState::Idle,
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferState::Idle => write!(f, "Idle"),
            TransferState::Running => write!(f, "Running"),
            TransferState::Paused => write!(f, "Paused"),
            TransferState::Completed => write!(f, "Completed"),
            TransferState::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug)]
struct ControlInner {
    pause_requested: AtomicBool,
    cancel_requested: AtomicBool,
    state: AtomicU8,
}

/// Cloneable handle for steering a running transfer.
///
/// Requests are flags; the executor polls them between files.
#[derive(Debug, Clone)]
pub struct TransferControl {
    inner: Arc<ControlInner>,
}

impl TransferControl {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ControlInner {
                pause_requested: AtomicBool::new(false),
                cancel_requested: AtomicBool::new(false),
                state: AtomicU8::new(TransferState::Idle.as_u8()),
            }),
        }
    }

    pub fn request_pause(&self) {
        self.inner.pause_requested.store(true, Ordering::SeqCst);
    }

    pub fn request_resume(&self) {
        self.inner.pause_requested.store(false, Ordering::SeqCst);
    }

    /// Cancellation is permanent for this handle
    pub fn request_cancel(&self) {
        self.inner.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_pause_requested(&self) -> bool {
        self.inner.pause_requested.load(Ordering::SeqCst)
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.inner.cancel_requested.load(Ordering::SeqCst)
    }

    /// State last reported by the executor
    pub fn state(&self) -> TransferState {
        TransferState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    pub(crate) fn set_state(&self, state: TransferState) {
        self.inner.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

impl Default for TransferControl {
    fn default() -> Self {
        Self::new()
    }
}
