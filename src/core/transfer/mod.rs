//! # Transfer Module
//!
//! Executes a scan plan: copies uploads and overwrites into their date
//! folders, one file at a time, in plan order.
//!
//! ## Control
//! A [`TransferControl`] handle is created by the caller and shared with the
//! executor. Pause, resume and cancel requests are picked up between files;
//! a copy that is already running always finishes first.

mod control;
mod executor;

pub use control::{TransferControl, TransferState};
pub use executor::{FileOutcome, TransferExecutor, TransferReport, DEFAULT_POLL_INTERVAL};
