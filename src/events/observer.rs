//! Callback surface for front ends that prefer methods over matching events.

use super::{Event, ScanEvent, TransferEvent};
use crate::core::planner::ScanSummary;
use std::path::Path;

/// Receives job notifications as method calls.
///
/// Every method has an empty default so implementors only override what
/// they display. Calls happen on the thread that drains the receiver, in
/// the order the job emitted them.
pub trait JobObserver {
    fn on_scan_progress(&mut self, _current: usize, _total: usize, _label: &str) {}

    fn on_scan_warning(&mut self, _path: &Path, _message: &str) {}

    fn on_scan_complete(&mut self, _summary: &ScanSummary) {}

    fn on_transfer_progress(&mut self, _processed: usize, _total: usize) {}

    fn on_status_message(&mut self, _text: &str) {}

    fn on_file_processed(&mut self, _index: usize, _path: &Path, _success: bool) {}

    /// Terminal transfer signal. `cancelled` tells the two endings apart.
    fn on_transfer_complete(&mut self, _cancelled: bool) {}

    /// A job could not start (or a scan was cancelled)
    fn on_job_failed(&mut self, _message: &str) {}

    /// Route one event to the matching method
    fn handle(&mut self, event: &Event) {
        match event {
            Event::Scan(ScanEvent::Started { .. }) => {}
            Event::Scan(ScanEvent::Progress(p)) => {
                self.on_scan_progress(p.current, p.total, &p.label)
            }
            Event::Scan(ScanEvent::FileSkipped { path, message }) => {
                self.on_scan_warning(path, message)
            }
            Event::Scan(ScanEvent::Completed { summary }) => self.on_scan_complete(summary),
            Event::Scan(ScanEvent::Failed { message }) => self.on_job_failed(message),
            Event::Transfer(TransferEvent::Started { .. }) => {}
            Event::Transfer(TransferEvent::Progress(p)) => {
                self.on_transfer_progress(p.processed, p.total)
            }
            Event::Transfer(TransferEvent::Status { message }) => self.on_status_message(message),
            Event::Transfer(TransferEvent::FileProcessed {
                index,
                path,
                success,
            }) => self.on_file_processed(*index, path, *success),
            Event::Transfer(TransferEvent::StateChanged { .. }) => {}
            Event::Transfer(TransferEvent::Completed { cancelled }) => {
                self.on_transfer_complete(*cancelled)
            }
            Event::Transfer(TransferEvent::Failed { message }) => self.on_job_failed(message),
        }
    }
}
