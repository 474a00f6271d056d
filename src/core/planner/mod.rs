//! # Planner Module
//!
//! Decides, per file, whether to upload, overwrite or skip.
//!
//! Each file goes to `<destination>/<YYYY-MM-DD>/<file name>`. The
//! destination is looked up live for every file:
//!
//! | destination file | same size | overwrite on | disposition |
//! |------------------|-----------|--------------|-------------|
//! | missing          | -         | -            | upload      |
//! | present          | yes       | -            | skip        |
//! | present          | no        | yes          | overwrite   |
//! | present          | no        | no           | skip        |
//!
//! Equal size is treated as equal content. No bytes are compared, so two
//! different files of the same length are considered duplicates.

use crate::core::media::{Disposition, MediaDescriptor};
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanProgress};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The fixed transfer plan produced by a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    pub id: Uuid,
    pub destination_root: PathBuf,
    pub overwrite_duplicates: bool,
    pub total: usize,
    pub will_upload: usize,
    pub will_overwrite: usize,
    pub will_skip: usize,
    /// Bytes that will be written by uploads and overwrites
    pub bytes_to_transfer: u64,
    /// Annotated descriptors, in scan order
    pub descriptors: Vec<MediaDescriptor>,
}

impl ScanSummary {
    /// Files that will be written to the destination
    pub fn pending_writes(&self) -> usize {
        self.will_upload + self.will_overwrite
    }

    /// Whether every file already exists at the destination
    pub fn is_up_to_date(&self) -> bool {
        self.pending_writes() == 0
    }
}

/// Computes destination paths and dispositions
pub struct ReconciliationPlanner;

impl ReconciliationPlanner {
    /// Plan without progress reporting
    pub fn plan(
        descriptors: &[MediaDescriptor],
        destination_root: &Path,
        overwrite_duplicates: bool,
    ) -> ScanSummary {
        Self::plan_with_events(
            descriptors,
            destination_root,
            overwrite_duplicates,
            &null_sender(),
        )
    }

    /// Plan with throttled progress reporting.
    ///
    /// The input descriptors are not modified; annotated copies are returned
    /// in the summary. Nothing is written to the destination.
    pub fn plan_with_events(
        descriptors: &[MediaDescriptor],
        destination_root: &Path,
        overwrite_duplicates: bool,
        events: &EventSender,
    ) -> ScanSummary {
        let total = descriptors.len();
        let mut planned = Vec::with_capacity(total);
        let mut will_upload = 0;
        let mut will_overwrite = 0;
        let mut will_skip = 0;
        let mut bytes_to_transfer = 0u64;

        for (i, descriptor) in descriptors.iter().enumerate() {
            if i % crate::core::catalog::PROGRESS_EVERY == 0 {
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    current: i,
                    total,
                    label: format!("Analyzing file: {}", descriptor.file_name()),
                })));
            }

            let destination = Self::destination_for(descriptor, destination_root);
            let disposition =
                Self::classify(descriptor.size_bytes(), &destination, overwrite_duplicates);

            match disposition {
                Disposition::WillUpload => will_upload += 1,
                Disposition::WillOverwrite => will_overwrite += 1,
                _ => will_skip += 1,
            }
            if disposition.writes() {
                bytes_to_transfer += descriptor.size_bytes();
            }

            let mut annotated = descriptor.clone();
            if !annotated.classify(destination, disposition) {
                tracing::warn!(
                    "{} was already planned, keeping its earlier decision",
                    descriptor.source_path().display()
                );
            }
            planned.push(annotated);
        }

        tracing::info!(
            "Plan: {} files, {} to upload, {} to overwrite, {} to skip",
            total,
            will_upload,
            will_overwrite,
            will_skip
        );

        ScanSummary {
            id: Uuid::new_v4(),
            destination_root: destination_root.to_path_buf(),
            overwrite_duplicates,
            total,
            will_upload,
            will_overwrite,
            will_skip,
            bytes_to_transfer,
            descriptors: planned,
        }
    }

    /// `<root>/<YYYY-MM-DD>/<file name>`
    pub fn destination_for(descriptor: &MediaDescriptor, destination_root: &Path) -> PathBuf {
        destination_root
            .join(descriptor.date_folder())
            .join(descriptor.file_name())
    }

    /// Compare a source size against whatever is at `destination` right now
    pub fn classify(
        source_size: u64,
        destination: &Path,
        overwrite_duplicates: bool,
    ) -> Disposition {
        let existing = match fs::metadata(destination) {
            Ok(meta) => meta.len(),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    tracing::debug!("Treating {} as absent: {}", destination.display(), e);
                }
                return Disposition::WillUpload;
            }
        };

        if existing == source_size {
            Disposition::WillSkip
        } else if overwrite_duplicates {
            Disposition::WillOverwrite
        } else {
            Disposition::WillSkip
        }
    }
}
