//! # Catalog Module
//!
//! Discovers photos and videos under a source directory and reads their
//! capture dates.
//!
//! ## Phases
//! 1. Walk the tree and collect every regular file
//! 2. Keep files with a supported extension ("checking file type")
//! 3. Re-check each file still exists, snapshot its size and read its
//!    capture time ("reading media info")
//!
//! Progress is reported at most once every [`PROGRESS_EVERY`] files. A file
//! that disappears or cannot be read is dropped with a warning; the scan
//! carries on.

mod filter;

pub use filter::MediaFilter;

use crate::core::media::MediaDescriptor;
use crate::core::metadata;
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanProgress};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use walkdir::WalkDir;

/// Files between two progress events
pub const PROGRESS_EVERY: usize = 10;

/// Configuration for the catalog walk
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Whether to follow symbolic links to directories
    pub follow_symlinks: bool,
    /// Whether to include hidden files and everything under hidden folders
    pub include_hidden: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
        }
    }
}

/// Result of cataloguing a source tree
#[derive(Debug)]
pub struct CatalogResult {
    /// Media files in enumeration order
    pub descriptors: Vec<MediaDescriptor>,
    /// Files that were dropped, and why
    pub warnings: Vec<ScanError>,
}

/// Walks a source tree and builds media descriptors
pub struct MediaCatalog {
    config: CatalogConfig,
    filter: MediaFilter,
    cancelled: Arc<AtomicBool>,
}

impl MediaCatalog {
    /// Create a new catalog with the given configuration
    pub fn new(config: CatalogConfig) -> Self {
        let filter = MediaFilter::new().with_hidden(config.include_hidden);
        Self {
            config,
            filter,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share a cancellation flag with the caller
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Scan without progress reporting
    pub fn scan(&self, source_root: &Path) -> Result<CatalogResult, ScanError> {
        self.scan_with_events(source_root, &null_sender())
    }

    /// Scan with progress reporting via events
    pub fn scan_with_events(
        &self,
        source_root: &Path,
        events: &EventSender,
    ) -> Result<CatalogResult, ScanError> {
        if !source_root.exists() {
            return Err(ScanError::SourceNotFound {
                path: source_root.to_path_buf(),
            });
        }
        if !source_root.is_dir() {
            return Err(ScanError::NotADirectory {
                path: source_root.to_path_buf(),
            });
        }

        let mut warnings = Vec::new();

        let all_files = self.enumerate(source_root, events, &mut warnings)?;
        tracing::info!(
            "Found {} files under {}",
            all_files.len(),
            source_root.display()
        );

        let media_paths = self.select_media(&all_files, events)?;
        let descriptors = self.describe(&media_paths, events, &mut warnings)?;

        tracing::info!(
            "Catalogued {} media files ({} dropped)",
            descriptors.len(),
            warnings.len()
        );

        Ok(CatalogResult {
            descriptors,
            warnings,
        })
    }

    fn enumerate(
        &self,
        root: &Path,
        events: &EventSender,
        warnings: &mut Vec<ScanError>,
    ) -> Result<Vec<PathBuf>, ScanError> {
        let mut files = Vec::new();
        let include_hidden = self.config.include_hidden;
        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .into_iter()
            // Hidden folders are pruned whole, never the root itself
            .filter_entry(move |entry| {
                include_hidden || entry.depth() == 0 || !is_hidden(entry.file_name())
            });

        for entry_result in walker {
            self.check_cancelled()?;

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
                    let error = ScanError::ReadDirectory { path, source };
                    report_skipped(events, &error);
                    warnings.push(error);
                }
            }
        }

        Ok(files)
    }

    fn select_media(
        &self,
        files: &[PathBuf],
        events: &EventSender,
    ) -> Result<Vec<PathBuf>, ScanError> {
        let mut media = Vec::new();

        for (i, path) in files.iter().enumerate() {
            self.check_cancelled()?;

            if i % PROGRESS_EVERY == 0 {
                send_progress(events, i, files.len(), "Checking file type", path);
            }

            if self.filter.should_include(path) {
                media.push(path.clone());
            }
        }

        Ok(media)
    }

    fn describe(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
        warnings: &mut Vec<ScanError>,
    ) -> Result<Vec<MediaDescriptor>, ScanError> {
        let mut descriptors = Vec::with_capacity(paths.len());

        for (i, path) in paths.iter().enumerate() {
            self.check_cancelled()?;

            if i % PROGRESS_EVERY == 0 {
                send_progress(events, i, paths.len(), "Reading media info", path);
            }

            match describe_file(path, &self.filter) {
                Ok(descriptor) => {
                    tracing::debug!(
                        "{} captured {}",
                        path.display(),
                        descriptor.capture_timestamp()
                    );
                    descriptors.push(descriptor);
                }
                Err(error) => {
                    report_skipped(events, &error);
                    warnings.push(error);
                }
            }
        }

        Ok(descriptors)
    }

    fn check_cancelled(&self) -> Result<(), ScanError> {
        if self.cancelled.load(Ordering::SeqCst) {
            Err(ScanError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for MediaCatalog {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}

/// Build the descriptor for one file, re-validating it first
fn describe_file(path: &Path, filter: &MediaFilter) -> Result<MediaDescriptor, ScanError> {
    // The source tree may change under us between enumeration and here
    if !path.exists() {
        return Err(ScanError::FileVanished {
            path: path.to_path_buf(),
        });
    }

    let kind = filter.kind_of(path).ok_or_else(|| ScanError::ReadMetadata {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "unsupported extension"),
    })?;

    let size = fs::metadata(path)
        .map_err(|e| ScanError::ReadMetadata {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();

    let captured = metadata::extract_capture_time(path, Some(kind))?;

    Ok(MediaDescriptor::new(path.to_path_buf(), size, captured, kind))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn send_progress(events: &EventSender, current: usize, total: usize, phase: &str, path: &Path) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
        current,
        total,
        label: format!("{}: {}", phase, name),
    })));
}

fn report_skipped(events: &EventSender, error: &ScanError) {
    let path = match error {
        ScanError::FileVanished { path }
        | ScanError::ReadMetadata { path, .. }
        | ScanError::ReadDirectory { path, .. } => path.clone(),
        _ => PathBuf::new(),
    };
    tracing::warn!("Skipping {}: {}", path.display(), error);
    events.send(Event::Scan(ScanEvent::FileSkipped {
        path,
        message: error.to_string(),
    }));
}
