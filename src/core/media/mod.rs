//! # Media Module
//!
//! The descriptor types shared by the scan, plan and transfer stages.
//!
//! A [`MediaDescriptor`] is created by the catalog, annotated once by the
//! planner and then only read by the transfer executor.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Photo extensions, lowercase, without the leading dot
pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic", "nef", "cr2", "arw"];

/// Video extensions, lowercase, without the leading dot
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "m4v", "3gp", "mkv"];

/// Folder name format for a capture date
pub const DATE_FOLDER_FORMAT: &str = "%Y-%m-%d";

/// Kind of media, decided by extension alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Classify an extension (case-insensitive). `None` for unsupported types.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_lowercase();
        if PHOTO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Photo)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    /// Classify a path by its extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Photo => write!(f, "Photo"),
            MediaKind::Video => write!(f, "Video"),
        }
    }
}

/// What the planner decided to do with a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    #[default]
    Unclassified,
    WillUpload,
    WillOverwrite,
    WillSkip,
}

impl Disposition {
    /// Whether this disposition writes to the destination
    pub fn writes(&self) -> bool {
        matches!(self, Disposition::WillUpload | Disposition::WillOverwrite)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Unclassified => write!(f, "Unclassified"),
            Disposition::WillUpload => write!(f, "Will upload"),
            Disposition::WillOverwrite => write!(f, "Will overwrite"),
            Disposition::WillSkip => write!(f, "Will skip"),
        }
    }
}

/// One discovered media file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    source_path: PathBuf,
    file_name: String,
    size_bytes: u64,
    capture_timestamp: NaiveDateTime,
    media_kind: MediaKind,
    destination_path: Option<PathBuf>,
    disposition: Disposition,
}

impl MediaDescriptor {
    /// Create an unclassified descriptor. The size is the scan-time snapshot.
    pub fn new(
        source_path: PathBuf,
        size_bytes: u64,
        capture_timestamp: NaiveDateTime,
        media_kind: MediaKind,
    ) -> Self {
        let file_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            source_path,
            file_name,
            size_bytes,
            capture_timestamp,
            media_kind,
            destination_path: None,
            disposition: Disposition::Unclassified,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn capture_timestamp(&self) -> NaiveDateTime {
        self.capture_timestamp
    }

    pub fn media_kind(&self) -> MediaKind {
        self.media_kind
    }

    /// Computed destination, `None` until planned
    pub fn destination_path(&self) -> Option<&Path> {
        self.destination_path.as_deref()
    }

    pub fn disposition(&self) -> Disposition {
        self.disposition
    }

    /// Date folder name, e.g. `2023-06-15`
    pub fn date_folder(&self) -> String {
        self.capture_timestamp.format(DATE_FOLDER_FORMAT).to_string()
    }

    /// Record the planner's decision.
    ///
    /// Returns `false` and leaves the descriptor untouched if it was already
    /// classified or `disposition` is `Unclassified`.
    pub(crate) fn classify(&mut self, destination_path: PathBuf, disposition: Disposition) -> bool {
        if self.disposition != Disposition::Unclassified || disposition == Disposition::Unclassified
        {
            return false;
        }
        self.destination_path = Some(destination_path);
        self.disposition = disposition;
        true
    }
}
