//! File filtering logic for the catalog.

use crate::core::media::{MediaKind, PHOTO_EXTENSIONS, VIDEO_EXTENSIONS};
use std::collections::HashSet;
use std::path::Path;

/// Filters files down to supported photos and videos
pub struct MediaFilter {
    /// File extensions to include, lowercase
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl MediaFilter {
    /// Create a new filter accepting every supported photo and video extension
    pub fn new() -> Self {
        Self {
            extensions: PHOTO_EXTENSIONS
                .iter()
                .chain(VIDEO_EXTENSIONS.iter())
                .map(|e| e.to_string())
                .collect(),
            include_hidden: true,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    return false;
                }
            }
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => self.extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }

    /// Get the media kind for a path that passed the filter
    pub fn kind_of(&self, path: &Path) -> Option<MediaKind> {
        MediaKind::from_path(path)
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new()
    }
}
