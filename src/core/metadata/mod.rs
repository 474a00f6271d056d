//! # Metadata Module
//!
//! Works out when a photo or video was captured.
//!
//! ## Strategy
//! - Photos: EXIF `DateTimeOriginal` (`YYYY:MM:DD HH:MM:SS`)
//! - Videos: encoded date, tagged date, recorded date (see [`video`])
//! - Everything else, and every failure above: file modification time
//!
//! The date only decides which folder a file lands in, so an approximate
//! answer is always preferred over no answer. Metadata problems never
//! surface as errors; only failing to read the file's modification time does.

pub mod video;

use crate::core::media::MediaKind;
use crate::error::ScanError;
use chrono::{DateTime, Local, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::Path;
use std::time::SystemTime;

pub use video::{read_video_dates, VideoDateFields};

/// EXIF date format: "YYYY:MM:DD HH:MM:SS"
pub const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Formats tried, in order, for video date strings without a `UTC ` prefix
pub const VIDEO_DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y:%m:%d %H:%M:%S"];

/// Timezone marker some containers put in front of their dates
const UTC_PREFIX: &str = "UTC ";

/// Extract the capture time of a file.
///
/// `kind` is `None` for files that are neither photos nor videos; those use
/// the modification time directly. The only error is being unable to stat
/// the file at all.
pub fn extract_capture_time(
    path: &Path,
    kind: Option<MediaKind>,
) -> Result<NaiveDateTime, ScanError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScanError::FileVanished {
            path: path.to_path_buf(),
        },
        _ => ScanError::ReadMetadata {
            path: path.to_path_buf(),
            source: e,
        },
    })?;
    let modified = metadata.modified().map_err(|e| ScanError::ReadMetadata {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(capture_time_or(path, kind, local_time(modified)))
}

/// Capture time with an already known fallback. Never fails.
pub fn capture_time_or(
    path: &Path,
    kind: Option<MediaKind>,
    fallback: NaiveDateTime,
) -> NaiveDateTime {
    let embedded = match kind {
        Some(MediaKind::Photo) => photo_date_taken(path),
        Some(MediaKind::Video) => video_recorded_date(path),
        None => None,
    };

    embedded.unwrap_or(fallback)
}

/// Read `DateTimeOriginal` from a photo's EXIF block
pub fn photo_date_taken(path: &Path) -> Option<NaiveDateTime> {
    let file = File::open(path).ok()?;
    let mut bufreader = BufReader::new(file);
    let exif = Reader::new().read_from_container(&mut bufreader).ok()?;

    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    match field.value {
        Value::Ascii(ref vec) => {
            let bytes = vec.first()?;
            let s = std::str::from_utf8(bytes).ok()?;
            parse_exif_datetime(s)
        }
        _ => None,
    }
}

/// Read the first parseable date among a video's candidate fields
pub fn video_recorded_date(path: &Path) -> Option<NaiveDateTime> {
    let fields = match read_video_dates(path) {
        Ok(fields) => fields,
        Err(e) => {
            tracing::debug!("No container dates in {}: {}", path.display(), e);
            return None;
        }
    };

    let date = fields.candidates().find_map(parse_video_date);
    date
}

/// Parse an EXIF date/time string
pub fn parse_exif_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim_end_matches('\0'), EXIF_DATE_FORMAT).ok()
}

/// Parse a video date string.
///
/// `UTC 2020-01-01 12:00:00` is parsed after stripping the prefix; anything
/// else is tried against [`VIDEO_DATE_FORMATS`] in order.
pub fn parse_video_date(s: &str) -> Option<NaiveDateTime> {
    if let Some(rest) = s.strip_prefix(UTC_PREFIX) {
        return NaiveDateTime::parse_from_str(rest, VIDEO_DATE_FORMATS[0]).ok();
    }

    VIDEO_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Convert a filesystem time to local wall-clock time
pub fn local_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
