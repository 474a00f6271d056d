//! Date fields from ISO base media containers (mp4, mov, m4v, 3gp).
//!
//! Three candidate fields are read, in priority order:
//! - encoded date: `moov/mvhd` creation time
//! - tagged date: `moov/mvhd` modification time
//! - recorded date: the `©day` user-data atom, QuickTime style
//!   (`moov/udta/©day`) or iTunes style (`moov/udta/meta/ilst/©day/data`)
//!
//! Container times count seconds since 1904-01-01 UTC and are rendered as
//! `UTC YYYY-MM-DD HH:MM:SS`. A zero time means "not set". Other containers
//! (avi, mkv) produce no fields.

use chrono::DateTime;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Seconds between 1904-01-01 and 1970-01-01
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Refuse to buffer a `moov` box larger than this
const MAX_MOOV_SIZE: u64 = 64 * 1024 * 1024;

const RECORDED_DATE_ATOM: [u8; 4] = [0xA9, b'd', b'a', b'y'];

/// Raw date strings found in a video container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoDateFields {
    pub encoded_date: Option<String>,
    pub tagged_date: Option<String>,
    pub recorded_date: Option<String>,
}

impl VideoDateFields {
    /// Non-empty values in priority order
    pub fn candidates(&self) -> impl Iterator<Item = &str> + '_ {
        [&self.encoded_date, &self.tagged_date, &self.recorded_date]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }
}

/// Read the candidate date fields of a video file
pub fn read_video_dates(path: &Path) -> io::Result<VideoDateFields> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    match find_moov(&mut file, len)? {
        Some(moov) => Ok(parse_moov(&moov)),
        None => Ok(VideoDateFields::default()),
    }
}

/// Walk top-level boxes and buffer the body of `moov`
fn find_moov<R: Read + Seek>(reader: &mut R, len: u64) -> io::Result<Option<Vec<u8>>> {
    let mut offset = 0u64;

    while len.saturating_sub(offset) >= 8 {
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;

        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let kind = [header[4], header[5], header[6], header[7]];

        let remaining = len - offset;
        let (header_len, size) = match size32 {
            0 => (8u64, remaining),
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                (16u64, u64::from_be_bytes(large))
            }
            n => (8u64, n as u64),
        };

        // Boxes must fit inside the file
        if size < header_len || size > remaining {
            return Ok(None);
        }

        if &kind == b"moov" {
            let body_len = size - header_len;
            if body_len > MAX_MOOV_SIZE {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("moov box too large ({} bytes)", body_len),
                ));
            }
            let mut body = vec![0u8; body_len as usize];
            reader.read_exact(&mut body)?;
            return Ok(Some(body));
        }

        offset += size;
    }

    Ok(None)
}

fn parse_moov(moov: &[u8]) -> VideoDateFields {
    let mut fields = VideoDateFields::default();

    for (kind, body) in boxes(moov) {
        match &kind {
            b"mvhd" => {
                if let Some((created, modified)) = mvhd_times(body) {
                    fields.encoded_date = format_container_time(created);
                    fields.tagged_date = format_container_time(modified);
                }
            }
            b"udta" => {
                if fields.recorded_date.is_none() {
                    fields.recorded_date = recorded_date(body);
                }
            }
            b"meta" => {
                if fields.recorded_date.is_none() {
                    fields.recorded_date = ilst_recorded_date(body);
                }
            }
            _ => {}
        }
    }

    fields
}

/// (creation, modification) from an `mvhd` body
fn mvhd_times(body: &[u8]) -> Option<(u64, u64)> {
    let version = *body.first()?;
    if version == 1 {
        let created = read_u64(body.get(4..12)?);
        let modified = read_u64(body.get(12..20)?);
        Some((created, modified))
    } else {
        let created = read_u32(body.get(4..8)?) as u64;
        let modified = read_u32(body.get(8..12)?) as u64;
        Some((created, modified))
    }
}

fn recorded_date(udta: &[u8]) -> Option<String> {
    for (kind, body) in boxes(udta) {
        if kind == RECORDED_DATE_ATOM {
            // iTunes style nests a `data` box, QuickTime style is a
            // length-prefixed string with a language code
            if let Some(text) = data_box_text(body) {
                return Some(text);
            }
            let len = read_u16(body.get(0..2)?) as usize;
            return clean_text(body.get(4..4 + len)?);
        }
        if &kind == b"meta" {
            if let Some(text) = ilst_recorded_date(body) {
                return Some(text);
            }
        }
    }
    None
}

fn ilst_recorded_date(meta: &[u8]) -> Option<String> {
    // In mp4 `meta` is a full box; in QuickTime it is not and starts with `hdlr`
    let children = if meta.get(4..8) == Some(b"hdlr".as_slice()) {
        meta
    } else {
        meta.get(4..)?
    };

    let (_, ilst) = boxes(children).find(|(kind, _)| kind == b"ilst")?;
    let (_, day) = boxes(ilst).find(|(kind, _)| *kind == RECORDED_DATE_ATOM)?;
    data_box_text(day)
}

fn data_box_text(body: &[u8]) -> Option<String> {
    let (kind, data) = boxes(body).next()?;
    if &kind != b"data" {
        return None;
    }
    // type indicator (4) + locale (4)
    clean_text(data.get(8..)?)
}

fn clean_text(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end_matches('\0').trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn format_container_time(secs: u64) -> Option<String> {
    if secs == 0 {
        return None;
    }
    let unix = i64::try_from(secs).ok()? - MAC_EPOCH_OFFSET;
    let utc = DateTime::from_timestamp(unix, 0)?;
    Some(format!("UTC {}", utc.format("%Y-%m-%d %H:%M:%S")))
}

/// Iterate child boxes of an in-memory buffer as (type, body)
fn boxes(data: &[u8]) -> BoxIter<'_> {
    BoxIter { data }
}

struct BoxIter<'a> {
    data: &'a [u8],
}

impl<'a> Iterator for BoxIter<'a> {
    type Item = ([u8; 4], &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.data.len() < 8 {
            return None;
        }
        let size32 = read_u32(&self.data[0..4]);
        let kind = [self.data[4], self.data[5], self.data[6], self.data[7]];

        let (header_len, size) = match size32 {
            0 => (8usize, self.data.len()),
            1 => {
                let large = read_u64(self.data.get(8..16)?);
                (16usize, usize::try_from(large).ok()?)
            }
            n => (8usize, n as usize),
        };

        if size < header_len || size > self.data.len() {
            self.data = &[];
            return None;
        }

        let body = &self.data[header_len..size];
        self.data = &self.data[size..];
        Some((kind, body))
    }
}

fn read_u16(b: &[u8]) -> u16 {
    u16::from_be_bytes([b[0], b[1]])
}

fn read_u32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

fn read_u64(b: &[u8]) -> u64 {
    u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
}
