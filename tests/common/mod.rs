//! Byte-level media fixtures shared by the integration tests.

#![allow(dead_code)]

use chrono::{Local, NaiveDateTime, TimeZone};
use std::fs::File;
use std::path::Path;
use std::time::SystemTime;

/// Seconds between 1904-01-01 and 1970-01-01
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Minimal JPEG whose EXIF carries `DateTimeOriginal`.
///
/// `date` must be in EXIF form, e.g. `2023:06:15 10:00:00`.
pub fn jpeg_with_date(date: &str) -> Vec<u8> {
    assert_eq!(date.len(), 19, "EXIF dates are 19 characters");

    // Little-endian TIFF: IFD0 at 8 points to the Exif IFD at 26, whose
    // single entry points to the date string at 44.
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2A\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());

    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&20u32.to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    tiff.extend_from_slice(date.as_bytes());
    tiff.push(0);

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(&tiff);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
    jpeg.extend_from_slice(&app1);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

fn make_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

/// Minimal MP4: `ftyp` then `moov/mvhd` created at `created` (UTC)
pub fn mp4_created_at(created: NaiveDateTime) -> Vec<u8> {
    let secs = (created.and_utc().timestamp() + MAC_EPOCH_OFFSET) as u32;

    let mut mvhd = vec![0u8; 4];
    mvhd.extend_from_slice(&secs.to_be_bytes());
    mvhd.extend_from_slice(&secs.to_be_bytes());
    mvhd.extend_from_slice(&1000u32.to_be_bytes());
    mvhd.extend_from_slice(&0u32.to_be_bytes());
    mvhd.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    mvhd.extend_from_slice(&0x0100u16.to_be_bytes());
    mvhd.extend_from_slice(&[0u8; 10]);
    mvhd.extend_from_slice(&[0u8; 36]);
    mvhd.extend_from_slice(&[0u8; 24]);
    mvhd.extend_from_slice(&2u32.to_be_bytes());

    let mut ftyp = b"isom".to_vec();
    ftyp.extend_from_slice(&0x200u32.to_be_bytes());
    ftyp.extend_from_slice(b"isom");

    let mut file = make_box(b"ftyp", &ftyp);
    file.extend(make_box(b"moov", &make_box(b"mvhd", &mvhd)));
    file
}

/// Set a file's modification time to a local wall-clock time
pub fn set_local_mtime(path: &Path, when: NaiveDateTime) {
    let local = Local
        .from_local_datetime(&when)
        .earliest()
        .expect("representable local time");
    let time: SystemTime = local.into();
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

pub fn at(date: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S").unwrap()
}
