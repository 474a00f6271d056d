//! Integration tests for executing a plan.
//!
//! Covers copying into date folders, skip and overwrite behaviour, the
//! scan-after-transfer round trip, and pause / resume / cancel.

mod common;

use assert_fs::prelude::*;
use common::{at, jpeg_with_date, mp4_created_at, set_local_mtime};
use nas_media_uploader::core::jobs::{run_scan, ScanRequest, TransferJob};
use nas_media_uploader::core::planner::ScanSummary;
use nas_media_uploader::core::transfer::{
    FileOutcome, TransferControl, TransferExecutor, TransferState,
};
use nas_media_uploader::core::Disposition;
use nas_media_uploader::error::TransferError;
use nas_media_uploader::events::{null_sender, Event, EventChannel, TransferEvent};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn scan(source: &Path, destination: &Path, overwrite: bool) -> ScanSummary {
    let request = ScanRequest::new(source, destination, overwrite);
    run_scan(&request, &null_sender(), Arc::new(AtomicBool::new(false))).unwrap()
}

fn quick_executor(control: TransferControl) -> TransferExecutor {
    TransferExecutor::new(control).with_poll_interval(Duration::from_millis(5))
}

/// Source tree of `count` photos taken on consecutive days in March 2024
fn photo_batch(source: &assert_fs::TempDir, count: usize) {
    for i in 0..count {
        source
            .child(format!("IMG_{:04}.jpg", i))
            .write_binary(&jpeg_with_date(&format!("2024:03:{:02} 12:00:00", i + 1)))
            .unwrap();
    }
}

#[test]
fn transfer_sorts_files_into_date_folders() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    source
        .child("IMG_0001.jpg")
        .write_binary(&jpeg_with_date("2023:06:15 10:00:00"))
        .unwrap();
    source
        .child("clips/clip.mp4")
        .write_binary(&mp4_created_at(at("2022-07-04 12:00:00")))
        .unwrap();

    let summary = scan(source.path(), nas.path(), false);
    let report = quick_executor(TransferControl::new())
        .execute(&summary, &null_sender())
        .unwrap();

    assert_eq!(report.copied, 2);
    assert_eq!(report.failed, 0);
    assert!(!report.cancelled);
    nas.child("2023-06-15/IMG_0001.jpg")
        .assert(predicate::path::is_file());
    nas.child("2022-07-04/clip.mp4")
        .assert(predicate::path::is_file());
    assert_eq!(
        fs::read(nas.child("2023-06-15/IMG_0001.jpg").path()).unwrap(),
        jpeg_with_date("2023:06:15 10:00:00")
    );
}

#[test]
fn copies_keep_source_modification_time() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    let clip = source.child("old.avi");
    clip.write_binary(b"RIFF....AVI ").unwrap();
    set_local_mtime(clip.path(), at("2015-08-20 18:45:00"));

    let summary = scan(source.path(), nas.path(), false);
    quick_executor(TransferControl::new())
        .execute(&summary, &null_sender())
        .unwrap();

    let copied = nas.child("2015-08-20/old.avi");
    let source_mtime = fs::metadata(clip.path()).unwrap().modified().unwrap();
    let copied_mtime = fs::metadata(copied.path()).unwrap().modified().unwrap();
    assert_eq!(source_mtime, copied_mtime);
}

#[test]
fn skipped_files_are_not_written() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    let jpeg = jpeg_with_date("2023:06:15 10:00:00");
    source.child("IMG_0001.jpg").write_binary(&jpeg).unwrap();

    // Same size, different bytes: the planner only compares sizes
    let existing = nas.child("2023-06-15/IMG_0001.jpg");
    let placeholder = vec![7u8; jpeg.len()];
    existing.write_binary(&placeholder).unwrap();
    set_local_mtime(existing.path(), at("2020-01-01 00:00:00"));
    let before = fs::metadata(existing.path()).unwrap().modified().unwrap();

    let summary = scan(source.path(), nas.path(), true);
    assert_eq!(summary.descriptors[0].disposition(), Disposition::WillSkip);

    let report = quick_executor(TransferControl::new())
        .execute(&summary, &null_sender())
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.bytes_copied, 0);
    assert_eq!(fs::read(existing.path()).unwrap(), placeholder);
    let after = fs::metadata(existing.path()).unwrap().modified().unwrap();
    assert_eq!(before, after);
}

#[test]
fn overwrite_replaces_file_of_different_size() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    let jpeg = jpeg_with_date("2023:06:15 10:00:00");
    source.child("IMG_0001.jpg").write_binary(&jpeg).unwrap();
    let existing = nas.child("2023-06-15/IMG_0001.jpg");
    existing.write_binary(b"stale").unwrap();

    let summary = scan(source.path(), nas.path(), true);
    assert_eq!(summary.will_overwrite, 1);

    let report = quick_executor(TransferControl::new())
        .execute(&summary, &null_sender())
        .unwrap();

    assert_eq!(report.overwritten, 1);
    assert_eq!(report.outcomes, vec![FileOutcome::Overwritten]);
    assert_eq!(
        fs::metadata(existing.path()).unwrap().len(),
        jpeg.len() as u64
    );
    assert_eq!(fs::read(existing.path()).unwrap(), jpeg);
}

#[test]
fn rescanning_after_transfer_skips_everything() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    photo_batch(&source, 5);
    source
        .child("video/clip.mp4")
        .write_binary(&mp4_created_at(at("2022-07-04 12:00:00")))
        .unwrap();
    nas.child("2024-03-02/IMG_0001.jpg").write_binary(b"short").unwrap();

    let first = scan(source.path(), nas.path(), true);
    assert_eq!(first.will_upload, 5);
    assert_eq!(first.will_overwrite, 1);

    let report = quick_executor(TransferControl::new())
        .execute(&first, &null_sender())
        .unwrap();
    assert_eq!(report.failed, 0);
    assert!(!report.cancelled);

    let second = scan(source.path(), nas.path(), true);
    assert_eq!(second.total, first.total);
    assert!(second.is_up_to_date());
    assert!(second
        .descriptors
        .iter()
        .all(|d| d.disposition() == Disposition::WillSkip));
}

#[test]
fn cancel_mid_batch_leaves_later_files_untouched() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    photo_batch(&source, 6);
    let summary = scan(source.path(), nas.path(), false);
    let control = TransferControl::new();

    // A rendezvous channel holds the executor at each event until it is read
    let (sender, receiver) = EventChannel::bounded(0);
    let job = TransferJob::spawn_with_control(summary.clone(), sender, control.clone());

    let mut processed = Vec::new();
    while let Some(event) = receiver.recv() {
        if let Event::Transfer(TransferEvent::FileProcessed { index, success, .. }) = event {
            assert!(success);
            processed.push(index);
            if processed.len() == 2 {
                control.request_cancel();
            }
        }
    }
    let report = job.join().unwrap();

    assert!(report.cancelled);
    assert_eq!(processed, vec![0, 1]);
    assert_eq!(report.copied, 2);
    assert_eq!(control.state(), TransferState::Cancelled);

    for (index, descriptor) in summary.descriptors.iter().enumerate() {
        let destination = descriptor.destination_path().unwrap();
        if index < 2 {
            assert_eq!(report.outcomes[index], FileOutcome::Copied);
            assert_eq!(
                fs::read(destination).unwrap(),
                fs::read(descriptor.source_path()).unwrap()
            );
        } else {
            assert_eq!(report.outcomes[index], FileOutcome::NotReached);
            assert!(!destination.exists());
            assert!(!destination.parent().unwrap().exists());
        }
    }

    // No staging leftovers anywhere
    for entry in walkdir::WalkDir::new(nas.path()) {
        let entry = entry.unwrap();
        assert!(!entry.file_name().to_string_lossy().ends_with(".partial"));
    }
}

#[test]
fn pause_holds_the_batch_until_resumed() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    photo_batch(&source, 3);
    let summary = scan(source.path(), nas.path(), false);

    let control = TransferControl::new();
    control.request_pause();

    let executor = quick_executor(control.clone());
    let worker = thread::spawn(move || executor.execute(&summary, &null_sender()));

    let deadline = Instant::now() + Duration::from_secs(10);
    while control.state() != TransferState::Paused {
        assert!(Instant::now() < deadline, "transfer never paused");
        thread::sleep(Duration::from_millis(5));
    }
    nas.child("2024-03-01").assert(predicate::path::missing());

    control.request_resume();
    let report = worker.join().unwrap().unwrap();

    assert_eq!(report.copied, 3);
    assert!(!report.cancelled);
    assert_eq!(control.state(), TransferState::Completed);
    nas.child("2024-03-03/IMG_0002.jpg")
        .assert(predicate::path::is_file());
}

#[test]
fn cancel_while_paused_stops_without_copying() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    photo_batch(&source, 2);
    let summary = scan(source.path(), nas.path(), false);

    let control = TransferControl::new();
    control.request_pause();
    let executor = quick_executor(control.clone());

    let (sender, receiver) = EventChannel::new();
    let worker = thread::spawn(move || executor.execute(&summary, &sender));

    let deadline = Instant::now() + Duration::from_secs(10);
    while control.state() != TransferState::Paused {
        assert!(Instant::now() < deadline, "transfer never paused");
        thread::sleep(Duration::from_millis(5));
    }
    control.request_cancel();
    let report = worker.join().unwrap().unwrap();

    assert!(report.cancelled);
    assert_eq!(report.copied, 0);
    assert!(fs::read_dir(nas.path()).unwrap().next().is_none());

    let statuses: Vec<String> = receiver
        .iter()
        .filter_map(|e| match e {
            Event::Transfer(TransferEvent::Status { message }) => Some(message),
            _ => None,
        })
        .collect();
    assert!(statuses.contains(&"Transfer paused".to_string()));
    assert_eq!(statuses.last().map(String::as_str), Some("Transfer cancelled"));
}

#[test]
fn missing_source_file_fails_only_that_entry() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    photo_batch(&source, 3);
    let summary = scan(source.path(), nas.path(), false);

    let gone = summary.descriptors[1].source_path().to_path_buf();
    fs::remove_file(&gone).unwrap();

    let (sender, receiver) = EventChannel::new();
    let report = quick_executor(TransferControl::new())
        .execute(&summary, &sender)
        .unwrap();
    drop(sender);

    assert_eq!(report.copied, 2);
    assert_eq!(report.failed, 1);
    assert!(matches!(report.outcomes[1], FileOutcome::Failed { .. }));
    assert_eq!(report.errors().len(), 1);

    let results: Vec<(usize, bool)> = receiver
        .iter()
        .filter_map(|e| match e {
            Event::Transfer(TransferEvent::FileProcessed { index, success, .. }) => {
                Some((index, success))
            }
            _ => None,
        })
        .collect();
    assert_eq!(results, vec![(0, true), (1, false), (2, true)]);
}

#[test]
fn missing_destination_root_is_rejected() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    photo_batch(&source, 1);
    let summary = scan(source.path(), nas.path(), false);
    nas.close().unwrap();

    let control = TransferControl::new();
    let result = quick_executor(control.clone()).execute(&summary, &null_sender());

    assert!(matches!(result, Err(TransferError::DestinationNotFound { .. })));
    assert_eq!(control.state(), TransferState::Idle);
}

#[test]
fn read_only_sources_are_transferred() {
    let source = assert_fs::TempDir::new().unwrap();
    let nas = assert_fs::TempDir::new().unwrap();
    let photo = source.child("IMG_0001.jpg");
    photo
        .write_binary(&jpeg_with_date("2023:06:15 10:00:00"))
        .unwrap();
    let mut perms = fs::metadata(photo.path()).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(photo.path(), perms).unwrap();

    let summary = scan(source.path(), nas.path(), false);
    let report = quick_executor(TransferControl::new())
        .execute(&summary, &null_sender())
        .unwrap();

    assert_eq!(report.outcomes, vec![FileOutcome::Copied]);
    assert_eq!(report.copied, 1);
    let copied = nas.child("2023-06-15/IMG_0001.jpg");
    copied.assert(predicate::path::is_file());
    assert_eq!(
        fs::metadata(copied.path()).unwrap().modified().unwrap(),
        fs::metadata(photo.path()).unwrap().modified().unwrap()
    );
}
