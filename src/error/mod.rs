//! # Error Module
//!
//! Error types for the media uploader.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Job-level vs file-level** - only errors that stop a job from starting
//!   are returned; per-file problems become events and outcomes

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum UploaderError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that occur while cataloguing and planning
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Destination directory not found: {path}")]
    DestinationNotFound { path: PathBuf },

    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("File is no longer accessible: {path}")]
    FileVanished { path: PathBuf },

    #[error("Failed to read file information for {path}: {source}")]
    ReadMetadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors that occur while copying files to the destination
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Destination directory not found: {path}")]
    DestinationNotFound { path: PathBuf },

    #[error("Failed to create folder {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("File has no destination in the plan: {path}")]
    Unplanned { path: PathBuf },

    #[error("Failed to copy {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to preserve timestamps on {path}: {source}")]
    PreserveTimes {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move finished copy into place at {path}: {source}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reading or writing persisted settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration directory is available on this system")]
    NoConfigDirectory,

    #[error("Failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings file {path} is corrupted ({reason}). Delete it and try again.")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to serialize settings: {0}")]
    Serialize(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, UploaderError>;
