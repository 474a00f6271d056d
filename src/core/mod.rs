//! # Core Module
//!
//! The GUI-agnostic scan-and-transfer engine.
//!
//! ## Modules
//! - `media` - Descriptor, kind and disposition types
//! - `metadata` - Extracts capture dates from photos and videos
//! - `catalog` - Discovers media files under a source directory
//! - `planner` - Decides upload / overwrite / skip per file
//! - `transfer` - Copies files with pause, resume and cancel
//! - `jobs` - Runs scans and transfers on background threads

pub mod catalog;
pub mod jobs;
pub mod media;
pub mod metadata;
pub mod planner;
pub mod transfer;

// Re-export commonly used types
pub use catalog::{CatalogConfig, MediaCatalog};
pub use jobs::{ScanJob, ScanRequest, TransferJob};
pub use media::{Disposition, MediaDescriptor, MediaKind};
pub use planner::{ReconciliationPlanner, ScanSummary};
pub use transfer::{FileOutcome, TransferControl, TransferExecutor, TransferReport, TransferState};
