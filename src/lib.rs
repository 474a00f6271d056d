//! # NAS Media Uploader
//!
//! Sorts photos and videos into `<destination>/<YYYY-MM-DD>/` folders,
//! uploading new files and leaving ones that are already there alone.
//!
//! ## Workflow
//! 1. **Scan** - find media under the source and read each capture date
//! 2. **Plan** - compare against the destination: upload, overwrite or skip
//! 3. **Transfer** - copy the plan in order, with pause / resume / cancel
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - The scan, plan and transfer engine
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - Error types
//! - `config` - Persisted source / target / overwrite settings

pub mod config;
pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, UploaderError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// Logs go to stderr and are filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
