//! # nas-upload CLI
//!
//! Command-line front end for the NAS media uploader.
//!
//! ## Usage
//! ```bash
//! nas-upload scan /media/sdcard/DCIM /mnt/nas/photos
//! nas-upload transfer --overwrite
//! nas-upload config show
//! ```

mod cli;

use nas_media_uploader::Result;

fn main() -> Result<()> {
    nas_media_uploader::init_tracing();
    cli::run()
}
