//! # Events Module
//!
//! Event-driven progress reporting for scan and transfer jobs.
//!
//! ## Design
//! Jobs run on a background thread and emit events through a channel, in the
//! same order the file loop produces them. Any front end (CLI, GUI, web) owns
//! the receiving end, either matching on [`Event`] directly or handing the
//! receiver a [`JobObserver`].
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//! let job = ScanJob::spawn(request, sender);
//!
//! receiver.dispatch(&mut my_observer);
//! let summary = job.join()?;
//! ```

mod channel;
mod observer;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use observer::JobObserver;
pub use types::*;
