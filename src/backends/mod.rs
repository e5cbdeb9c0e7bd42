//! Event sources for [`DeviceSession`](crate::session::DeviceSession).
//!
//! A source is anything that yields whole `struct input_event` records through
//! [`Read`] and exposes one file descriptor the scheduler can poll on.
//! Reads must not block: "no data right now" is reported as
//! [`WouldBlock`](std::io::ErrorKind::WouldBlock) or as a zero-length read.
//!
//! # Feature flags
//! - **`evdev`**: Linux input device nodes opened read-only and non-blocking (default).
//!
//! The [`virtual_input`] source is always available; it replays scripted reads
//! and is what the test suite drives sessions with.

use std::io::Read;
use std::os::fd::RawFd;

#[cfg(feature = "evdev")]
#[cfg_attr(docsrs, doc(cfg(feature = "evdev")))]
pub mod evdev;
pub mod virtual_input;

/// Readable, pollable device resource.
pub trait EventSource: Read + Send {
    /// Descriptor to wait on for readability. Negative means "nothing to poll".
    fn raw_fd(&self) -> RawFd;
}
