//! Linux evdev device nodes (`/dev/input/event*`).
//!
//! The node is opened read-only with `O_NONBLOCK`, so a drained device reports
//! `EAGAIN` instead of parking the realtime thread. The kernel only ever hands
//! out whole `struct input_event` records from these nodes.

use super::EventSource;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Open an input device node for non-blocking reads.
pub fn open_device(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
}

impl EventSource for File {
    fn raw_fd(&self) -> RawFd {
        self.as_raw_fd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_node_fails_to_open() {
        let err = open_device(Path::new("/dev/input/does-not-exist")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn opened_file_exposes_its_descriptor() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let file = open_device(tmp.path()).unwrap();
        assert!(file.raw_fd() >= 0);
        assert_eq!(file.raw_fd(), file.as_raw_fd());
    }
}
