use super::EventSource;
use crate::event::{RawEvent, RECORD_LEN};
use std::collections::VecDeque;
use std::io::{self, Read};
use std::os::fd::RawFd;
use std::sync::{Arc, Mutex};

/// One scripted result of a `read` call.
#[derive(Debug)]
enum Chunk {
    Bytes(Vec<u8>),
    WouldBlock,
    Fail(io::ErrorKind),
}

/// In-memory event source that replays scripted reads.
///
/// Clones share the same queue, so a test can keep one handle for feeding
/// while a session owns another. Each queued chunk is returned by exactly one
/// `read` call (split only if the caller's buffer is smaller), which lets a
/// short record be placed between whole ones. An empty queue reads as
/// `WouldBlock`.
#[derive(Clone)]
pub struct VirtualSource {
    fd: RawFd,
    queue: Arc<Mutex<VecDeque<Chunk>>>,
}

impl VirtualSource {
    pub fn new() -> Self {
        Self::with_fd(-1)
    }

    /// Report `fd` from [`EventSource::raw_fd`].
    pub fn with_fd(fd: RawFd) -> Self {
        Self {
            fd,
            queue: Arc::default(),
        }
    }

    /// Inject one whole event record.
    pub fn feed(&self, event: RawEvent) {
        self.push(Chunk::Bytes(event.to_bytes().to_vec()));
    }

    /// Inject the key press/release pair for `code`.
    pub fn tap(&self, code: u16) {
        self.feed(RawEvent::key(code, 1));
        self.feed(RawEvent::key(code, 0));
    }

    /// Inject a record cut to `len` bytes.
    pub fn feed_truncated(&self, event: RawEvent, len: usize) {
        let mut bytes = event.to_bytes().to_vec();
        bytes.truncate(len.min(RECORD_LEN));
        self.push(Chunk::Bytes(bytes));
    }

    /// Make the next read report `WouldBlock` even if more is queued behind it.
    pub fn feed_would_block(&self) {
        self.push(Chunk::WouldBlock);
    }

    /// Make the next read fail with `kind`.
    pub fn feed_error(&self, kind: io::ErrorKind) {
        self.push(Chunk::Fail(kind));
    }

    /// Number of scripted reads not yet consumed.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn push(&self, chunk: Chunk) {
        self.lock().push_back(chunk);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Chunk>> {
        // A poisoned queue is still a valid queue.
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for VirtualSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Read for VirtualSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut queue = self.lock();
        match queue.pop_front() {
            None | Some(Chunk::WouldBlock) => Err(io::ErrorKind::WouldBlock.into()),
            Some(Chunk::Fail(kind)) => Err(kind.into()),
            Some(Chunk::Bytes(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    queue.push_front(Chunk::Bytes(bytes.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

impl EventSource for VirtualSource {
    fn raw_fd(&self) -> RawFd {
        self.fd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_whole_records() {
        let src = VirtualSource::new();
        src.feed(RawEvent::key(0x100, 1));
        let mut reader = src.clone();
        let mut buf = [0u8; RECORD_LEN];
        assert_eq!(reader.read(&mut buf).unwrap(), RECORD_LEN);
        assert_eq!(RawEvent::from_bytes(&buf), RawEvent::key(0x100, 1));
        assert_eq!(src.pending(), 0);
    }

    #[test]
    fn empty_queue_would_block() {
        let mut src = VirtualSource::new();
        let err = src.read(&mut [0u8; RECORD_LEN]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn truncated_record_is_one_short_read() {
        let mut src = VirtualSource::new();
        src.feed_truncated(RawEvent::sync(), 10);
        src.feed(RawEvent::sync());
        let mut buf = [0u8; RECORD_LEN];
        assert_eq!(src.read(&mut buf).unwrap(), 10);
        assert_eq!(src.read(&mut buf).unwrap(), RECORD_LEN);
    }

    #[test]
    fn oversized_chunk_is_split_across_reads() {
        let mut src = VirtualSource::new();
        src.push(Chunk::Bytes(vec![7u8; RECORD_LEN + 4]));
        let mut buf = [0u8; RECORD_LEN];
        assert_eq!(src.read(&mut buf).unwrap(), RECORD_LEN);
        assert_eq!(src.read(&mut buf).unwrap(), 4);
    }

    #[test]
    fn scripted_errors_surface() {
        let mut src = VirtualSource::with_fd(9);
        src.feed_error(io::ErrorKind::BrokenPipe);
        assert_eq!(src.raw_fd(), 9);
        let err = src.read(&mut [0u8; 4]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
