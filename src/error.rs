//! Error type shared by every controller in the crate.
//!
//! Only "no data currently available" ends a drain pass without an error.
//! Everything else surfaces here, and nothing is retried internally.
//!
//! | Variant | Fatal to the session? |
//! |---|---|
//! | [`Error::Open`] | construction aborts |
//! | [`Error::Capacity`] | no |
//! | [`Error::Config`] | no |
//! | [`Error::Decode`] | yes |
//! | [`Error::Io`] | yes |

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The device resource could not be opened.
    #[error("failed to open device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Both deck slots are already bound.
    #[error("controller already has left and right decks bound")]
    Capacity,

    /// The destination descriptor buffer is too small.
    #[error("descriptor buffer holds {capacity}, need {required}")]
    Config { required: usize, capacity: usize },

    /// A read returned part of an event record.
    #[error("short read from device: got {read} of {expected} bytes")]
    Decode { read: usize, expected: usize },

    #[error("device read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid layout: {0}")]
    Layout(String),

    #[error("layout parse: {0}")]
    LayoutParse(#[from] toml::de::Error),

    /// The controller has been released.
    #[error("controller released")]
    Released,

    /// An earlier decode or I/O failure left the session unusable.
    #[error("controller faulted by an earlier error; release it")]
    Faulted,
}

impl Error {
    /// Whether this error leaves the session unusable until it is released.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Decode { .. } | Error::Io(_) | Error::Faulted | Error::Released
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_and_config_are_recoverable() {
        assert!(!Error::Capacity.is_fatal());
        assert!(!Error::Config {
            required: 1,
            capacity: 0
        }
        .is_fatal());
    }

    #[test]
    fn short_reads_are_fatal() {
        let err = Error::Decode {
            read: 10,
            expected: 24,
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "short read from device: got 10 of 24 bytes");
    }
}
