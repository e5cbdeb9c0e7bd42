//! One open controller device and everything it owns.
//!
//! [`DeviceSession`] holds the event source, the two deck slots and the
//! decoder state. It implements [`Controller`], so a scheduler can poll it
//! next to any other driver.
//!
//! ## Lifecycle
//! - **open**: the source is opened (or handed in) and every record already
//!   buffered is read and thrown away. A button held down before startup
//!   therefore never shows up as a fresh press.
//! - **on_ready**: reads whole records until the source has nothing more,
//!   decoding each one and routing the result (unit A → left deck,
//!   unit B → right deck).
//! - **release**: closes the source and drops the deck handles. Idempotent.
//!
//! A short record or a hard read error faults the session. Nothing is decoded
//! after that; the owner is expected to release it.

use crate::backends::EventSource;
use crate::controller::Controller;
use crate::deck::{DeckHandle, DeckSlots, Slot};
use crate::decoder::{DecodeState, Decoder};
use crate::error::{Error, Result};
use crate::event::{EventKind, RawEvent, RECORD_LEN};
use crate::layout::Layout;
use std::io::{self, Read};

/// Outcome of one non-blocking record read.
enum ReadOutcome {
    Record([u8; RECORD_LEN]),
    Short(usize),
    Empty,
}

fn read_record<S: Read>(source: &mut S) -> io::Result<ReadOutcome> {
    let mut buf = [0u8; RECORD_LEN];
    loop {
        return match source.read(&mut buf) {
            Ok(0) => Ok(ReadOutcome::Empty),
            Ok(n) if n < RECORD_LEN => Ok(ReadOutcome::Short(n)),
            Ok(_) => Ok(ReadOutcome::Record(buf)),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(ReadOutcome::Empty),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => Err(e),
        };
    }
}

/// Discard everything the source has buffered. Returns the number of reads
/// consumed, short ones included.
fn drain<S: Read>(source: &mut S) -> io::Result<usize> {
    let mut discarded = 0;
    loop {
        match read_record(source)? {
            ReadOutcome::Empty => return Ok(discarded),
            ReadOutcome::Record(_) | ReadOutcome::Short(_) => discarded += 1,
        }
    }
}

/// Session over an evdev device node.
#[cfg(feature = "evdev")]
pub type EvdevSession = DeviceSession<std::fs::File>;

pub struct DeviceSession<S> {
    name: String,
    source: Option<S>,
    decks: DeckSlots,
    decoder: Decoder,
    faulted: bool,
}

#[cfg(feature = "evdev")]
impl EvdevSession {
    /// Open an evdev node with the default [`Layout`].
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        Self::open_with_layout(path, &Layout::default())
    }

    /// Open an evdev node and decode it with `layout`.
    pub fn open_with_layout(path: impl AsRef<std::path::Path>, layout: &Layout) -> Result<Self> {
        let path = path.as_ref();
        // Validate before touching the device so a bad layout leaks nothing.
        let decoder = Decoder::new(layout)?;
        let file = crate::backends::evdev::open_device(path).map_err(|source| {
            tracing::error!(device = %path.display(), %source, "failed to open device");
            Error::Open {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::start(path.display().to_string(), file, decoder)
    }
}

impl<S: EventSource> DeviceSession<S> {
    /// Wrap an already-open source. The drain phase runs here too.
    pub fn from_source(name: impl Into<String>, source: S, layout: &Layout) -> Result<Self> {
        let decoder = Decoder::new(layout)?;
        Self::start(name.into(), source, decoder)
    }

    fn start(name: String, mut source: S, decoder: Decoder) -> Result<Self> {
        // On error `source` drops here and the handle is closed.
        let discarded = drain(&mut source)?;
        tracing::info!(device = %name, discarded, "controller opened");
        Ok(Self {
            name,
            source: Some(source),
            decks: DeckSlots::new(),
            decoder,
            faulted: false,
        })
    }

    pub fn decode_state(&self) -> &DecodeState {
        self.decoder.state()
    }

    pub fn left(&self) -> Option<&DeckHandle> {
        self.decks.left()
    }

    pub fn right(&self) -> Option<&DeckHandle> {
        self.decks.right()
    }

    pub fn is_released(&self) -> bool {
        self.source.is_none()
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    fn fault(&mut self, err: Error) -> Error {
        tracing::error!(device = %self.name, error = %err, "controller faulted");
        self.faulted = true;
        err
    }
}

/// Decode one event and hand the result to the deck bound for its unit.
fn route(decoder: &mut Decoder, decks: &DeckSlots, event: &RawEvent) {
    #[cfg(feature = "debug-log")]
    tracing::trace!(kind = ?event.kind, code = event.code, value = event.value, "event");

    if event.kind == EventKind::Sync {
        for deck in decks.bound() {
            deck.sync();
        }
        return;
    }

    if let Some((unit, action)) = decoder.decode(event) {
        match decks.for_unit(unit) {
            Some(deck) => deck.accept_control(action),
            None => tracing::trace!(?unit, ?action, "no deck bound, dropped"),
        }
    }
}

impl<S: EventSource> Controller for DeviceSession<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn bind_deck(&mut self, deck: DeckHandle) -> Result<Slot> {
        if self.is_released() {
            return Err(Error::Released);
        }
        let slot = self.decks.bind(deck).inspect_err(|_| {
            tracing::warn!(device = %self.name, "both deck slots already bound");
        })?;
        tracing::debug!(device = %self.name, ?slot, "deck bound");
        Ok(slot)
    }

    fn poll_descriptors(&self, out: &mut [libc::pollfd]) -> Result<usize> {
        if out.is_empty() {
            return Err(Error::Config {
                required: 1,
                capacity: 0,
            });
        }
        let Some(source) = &self.source else {
            return Ok(0);
        };
        out[0] = libc::pollfd {
            fd: source.raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        Ok(1)
    }

    fn on_ready(&mut self) -> Result<()> {
        if self.faulted {
            return Err(Error::Faulted);
        }
        let Self {
            source,
            decks,
            decoder,
            ..
        } = &mut *self;
        let Some(source) = source.as_mut() else {
            return Err(Error::Released);
        };

        let outcome = loop {
            match read_record(source) {
                Ok(ReadOutcome::Empty) => break Ok(()),
                Ok(ReadOutcome::Record(buf)) => route(decoder, decks, &RawEvent::from_bytes(&buf)),
                Ok(ReadOutcome::Short(read)) => {
                    break Err(Error::Decode {
                        read,
                        expected: RECORD_LEN,
                    })
                }
                Err(e) => break Err(Error::Io(e)),
            }
        };
        outcome.map_err(|err| self.fault(err))
    }

    fn release(&mut self) {
        if let Some(source) = self.source.take() {
            drop(source);
            self.decks.clear();
            tracing::info!(device = %self.name, "controller released");
        }
    }
}
