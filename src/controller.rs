//! The contract every controller driver implements.
//!
//! A scheduler drives controllers through this trait only; it never needs to
//! know which hardware family sits behind a `Box<dyn Controller>`:
//!
//! 1. [`bind_deck`](Controller::bind_deck) up to the driver's capacity
//! 2. [`poll_descriptors`](Controller::poll_descriptors) to learn what to wait on
//! 3. [`on_ready`](Controller::on_ready) whenever one of those becomes readable
//! 4. [`release`](Controller::release) once, at shutdown or after a fatal error

use crate::deck::{DeckHandle, Slot};
use crate::error::Result;

pub trait Controller: Send {
    /// Human-readable name for logs (usually the device path).
    fn name(&self) -> &str;

    /// Attach a deck to the next free slot.
    fn bind_deck(&mut self, deck: DeckHandle) -> Result<Slot>;

    /// Write the descriptors to wait on into `out` and return how many were
    /// written. Can be called again at any time and rewrites the same set.
    fn poll_descriptors(&self, out: &mut [libc::pollfd]) -> Result<usize>;

    /// Drain and decode everything currently readable, without blocking.
    fn on_ready(&mut self) -> Result<()>;

    /// Close the device and drop deck handles. Calling it again does nothing.
    fn release(&mut self);
}
