//! Heterogeneous controller collection for the realtime poll loop.
//!
//! The scheduler owns the wait (`poll(2)` or similar); [`ControllerSet`] only
//! gathers descriptors from every live controller and dispatches readiness
//! back to the controller that owns each descriptor.
//!
//! ```no_run
//! use deck_input::{ControllerSet, EvdevSession};
//!
//! let mut set = ControllerSet::new();
//! set.add(EvdevSession::open("/dev/input/event5")?);
//!
//! let mut fds = Vec::new();
//! loop {
//!     set.poll_descriptors(&mut fds)?;
//!     let n = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, 10) };
//!     if n > 0 {
//!         for (index, err) in set.dispatch(&fds) {
//!             eprintln!("controller {index} dropped: {err}");
//!         }
//!     }
//! }
//! # Ok::<(), deck_input::Error>(())
//! ```

use crate::controller::Controller;
use crate::deck::{DeckHandle, Slot};
use crate::error::{Error, Result};

/// Upper bound on descriptors a single controller may ask for.
const MAX_DESCRIPTORS_PER_CONTROLLER: usize = 8;

const EMPTY_POLLFD: libc::pollfd = libc::pollfd {
    fd: -1,
    events: 0,
    revents: 0,
};

struct Entry {
    controller: Box<dyn Controller>,
    live: bool,
}

#[derive(Default)]
pub struct ControllerSet {
    entries: Vec<Entry>,
    // fd slot → entry index, from the last `poll_descriptors` call
    owners: Vec<usize>,
}

impl ControllerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a controller; returns its index in this set.
    pub fn add<C: Controller + 'static>(&mut self, controller: C) -> usize {
        self.add_boxed(Box::new(controller))
    }

    pub fn add_boxed(&mut self, controller: Box<dyn Controller>) -> usize {
        tracing::debug!(controller = controller.name(), "controller added");
        self.entries.push(Entry {
            controller,
            live: true,
        });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Controller> {
        self.entries.get(index).map(|e| e.controller.as_ref())
    }

    /// Whether the controller at `index` is still being polled.
    pub fn is_live(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|e| e.live)
    }

    /// Offer `deck` to each live controller in order until one takes it.
    pub fn bind_deck(&mut self, deck: DeckHandle) -> Result<(usize, Slot)> {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            if !entry.live {
                continue;
            }
            match entry.controller.bind_deck(deck.clone()) {
                Ok(slot) => return Ok((index, slot)),
                Err(Error::Capacity) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::Capacity)
    }

    /// Refill `fds` with the descriptors of every live controller.
    pub fn poll_descriptors(&mut self, fds: &mut Vec<libc::pollfd>) -> Result<()> {
        fds.clear();
        self.owners.clear();
        let mut scratch = [EMPTY_POLLFD; MAX_DESCRIPTORS_PER_CONTROLLER];
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.live {
                continue;
            }
            let n = entry.controller.poll_descriptors(&mut scratch)?;
            fds.extend_from_slice(&scratch[..n]);
            self.owners.extend(std::iter::repeat(index).take(n));
        }
        Ok(())
    }

    /// Run `on_ready` for every controller with a ready descriptor in `fds`
    /// (as filled by [`poll_descriptors`](Self::poll_descriptors) and then
    /// waited on). Controllers that fail fatally are released and skipped
    /// from then on; their errors are returned with their index.
    pub fn dispatch(&mut self, fds: &[libc::pollfd]) -> Vec<(usize, Error)> {
        let mut failed = Vec::new();
        let mut last = None;
        for (fd, &index) in fds.iter().zip(&self.owners) {
            if fd.revents & (libc::POLLIN | libc::POLLERR | libc::POLLHUP) == 0 {
                continue;
            }
            // one drain per controller, whichever of its fds fired
            if last == Some(index) {
                continue;
            }
            last = Some(index);

            let Some(entry) = self.entries.get_mut(index) else {
                continue;
            };
            if !entry.live {
                continue;
            }
            if let Err(err) = entry.controller.on_ready() {
                if err.is_fatal() {
                    tracing::warn!(
                        controller = entry.controller.name(),
                        error = %err,
                        "releasing failed controller"
                    );
                    entry.controller.release();
                    entry.live = false;
                }
                failed.push((index, err));
            }
        }
        failed
    }

    /// Release every controller. Safe to call more than once.
    pub fn release_all(&mut self) {
        for entry in &mut self.entries {
            entry.controller.release();
            entry.live = false;
        }
        self.owners.clear();
    }
}

impl Drop for ControllerSet {
    fn drop(&mut self) {
        self.release_all();
    }
}
