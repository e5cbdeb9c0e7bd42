//! Deck boundary and left/right slot binding.
//!
//! Decks are owned elsewhere (the playback engine). A controller only keeps a
//! shared handle and calls [`Deck::accept_control`] from the realtime thread,
//! so implementations must not block or allocate without bound there.

use crate::error::{Error, Result};
use crate::event::{LogicalAction, Unit};
use std::sync::Arc;

/// Control-input entry point of a playback deck.
pub trait Deck: Send + Sync {
    /// Deliver one decoded action.
    fn accept_control(&self, action: LogicalAction);

    /// End of one input frame (`EV_SYN`). Actions since the previous
    /// call belong together.
    fn sync(&self) {}
}

/// Shared, opaque deck handle as passed to `bind_deck`.
pub type DeckHandle = Arc<dyn Deck>;

/// Which slot a deck was bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Left,
    Right,
}

impl Slot {
    /// The unit whose actions go to this slot.
    pub fn unit(self) -> Unit {
        match self {
            Slot::Left => Unit::A,
            Slot::Right => Unit::B,
        }
    }
}

/// Two deck slots filled in bind order: left first, then right.
#[derive(Default, Clone)]
pub struct DeckSlots {
    left: Option<DeckHandle>,
    right: Option<DeckHandle>,
}

impl DeckSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the next free slot. Fails with [`Error::Capacity`] when both are taken;
    /// existing bindings are untouched in that case.
    pub fn bind(&mut self, deck: DeckHandle) -> Result<Slot> {
        if self.left.is_none() {
            self.left = Some(deck);
            Ok(Slot::Left)
        } else if self.right.is_none() {
            self.right = Some(deck);
            Ok(Slot::Right)
        } else {
            Err(Error::Capacity)
        }
    }

    pub fn left(&self) -> Option<&DeckHandle> {
        self.left.as_ref()
    }

    pub fn right(&self) -> Option<&DeckHandle> {
        self.right.as_ref()
    }

    /// Deck receiving `unit`'s actions.
    pub fn for_unit(&self, unit: Unit) -> Option<&DeckHandle> {
        match unit {
            Unit::A => self.left(),
            Unit::B => self.right(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    pub fn bound(&self) -> impl Iterator<Item = &DeckHandle> {
        self.left.iter().chain(self.right.iter())
    }

    /// Drop both handles.
    pub fn clear(&mut self) {
        self.left = None;
        self.right = None;
    }
}

impl std::fmt::Debug for DeckSlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeckSlots")
            .field("left", &self.left.is_some())
            .field("right", &self.right.is_some())
            .finish()
    }
}
