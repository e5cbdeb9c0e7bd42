//! deck-input: controller input layer for deck-based audio performance.
//!
//! Binds a two-unit control surface (five buttons, three pages and a shift per
//! unit, plus encoders) to up to two playback decks. Raw device events are
//! folded into a fixed space of 60 logical buttons that deck logic can treat
//! uniformly, whatever the physical layout.
//!
//! The realtime scheduler drives everything through the [`Controller`] trait:
//! collect descriptors, wait, call `on_ready`, and finally `release`.
//! [`ControllerSet`] does the bookkeeping for several controllers at once.
//!
//! Linux/Unix only: sources are file descriptors polled with `poll(2)`.

pub mod backends;
pub mod controller;
pub mod deck;
pub mod decoder;
pub mod error;
pub mod event;
pub mod layout;
pub mod logger;
pub mod manager;
pub mod session;

pub use controller::Controller;
pub use deck::{Deck, DeckHandle, DeckSlots, Slot};
pub use decoder::{DecodeState, Decoder, UnitState};
pub use error::{Error, Result};
pub use event::*;
pub use layout::{Layout, UnitLayout};
pub use logger::ActionLogger;
pub use manager::ControllerSet;
#[cfg(feature = "evdev")]
pub use session::EvdevSession;
pub use session::DeviceSession;
