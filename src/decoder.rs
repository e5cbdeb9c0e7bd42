//! Raw event → logical action state machine.
//!
//! Each unit carries its own modal state:
//! - **page** (`0..3`), advanced by the unit's page button on press
//! - **shift**, held while the unit's shift button is down
//! - the set of data buttons currently held
//!
//! Every [`RawEvent`] yields zero or one [`LogicalAction`] in constant time.
//!
//! ## Release attribution
//! A held button remembers the id it was pressed under. Its release reports
//! that same id, even if page or shift changed while it was held, so a deck
//! never sees a release for a button it was not told was pressed.
//! A release with no matching press (e.g. held before the device was opened)
//! is reported under the current page/shift.

use crate::error::Result;
use crate::event::{
    EventKind, LogicalAction, LogicalButtonId, RawEvent, Unit, BUTTONS_PER_UNIT, PAGES,
};
use crate::layout::{Control, Layout};
use std::collections::HashMap;

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// Modal state of one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitState {
    page: u8,
    shift: bool,
    held: [Option<LogicalButtonId>; BUTTONS_PER_UNIT as usize],
}

impl UnitState {
    pub fn page(&self) -> u8 {
        self.page
    }

    pub fn shift_held(&self) -> bool {
        self.shift
    }

    pub fn is_pressed(&self, index: u8) -> bool {
        self.held
            .get(index as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// Held buttons as a bit set, bit `i` for index `i`.
    pub fn button_bits(&self) -> u8 {
        self.held
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .fold(0, |bits, (i, _)| bits | 1 << i)
    }

    fn current_id(&self, unit: Unit, index: u8) -> Option<LogicalButtonId> {
        LogicalButtonId::encode(unit, self.page, self.shift, index)
    }
}

/// Per-unit state for a whole device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeState {
    units: [UnitState; 2],
}

impl DecodeState {
    pub fn unit(&self, unit: Unit) -> &UnitState {
        &self.units[unit.index()]
    }

    fn unit_mut(&mut self, unit: Unit) -> &mut UnitState {
        &mut self.units[unit.index()]
    }
}

/// Maps raw events to logical actions using a [`Layout`].
#[derive(Clone, Debug)]
pub struct Decoder {
    keys: HashMap<u16, (Unit, Control)>,
    encoders: HashMap<u16, Unit>,
    state: DecodeState,
}

impl Decoder {
    /// Build lookup tables for `layout`. Fails if the layout claims a code twice.
    pub fn new(layout: &Layout) -> Result<Self> {
        Ok(Self {
            keys: layout.key_map()?,
            encoders: layout.encoder_map()?,
            state: DecodeState::default(),
        })
    }

    pub fn state(&self) -> &DecodeState {
        &self.state
    }

    /// Fold one event into the state; returns the action to route, if any.
    pub fn decode(&mut self, event: &RawEvent) -> Option<(Unit, LogicalAction)> {
        match event.kind {
            EventKind::Key => self.decode_key(event.code, event.value),
            EventKind::Relative => {
                // Codes outside the layout belong to the first unit.
                let unit = self.encoders.get(&event.code).copied().unwrap_or(Unit::A);
                Some((unit, LogicalAction::rotated(event.value)))
            }
            // Frame barrier; the session forwards it to decks.
            EventKind::Sync => None,
            EventKind::Other(_) => None,
        }
    }

    fn decode_key(&mut self, code: u16, value: i32) -> Option<(Unit, LogicalAction)> {
        let &(unit, control) = self.keys.get(&code)?;
        let state = self.state.unit_mut(unit);

        match control {
            Control::Shift => {
                state.shift = value != KEY_RELEASE;
                None
            }
            Control::Page => {
                if value == KEY_PRESS {
                    state.page = (state.page + 1) % PAGES;
                }
                None
            }
            Control::Button(index) => {
                let slot = index as usize;
                match value {
                    KEY_PRESS => {
                        let id = state.current_id(unit, index)?;
                        state.held[slot] = Some(id);
                        Some((unit, LogicalAction::pressed(id)))
                    }
                    KEY_RELEASE => {
                        let id = match state.held[slot].take() {
                            Some(id) => id,
                            None => state.current_id(unit, index)?,
                        };
                        Some((unit, LogicalAction::released(id)))
                    }
                    // autorepeat
                    _ => None,
                }
            }
        }
    }
}
