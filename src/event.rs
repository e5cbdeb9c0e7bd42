//! Raw device records and the logical actions decoded from them.
//!
//! The device side speaks Linux input events: fixed-size records of
//! `{ time, type, code, value }`. The deck side sees only [`LogicalAction`]s,
//! addressed by a [`LogicalButtonId`] in `0..60`:
//!
//! ```text
//! id = unit * 30 + page * 10 + shift * 5 + index
//! ```
//!
//! with `unit ∈ {0,1}`, `page ∈ {0,1,2}`, `shift ∈ {0,1}`, `index ∈ {0..4}`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem::size_of;

/// `EV_SYN`
pub const EV_SYN: u16 = 0x00;
/// `EV_KEY`
pub const EV_KEY: u16 = 0x01;
/// `EV_REL`
pub const EV_REL: u16 = 0x02;

const TIMEVAL_LEN: usize = size_of::<libc::timeval>();

/// Size in bytes of one `struct input_event` on this platform.
pub const RECORD_LEN: usize = TIMEVAL_LEN + 8;

pub const UNITS: u8 = 2;
pub const BUTTONS_PER_UNIT: u8 = 5;
pub const PAGES: u8 = 3;
pub const SHIFT_STATES: u8 = 2;

/// Total number of logical buttons across the surface.
pub const LOGICAL_BUTTONS: u8 = UNITS * PAGES * SHIFT_STATES * BUTTONS_PER_UNIT;

/// Event category, from the record's `type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Sync,
    Key,
    Relative,
    Other(u16),
}

impl EventKind {
    pub fn from_type(ty: u16) -> Self {
        match ty {
            EV_SYN => EventKind::Sync,
            EV_KEY => EventKind::Key,
            EV_REL => EventKind::Relative,
            other => EventKind::Other(other),
        }
    }

    pub fn to_type(self) -> u16 {
        match self {
            EventKind::Sync => EV_SYN,
            EventKind::Key => EV_KEY,
            EventKind::Relative => EV_REL,
            EventKind::Other(ty) => ty,
        }
    }
}

/// One event as read from the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawEvent {
    /// Kernel timestamp, seconds part. Kept for diagnostics only.
    pub sec: i64,
    /// Kernel timestamp, microseconds part.
    pub usec: i64,
    pub kind: EventKind,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn new(kind: EventKind, code: u16, value: i32) -> Self {
        Self {
            sec: 0,
            usec: 0,
            kind,
            code,
            value,
        }
    }

    pub fn key(code: u16, value: i32) -> Self {
        Self::new(EventKind::Key, code, value)
    }

    pub fn relative(code: u16, value: i32) -> Self {
        Self::new(EventKind::Relative, code, value)
    }

    pub fn sync() -> Self {
        Self::new(EventKind::Sync, 0, 0)
    }

    /// Decode one native-endian `struct input_event`.
    pub fn from_bytes(buf: &[u8; RECORD_LEN]) -> Self {
        let half = TIMEVAL_LEN / 2;
        let (sec, usec) = if half == 8 {
            (read_i64(&buf[0..8]), read_i64(&buf[8..16]))
        } else {
            (
                read_i32(&buf[0..half]) as i64,
                read_i32(&buf[half..TIMEVAL_LEN]) as i64,
            )
        };
        let tail = &buf[TIMEVAL_LEN..];
        Self {
            sec,
            usec,
            kind: EventKind::from_type(u16::from_ne_bytes([tail[0], tail[1]])),
            code: u16::from_ne_bytes([tail[2], tail[3]]),
            value: read_i32(&tail[4..8]),
        }
    }

    /// Encode as a native-endian `struct input_event`.
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        let half = TIMEVAL_LEN / 2;
        if half == 8 {
            buf[0..8].copy_from_slice(&self.sec.to_ne_bytes());
            buf[8..16].copy_from_slice(&self.usec.to_ne_bytes());
        } else {
            buf[0..half].copy_from_slice(&(self.sec as i32).to_ne_bytes());
            buf[half..TIMEVAL_LEN].copy_from_slice(&(self.usec as i32).to_ne_bytes());
        }
        let tail = &mut buf[TIMEVAL_LEN..];
        tail[0..2].copy_from_slice(&self.kind.to_type().to_ne_bytes());
        tail[2..4].copy_from_slice(&self.code.to_ne_bytes());
        tail[4..8].copy_from_slice(&self.value.to_ne_bytes());
        buf
    }
}

fn read_i64(b: &[u8]) -> i64 {
    let mut a = [0u8; 8];
    a.copy_from_slice(b);
    i64::from_ne_bytes(a)
}

fn read_i32(b: &[u8]) -> i32 {
    let mut a = [0u8; 4];
    a.copy_from_slice(b);
    i32::from_ne_bytes(a)
}

/// One physical half of the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Routed to the left deck.
    A,
    /// Routed to the right deck.
    B,
}

impl Unit {
    pub const ALL: [Unit; 2] = [Unit::A, Unit::B];

    pub fn index(self) -> usize {
        match self {
            Unit::A => 0,
            Unit::B => 1,
        }
    }
}

/// Logical button identifier in `0..LOGICAL_BUTTONS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalButtonId(u8);

impl LogicalButtonId {
    /// Compose an id. Returns `None` if `page` or `index` is out of range.
    pub fn encode(unit: Unit, page: u8, shift: bool, index: u8) -> Option<Self> {
        if page >= PAGES || index >= BUTTONS_PER_UNIT {
            return None;
        }
        let per_shift = BUTTONS_PER_UNIT;
        let per_page = per_shift * SHIFT_STATES;
        let per_unit = per_page * PAGES;
        Some(Self(
            unit.index() as u8 * per_unit + page * per_page + shift as u8 * per_shift + index,
        ))
    }

    /// Split an id back into `(unit, page, shift, index)`.
    pub fn decode(self) -> (Unit, u8, bool, u8) {
        let per_shift = BUTTONS_PER_UNIT;
        let per_page = per_shift * SHIFT_STATES;
        let per_unit = per_page * PAGES;
        let unit = if self.0 / per_unit == 0 { Unit::A } else { Unit::B };
        let rest = self.0 % per_unit;
        (
            unit,
            rest / per_page,
            (rest % per_page) / per_shift == 1,
            rest % per_shift,
        )
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        (raw < LOGICAL_BUTTONS).then_some(Self(raw))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn unit(self) -> Unit {
        self.decode().0
    }
}

impl fmt::Display for LogicalButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an action addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    Button(LogicalButtonId),
    /// The unit's rotary encoder.
    EncoderDelta,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Pressed,
    Released,
    Rotated(i32),
}

/// Decoded control input delivered to a deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalAction {
    pub target: Target,
    pub kind: ActionKind,
}

impl LogicalAction {
    pub fn pressed(id: LogicalButtonId) -> Self {
        Self {
            target: Target::Button(id),
            kind: ActionKind::Pressed,
        }
    }

    pub fn released(id: LogicalButtonId) -> Self {
        Self {
            target: Target::Button(id),
            kind: ActionKind::Released,
        }
    }

    pub fn rotated(delta: i32) -> Self {
        Self {
            target: Target::EncoderDelta,
            kind: ActionKind::Rotated(delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_cover_the_whole_space_without_collisions() {
        let mut seen = HashSet::new();
        for unit in Unit::ALL {
            for page in 0..PAGES {
                for shift in [false, true] {
                    for index in 0..BUTTONS_PER_UNIT {
                        let id = LogicalButtonId::encode(unit, page, shift, index).unwrap();
                        assert!(id.get() < LOGICAL_BUTTONS);
                        assert_eq!(id.decode(), (unit, page, shift, index));
                        assert!(seen.insert(id.get()), "collision at {id}");
                    }
                }
            }
        }
        assert_eq!(seen.len(), LOGICAL_BUTTONS as usize);
        assert_eq!(LOGICAL_BUTTONS, 60);
    }

    #[test]
    fn every_raw_id_decomposes() {
        for raw in 0..LOGICAL_BUTTONS {
            let id = LogicalButtonId::from_raw(raw).unwrap();
            let (unit, page, shift, index) = id.decode();
            assert_eq!(LogicalButtonId::encode(unit, page, shift, index), Some(id));
        }
        assert_eq!(LogicalButtonId::from_raw(60), None);
    }

    #[test]
    fn encode_matches_formula() {
        let id = LogicalButtonId::encode(Unit::B, 1, true, 2).unwrap();
        assert_eq!(id.get(), 30 + 10 + 5 + 2);
        assert_eq!(LogicalButtonId::encode(Unit::A, 3, false, 0), None);
        assert_eq!(LogicalButtonId::encode(Unit::A, 0, false, 5), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn record_layout_matches_kernel() {
        assert_eq!(RECORD_LEN, size_of::<libc::input_event>());
    }

    #[test]
    fn record_fields_survive_encoding() {
        let ev = RawEvent {
            sec: 12,
            usec: 345,
            kind: EventKind::Key,
            code: 0x104,
            value: 1,
        };
        assert_eq!(RawEvent::from_bytes(&ev.to_bytes()), ev);
    }

    #[test]
    fn unknown_types_are_kept() {
        assert_eq!(EventKind::from_type(0x04), EventKind::Other(0x04));
        assert_eq!(EventKind::Other(0x04).to_type(), 0x04);
    }
}
