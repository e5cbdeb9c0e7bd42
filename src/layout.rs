//! Physical layout: which device codes belong to which unit and control.
//!
//! A [`Layout`] is plain serde data so it can live in a TOML file next to the
//! rest of the host's configuration:
//!
//! ```toml
//! [[units]]
//! buttons = [256, 257, 258, 259, 260]
//! page = 304
//! shift = 305
//! encoders = [7]
//!
//! [[units]]
//! buttons = [261, 262, 263, 264, 265]
//! page = 307
//! shift = 308
//! encoders = [8]
//! ```
//!
//! Page and shift are dedicated keys, separate from the five data buttons.

use crate::error::{Error, Result};
use crate::event::{Unit, BUTTONS_PER_UNIT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// linux/input-event-codes.h
const BTN_0: u16 = 0x100;
const BTN_5: u16 = 0x105;
const BTN_A: u16 = 0x130;
const BTN_B: u16 = 0x131;
const BTN_X: u16 = 0x133;
const BTN_Y: u16 = 0x134;
const REL_DIAL: u16 = 0x07;
const REL_WHEEL: u16 = 0x08;

/// Codes for one half of the surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLayout {
    /// Key code of each data button, by index.
    pub buttons: [u16; BUTTONS_PER_UNIT as usize],
    /// Key code of the page-advance button.
    pub page: u16,
    /// Key code of the shift (hold) button.
    pub shift: u16,
    /// Relative-axis codes of this unit's encoders.
    #[serde(default)]
    pub encoders: Vec<u16>,
}

/// Full surface layout, unit A first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub units: [UnitLayout; 2],
}

impl Default for Layout {
    fn default() -> Self {
        let buttons = |base: u16| -> [u16; BUTTONS_PER_UNIT as usize] {
            std::array::from_fn(|i| base + i as u16)
        };
        Self {
            units: [
                UnitLayout {
                    buttons: buttons(BTN_0),
                    page: BTN_A,
                    shift: BTN_B,
                    encoders: vec![REL_DIAL],
                },
                UnitLayout {
                    buttons: buttons(BTN_5),
                    page: BTN_X,
                    shift: BTN_Y,
                    encoders: vec![REL_WHEEL],
                },
            ],
        }
    }
}

/// Role of a key code within its unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Button(u8),
    Page,
    Shift,
}

impl Layout {
    /// Parse and validate a layout from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let layout: Layout = toml::from_str(text)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Read, parse and validate a layout file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Check that no key code or relative code is claimed twice.
    pub fn validate(&self) -> Result<()> {
        self.key_map().map(|_| ())?;
        self.encoder_map().map(|_| ())
    }

    pub fn unit(&self, unit: Unit) -> &UnitLayout {
        &self.units[unit.index()]
    }

    /// Key code → (unit, control) lookup table.
    pub(crate) fn key_map(&self) -> Result<HashMap<u16, (Unit, Control)>> {
        let mut map = HashMap::new();
        for unit in Unit::ALL {
            let u = self.unit(unit);
            let controls = u
                .buttons
                .iter()
                .enumerate()
                .map(|(i, &code)| (code, Control::Button(i as u8)))
                .chain([(u.page, Control::Page), (u.shift, Control::Shift)]);
            for (code, control) in controls {
                if let Some((other_unit, other)) = map.insert(code, (unit, control)) {
                    return Err(Error::Layout(format!(
                        "key code {code:#x} used by {other_unit:?}/{other:?} and {unit:?}/{control:?}"
                    )));
                }
            }
        }
        Ok(map)
    }

    /// Relative code → unit lookup table.
    pub(crate) fn encoder_map(&self) -> Result<HashMap<u16, Unit>> {
        let mut map = HashMap::new();
        for unit in Unit::ALL {
            for &code in &self.unit(unit).encoders {
                if let Some(other) = map.insert(code, unit) {
                    return Err(Error::Layout(format!(
                        "relative code {code:#x} used by {other:?} and {unit:?}"
                    )));
                }
            }
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_valid() {
        let layout = Layout::default();
        layout.validate().unwrap();
        assert_eq!(layout.units[0].buttons, [0x100, 0x101, 0x102, 0x103, 0x104]);
        assert_eq!(layout.units[1].buttons, [0x105, 0x106, 0x107, 0x108, 0x109]);
        assert_eq!(layout.key_map().unwrap().len(), 14);
    }

    #[test]
    fn parses_toml() {
        let text = r#"
            [[units]]
            buttons = [2, 3, 4, 5, 6]
            page = 7
            shift = 8
            encoders = [7]

            [[units]]
            buttons = [16, 17, 18, 19, 20]
            page = 21
            shift = 22
        "#;
        let layout = Layout::from_toml_str(text).unwrap();
        assert_eq!(layout.unit(Unit::A).page, 7);
        assert!(layout.unit(Unit::B).encoders.is_empty());
        let keys = layout.key_map().unwrap();
        assert_eq!(keys.get(&4), Some(&(Unit::A, Control::Button(2))));
        assert_eq!(keys.get(&22), Some(&(Unit::B, Control::Shift)));
    }

    #[test]
    fn rejects_duplicate_key_codes() {
        let mut layout = Layout::default();
        layout.units[1].shift = layout.units[0].buttons[3];
        assert!(matches!(layout.validate(), Err(Error::Layout(_))));
    }

    #[test]
    fn rejects_duplicate_encoders() {
        let mut layout = Layout::default();
        layout.units[1].encoders.push(REL_DIAL);
        assert!(matches!(layout.validate(), Err(Error::Layout(_))));
    }

    #[test]
    fn rejects_short_button_list() {
        let text = r#"
            [[units]]
            buttons = [2, 3]
            page = 7
            shift = 8

            [[units]]
            buttons = [16, 17, 18, 19, 20]
            page = 21
            shift = 22
        "#;
        assert!(matches!(
            Layout::from_toml_str(text),
            Err(Error::LayoutParse(_))
        ));
    }

    #[test]
    fn serializes_back_to_toml() {
        let layout = Layout::default();
        let text = toml::to_string(&layout).unwrap();
        assert_eq!(Layout::from_toml_str(&text).unwrap(), layout);
    }
}
