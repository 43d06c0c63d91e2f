//! Events consumed by the runtime processors

use embassy_time::Instant;
use input_runtime_types::codes::EV_REL;

/// One raw pointer sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputEvent {
    /// Event type, e.g. [`EV_REL`]
    pub typ: u8,
    /// Axis code, e.g. `REL_X`
    pub code: u16,
    pub value: i16,
}

impl InputEvent {
    pub const fn new(typ: u8, code: u16, value: i16) -> Self {
        Self { typ, code, value }
    }

    /// Relative axis sample
    pub const fn rel(code: u16, value: i16) -> Self {
        Self::new(EV_REL, code, value)
    }
}

/// Key press or release at a keymap position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub position: u16,
    pub pressed: bool,
    pub timestamp: Instant,
}

impl KeyEvent {
    pub const fn new(position: u16, pressed: bool, timestamp: Instant) -> Self {
        Self {
            position,
            pressed,
            timestamp,
        }
    }
}
