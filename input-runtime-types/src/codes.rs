//! Input event types and codes, numbered like the Linux input subsystem.

/// Synchronization event
pub const EV_SYN: u8 = 0x00;
/// Key or button event
pub const EV_KEY: u8 = 0x01;
/// Relative axis event
pub const EV_REL: u8 = 0x02;
/// Absolute axis event
pub const EV_ABS: u8 = 0x03;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;
pub const REL_Z: u16 = 0x02;
pub const REL_RX: u16 = 0x03;
pub const REL_RY: u16 = 0x04;
pub const REL_RZ: u16 = 0x05;
/// Horizontal scroll
pub const REL_HWHEEL: u16 = 0x06;
pub const REL_DIAL: u16 = 0x07;
/// Vertical scroll
pub const REL_WHEEL: u16 = 0x08;
pub const REL_MISC: u16 = 0x09;
