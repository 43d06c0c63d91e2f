//! HID usages packed as `page << 16 | id`.

/// Keyboard/Keypad usage page
pub const HID_USAGE_KEY: u16 = 0x07;
/// Consumer usage page
pub const HID_USAGE_CONSUMER: u16 = 0x0C;

/// First and last keyboard modifier usage ids, LeftControl..=RightGUI
pub const HID_USAGE_KEY_MODIFIER_START: u16 = 0xE0;
pub const HID_USAGE_KEY_MODIFIER_END: u16 = 0xE7;

/// Pack a usage page and id
pub const fn hid_usage(page: u16, id: u16) -> u32 {
    ((page as u32) << 16) | id as u32
}

/// Usage page of a packed usage. A page of 0 means the keyboard page.
pub const fn usage_page(usage: u32) -> u16 {
    match (usage >> 16) as u16 {
        0 => HID_USAGE_KEY,
        page => page,
    }
}

pub const fn usage_id(usage: u32) -> u16 {
    (usage & 0xFFFF) as u16
}

/// Check whether a packed usage is one of the eight keyboard modifiers
pub const fn is_modifier(usage: u32) -> bool {
    usage_page(usage) == HID_USAGE_KEY
        && usage_id(usage) >= HID_USAGE_KEY_MODIFIER_START
        && usage_id(usage) <= HID_USAGE_KEY_MODIFIER_END
}
