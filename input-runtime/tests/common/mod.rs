#![allow(dead_code)]

use embassy_time::Instant;
use input_runtime::event::InputEvent;
use input_runtime::keymap::{Binding, LayerStack};
use input_runtime::processor::ProcessorDescriptor;
use input_runtime::registry::{ProcessorRegistry, RegistryConfig};
use input_runtime::types::codes::{REL_X, REL_Y};
use input_runtime::types::config::{ProcessorConfig, TempLayerConfig};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub const KC_A: u32 = 0x04;
pub const KC_LSHIFT: u32 = 0xE1;

/// Position of a plain key on the base layer
pub const POS_A: u16 = 0;
/// Position of a modifier on the base layer
pub const POS_SHIFT: u16 = 1;
/// Position bound on the pointer layer itself
pub const POS_BUTTON: u16 = 2;

pub const POINTER_LAYER: u8 = 1;

pub const TEMP_LAYER: TempLayerConfig = TempLayerConfig {
    enabled: true,
    layer: POINTER_LAYER,
    activation_delay_ms: 100,
    deactivation_delay_ms: 500,
};

pub fn ms(t: u64) -> Instant {
    Instant::from_millis(t)
}

/// Base layer with a letter, a modifier and a plain key, pointer layer
/// with a button on the third position
pub fn keymap() -> LayerStack<2, 3> {
    LayerStack::new([
        [Binding::KeyPress(KC_A), Binding::KeyPress(KC_LSHIFT), Binding::KeyPress(0x05)],
        [Binding::Transparent, Binding::Transparent, Binding::Other],
    ])
}

pub fn registry(defaults: ProcessorConfig) -> ProcessorRegistry<2> {
    let descriptors = [ProcessorDescriptor::new("ball").with_defaults(defaults)];
    ProcessorRegistry::new(&descriptors, RegistryConfig::default()).unwrap()
}

/// Run one sample through processor 0 and return the emitted value
pub fn feed(registry: &mut ProcessorRegistry<2>, keymap: &LayerStack<2, 3>, x: bool, value: i16, t: u64) -> i16 {
    let mut event = InputEvent::rel(if x { REL_X } else { REL_Y }, value);
    registry.handle_event(0, &mut event, keymap, ms(t)).unwrap();
    event.value
}
