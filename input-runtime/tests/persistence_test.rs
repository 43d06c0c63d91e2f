pub mod common;

use embassy_futures::block_on;
use input_runtime::channel::PROCESSOR_CHANGED_CHANNEL;
use input_runtime::storage::{RamStore, SettingsStore, decode_settings};
use input_runtime::types::config::{AxisSnapMode, ProcessorConfig};
use rusty_fork::rusty_fork_test;

use crate::common::{keymap, ms, registry};

const DEBOUNCE_MS: u64 = input_runtime::SETTINGS_SAVE_DEBOUNCE_MS;

#[test]
fn test_durable_writes_coalesce() {
    let mut registry = registry(ProcessorConfig::DEFAULT);
    let mut keymap = keymap();
    let mut store: RamStore<2> = RamStore::new();

    for i in 1..=5 {
        let mut processor = registry.processor_mut(0, ms(i * 10)).unwrap();
        processor.set_scaling(i as u32, 2, true);
        processor.set_invert_x(i % 2 == 1, true);
    }
    assert_eq!(registry.next_deadline(), Some(ms(50 + DEBOUNCE_MS)));

    block_on(registry.flush_due(ms(49 + DEBOUNCE_MS), &mut keymap, &mut store));
    assert_eq!(store.writes(), 0);

    block_on(registry.flush_due(ms(50 + DEBOUNCE_MS), &mut keymap, &mut store));
    assert_eq!(store.writes(), 1);
    let saved = decode_settings(store.record("ball").unwrap()).unwrap();
    assert_eq!((saved.scale_multiplier, saved.scale_divisor), (5, 2));
    assert!(saved.flags.invert_x());

    // Nothing left to write
    block_on(registry.flush_due(ms(10 * DEBOUNCE_MS), &mut keymap, &mut store));
    assert_eq!(store.writes(), 1);
}

#[test]
fn test_temporary_writes_are_not_saved() {
    let mut registry = registry(ProcessorConfig::DEFAULT);
    let mut keymap = keymap();
    let mut store: RamStore<2> = RamStore::new();

    registry.processor_mut(0, ms(0)).unwrap().set_rotation(45, false);
    block_on(registry.flush_due(ms(10 * DEBOUNCE_MS), &mut keymap, &mut store));
    assert_eq!(store.writes(), 0);
    assert_eq!(registry.get(0).unwrap().config().rotation_degrees, 45);
}

#[test]
fn test_restore_persistent() {
    let mut registry = registry(ProcessorConfig::DEFAULT);
    let mut processor = registry.processor_mut(0, ms(0)).unwrap();

    processor.set_scaling(3, 1, false);
    assert_eq!(processor.config().scale_multiplier, 3);
    processor.set_scaling(1, 1, true);
    processor.set_axis_snap_mode(AxisSnapMode::X, false);
    processor.restore_persistent();

    assert_eq!(processor.config().scale_multiplier, 1);
    assert_eq!(processor.config().axis_snap.mode, AxisSnapMode::None);
    assert_eq!(processor.config(), processor.persistent_config());
}

#[test]
fn test_load_settings() {
    let mut store: RamStore<2> = RamStore::new();
    let stored = ProcessorConfig::DEFAULT.with_scaling(7, 3).with_rotation(-30);
    block_on(store.save("ball", &stored)).unwrap();
    store.insert_raw("other", &[0xff, 1, 2]).unwrap();

    let mut registry = registry(ProcessorConfig::DEFAULT);
    block_on(registry.load_settings(&mut store));
    let processor = registry.get(0).unwrap();
    assert_eq!(*processor.config(), stored);
    assert_eq!(*processor.persistent_config(), stored);
    // Loading is not a write
    assert_eq!(registry.next_deadline(), None);
}

#[test]
fn test_corrupt_record_keeps_defaults() {
    let mut store: RamStore<2> = RamStore::new();
    store.insert_raw("ball", &[0xff, 1, 2]).unwrap();

    let defaults = ProcessorConfig::DEFAULT.with_scaling(1, 2);
    let mut registry = registry(defaults);
    block_on(registry.load_settings(&mut store));
    assert_eq!(*registry.get(0).unwrap().config(), defaults);
}

rusty_fork_test! {
    #[test]
    fn test_durable_write_notifies() {
        let mut sub = PROCESSOR_CHANGED_CHANNEL.subscriber().unwrap();
        let mut registry = registry(ProcessorConfig::DEFAULT);

        let mut processor = registry.processor_mut(0, ms(0)).unwrap();
        processor.set_scaling(2, 1, false);
        assert!(sub.try_next_message_pure().is_none());

        processor.set_rotation(90, true);
        let message = sub.try_next_message_pure().unwrap();
        assert_eq!(message.id, 0);
        assert_eq!(message.name, "ball");
        // Carries the active configuration, temporary changes included
        assert_eq!(message.config.scale_multiplier, 2);
        assert_eq!(message.config.rotation_degrees, 90);
    }

    #[test]
    fn test_load_notifies() {
        let mut sub = PROCESSOR_CHANGED_CHANNEL.subscriber().unwrap();
        let mut store: RamStore<2> = RamStore::new();
        block_on(store.save("ball", &ProcessorConfig::DEFAULT.with_scaling(4, 1))).unwrap();

        let mut registry = registry(ProcessorConfig::DEFAULT);
        block_on(registry.load_settings(&mut store));
        let message = sub.try_next_message_pure().unwrap();
        assert_eq!(message.config.scale_multiplier, 4);
    }
}
