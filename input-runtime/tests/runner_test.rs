pub mod common;

use core::cell::RefCell;

use embassy_futures::select::select;
use embassy_futures::{block_on, yield_now};
use input_runtime::channel::{KEY_EVENT_CHANNEL, LAYER_STATE_SIGNAL};
use input_runtime::event::KeyEvent;
use input_runtime::keymap::Keymap;
use input_runtime::processor::TempLayerState;
use input_runtime::runner::run_runtime_processors;
use input_runtime::storage::{RamStore, SettingsStore};
use input_runtime::types::config::{ProcessorConfig, TempLayerConfig};
use rusty_fork::rusty_fork_test;

use crate::common::{POINTER_LAYER, POS_A, TEMP_LAYER, feed, keymap, ms, registry};

async fn settle() {
    for _ in 0..16 {
        yield_now().await;
    }
}

rusty_fork_test! {
    #[test]
    fn test_runner_drives_temp_layer() {
        let immediate = TempLayerConfig {
            activation_delay_ms: 0,
            ..TEMP_LAYER
        };
        let mut store: RamStore<2> = RamStore::new();
        let stored = ProcessorConfig::DEFAULT.with_scaling(3, 2).with_temp_layer(immediate);
        block_on(store.save("ball", &stored)).unwrap();

        let registry = RefCell::new(registry(ProcessorConfig::DEFAULT));
        let keymap = RefCell::new(keymap());

        let check = async {
            settle().await;
            assert_eq!(*registry.borrow().get(0).unwrap().config(), stored);

            // Due right away, the mocked clock stands still at zero
            feed(&mut registry.borrow_mut(), &keymap.borrow(), true, 3, 0);
            settle().await;
            assert!(keymap.borrow().is_layer_active(POINTER_LAYER));

            KEY_EVENT_CHANNEL.send(KeyEvent::new(POS_A, true, ms(0))).await;
            settle().await;
            assert!(!keymap.borrow().is_layer_active(POINTER_LAYER));

            feed(&mut registry.borrow_mut(), &keymap.borrow(), true, 3, 0);
            settle().await;
            assert!(keymap.borrow().is_layer_active(POINTER_LAYER));

            // Turned off by the keymap, the processor forgets its layer
            keymap.borrow_mut().deactivate_layer(POINTER_LAYER).unwrap();
            LAYER_STATE_SIGNAL.signal(());
            settle().await;
            assert_eq!(registry.borrow().temp_layer_state(0), Some(TempLayerState::Inactive));
        };

        block_on(select(run_runtime_processors(&registry, &keymap, &mut store), check));
    }
}
