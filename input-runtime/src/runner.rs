//! Task that drives the runtime processors.
//!
//! Pointer samples are handled synchronously by the input chain through
//! [`ProcessorRegistry::handle_event`]. This task does the rest: it loads the
//! stored settings, forwards key events from [`KEY_EVENT_CHANNEL`] and layer
//! changes from [`LAYER_STATE_SIGNAL`], and fires deferred tasks when they
//! are due. No `RefCell` borrow is held across an
//! await, so the registry and keymap can be shared with other tasks.

use core::cell::RefCell;
use core::future::pending;

use embassy_futures::select::{Either4, select4};
use embassy_time::{Instant, Timer};

use crate::channel::{KEY_EVENT_CHANNEL, LAYER_STATE_SIGNAL, SCHEDULE_SIGNAL};
use crate::keymap::Keymap;
use crate::registry::ProcessorRegistry;
use crate::storage::{SettingsStore, load_stored, save_settings};

pub async fn run_runtime_processors<K: Keymap, S: SettingsStore, const N: usize>(
    registry: &RefCell<ProcessorRegistry<N>>,
    keymap: &RefCell<K>,
    store: &mut S,
) -> ! {
    load_settings(registry, store).await;

    loop {
        let deadline = registry.borrow().next_deadline();
        let timer = async {
            match deadline {
                Some(at) => Timer::at(at).await,
                None => pending::<()>().await,
            }
        };

        match select4(
            timer,
            SCHEDULE_SIGNAL.wait(),
            KEY_EVENT_CHANNEL.receive(),
            LAYER_STATE_SIGNAL.wait(),
        )
        .await
        {
            Either4::First(()) => fire_due_tasks(registry, keymap, store).await,
            // The deadline may have moved, look again
            Either4::Second(()) => {}
            Either4::Third(event) => {
                trace!("Key event {:?}", event);
                registry.borrow_mut().on_key_event(&event, &mut *keymap.borrow_mut());
            }
            Either4::Fourth(()) => registry.borrow_mut().on_layer_state_changed(&*keymap.borrow()),
        }
    }
}

async fn load_settings<S: SettingsStore, const N: usize>(registry: &RefCell<ProcessorRegistry<N>>, store: &mut S) {
    let count = registry.borrow().len() as u8;
    for id in 0..count {
        let Some(name) = registry.borrow().get(id).map(|p| p.name()) else {
            continue;
        };
        let stored = load_stored(store, name).await;
        registry.borrow_mut().apply_loaded(id, stored);
    }
}

async fn fire_due_tasks<K: Keymap, S: SettingsStore, const N: usize>(
    registry: &RefCell<ProcessorRegistry<N>>,
    keymap: &RefCell<K>,
    store: &mut S,
) {
    loop {
        let request = registry
            .borrow_mut()
            .poll_due(Instant::now(), &mut *keymap.borrow_mut());
        match request {
            Some(request) => save_settings(store, &request).await,
            None => break,
        }
    }
}
