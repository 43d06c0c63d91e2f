//! Temp layer: a keymap layer turned on while the pointing device moves.
//!
//! Two producers race on the layer: pointer motion schedules activation and
//! (re)schedules deactivation, key presses that don't belong to the pointer
//! layer cancel a pending activation or turn the layer off right away. The
//! deferred transitions are [`TaskKind::Activate`] and
//! [`TaskKind::Deactivate`] tasks in the registry's queue.

use embassy_time::{Duration, Instant};
use input_runtime_types::config::TempLayerConfig;

use crate::keymap::{Keymap, interrupts_temp_layer};
use crate::scheduler::{Schedule, TaskKey, TaskKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TempLayerState {
    Inactive,
    ActivationPending,
    Active,
    DeactivationPending,
}

#[derive(Clone, Debug, Default)]
pub struct TempLayer {
    /// Layer this processor turned on, if any
    active_layer: Option<u8>,
    /// Set by the keep-active behavior
    keep_active: bool,
    last_input: Option<Instant>,
    last_keypress: Option<Instant>,
}

impl TempLayer {
    pub const fn new() -> Self {
        Self {
            active_layer: None,
            keep_active: false,
            last_input: None,
            last_keypress: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active_layer.is_some()
    }

    pub fn is_keep_active(&self) -> bool {
        self.keep_active
    }

    pub fn state(&self, id: u8, tasks: &impl Schedule) -> TempLayerState {
        match (
            self.is_active(),
            tasks.is_pending(TaskKey::new(id, TaskKind::Activate)),
            tasks.is_pending(TaskKey::new(id, TaskKind::Deactivate)),
        ) {
            (true, _, true) => TempLayerState::DeactivationPending,
            (true, _, false) => TempLayerState::Active,
            (false, true, _) => TempLayerState::ActivationPending,
            (false, false, _) => TempLayerState::Inactive,
        }
    }

    /// Forget a layer that was turned off from outside, e.g. by a layer key
    pub fn sync_layer_state<K: Keymap>(&mut self, id: u8, tasks: &mut impl Schedule, keymap: &K) {
        let Some(layer) = self.active_layer else {
            return;
        };
        if keymap.is_layer_active(layer) {
            return;
        }
        debug!("Processor {}: temp layer {} was turned off externally", id, layer);
        self.active_layer = None;
        tasks.cancel(TaskKey::new(id, TaskKind::Deactivate));
    }

    /// Non-zero pointer motion. Schedules activation if the keyboard has
    /// been idle for the activation delay.
    pub fn on_motion(&mut self, id: u8, config: &TempLayerConfig, tasks: &mut impl Schedule, now: Instant) {
        self.last_input = Some(now);
        if self.is_active() {
            return;
        }
        let key = TaskKey::new(id, TaskKind::Activate);
        if tasks.is_pending(key) {
            return;
        }

        let delay = Duration::from_millis(config.activation_delay_ms as u64);
        let idle = self
            .last_keypress
            .is_none_or(|pressed| now.checked_duration_since(pressed).is_some_and(|d| d >= delay));
        if idle {
            tasks.schedule(key, now + delay);
        }
    }

    /// End of the pipeline: push the deactivation back while motion goes on
    pub fn after_motion(&mut self, id: u8, config: &TempLayerConfig, tasks: &mut impl Schedule, now: Instant) {
        if config.enabled && self.is_active() && !self.keep_active {
            tasks.schedule(
                TaskKey::new(id, TaskKind::Deactivate),
                now + Duration::from_millis(config.deactivation_delay_ms as u64),
            );
        }
    }

    /// Activation task fired
    pub fn activate<K: Keymap>(
        &mut self,
        id: u8,
        config: &TempLayerConfig,
        tasks: &mut impl Schedule,
        keymap: &mut K,
        now: Instant,
    ) {
        if !config.enabled || self.is_active() {
            return;
        }
        if let Err(e) = keymap.activate_layer(config.layer) {
            error!("Processor {}: failed to activate temp layer {}: {:?}", id, config.layer, e);
            return;
        }
        debug!("Processor {}: temp layer {} activated", id, config.layer);
        self.active_layer = Some(config.layer);

        // Motion may have stopped before the activation fired
        if !self.keep_active {
            let since = self.last_input.unwrap_or(now);
            tasks.schedule(
                TaskKey::new(id, TaskKind::Deactivate),
                since + Duration::from_millis(config.deactivation_delay_ms as u64),
            );
        }
    }

    /// Deactivation task fired
    pub fn deactivate<K: Keymap>(&mut self, id: u8, keymap: &mut K) {
        if self.keep_active {
            return;
        }
        self.turn_off(id, keymap);
    }

    fn turn_off<K: Keymap>(&mut self, id: u8, keymap: &mut K) {
        let Some(layer) = self.active_layer else {
            return;
        };
        match keymap.deactivate_layer(layer) {
            Ok(()) => {
                debug!("Processor {}: temp layer {} deactivated", id, layer);
                self.active_layer = None;
            }
            Err(e) => error!("Processor {}: failed to deactivate temp layer {}: {:?}", id, layer, e),
        }
    }

    /// A key was pressed somewhere on the keyboard
    #[allow(clippy::too_many_arguments)]
    pub fn on_key_press<K: Keymap>(
        &mut self,
        id: u8,
        config: &TempLayerConfig,
        keep_keycodes: &[u32],
        tasks: &mut impl Schedule,
        keymap: &mut K,
        position: u16,
        timestamp: Instant,
    ) {
        self.last_keypress = Some(timestamp);

        let activate = TaskKey::new(id, TaskKind::Activate);
        let pending = tasks.is_pending(activate);
        let active = self.is_active() && !self.keep_active;
        if !pending && !active {
            return;
        }

        let layer = self.active_layer.unwrap_or(config.layer);
        if !interrupts_temp_layer(keymap, layer, position, keep_keycodes) {
            return;
        }

        if pending {
            tasks.cancel(activate);
            debug!("Processor {}: key {} cancelled temp layer activation", id, position);
        }
        if active {
            tasks.cancel(TaskKey::new(id, TaskKind::Deactivate));
            debug!("Processor {}: key {} interrupts temp layer", id, position);
            self.turn_off(id, keymap);
        }
    }

    pub fn set_keep_active(&mut self, id: u8, keep: bool, config: &TempLayerConfig, tasks: &mut impl Schedule, now: Instant) {
        self.keep_active = keep;
        // Also when disabled meanwhile, nothing else would turn the layer off
        if keep || !self.is_active() {
            return;
        }
        let key = TaskKey::new(id, TaskKind::Deactivate);
        if !tasks.is_pending(key) {
            tasks.schedule(key, now + Duration::from_millis(config.deactivation_delay_ms as u64));
        }
    }

    /// Force the layer off and drop both pending transitions
    pub fn reset<K: Keymap>(&mut self, id: u8, tasks: &mut impl Schedule, keymap: &mut K) {
        tasks.cancel(TaskKey::new(id, TaskKind::Activate));
        tasks.cancel(TaskKey::new(id, TaskKind::Deactivate));
        self.turn_off(id, keymap);
        // Forced, even if the keymap refused
        self.active_layer = None;
    }

    /// Temp layer got disabled: drop the pending activation and let a due
    /// deactivation turn the layer off.
    pub fn disable(&mut self, id: u8, tasks: &mut impl Schedule, now: Instant) {
        tasks.cancel(TaskKey::new(id, TaskKind::Activate));
        if self.is_active() {
            tasks.schedule(TaskKey::new(id, TaskKind::Deactivate), now);
        }
    }
}
