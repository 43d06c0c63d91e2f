//! Runtime reconfigurable pointer processor.
//!
//! A [`RuntimeProcessor`] rewrites relative X/Y samples in place through a
//! fixed chain of stages:
//!
//! 1. layer filter, the processor only runs while one of its layers is on
//! 2. code mapping, X/Y to scroll or X/Y swap
//! 3. temp layer activation bookkeeping
//! 4. rotation
//! 5. axis inversion
//! 6. axis snap
//! 7. scaling
//! 8. temp layer deactivation scheduling
//!
//! Its tunables live in [`Settings`] and can be changed at runtime through
//! [`crate::registry::ProcessorMut`].

pub mod pipeline;
pub mod settings;
pub mod temp_layer;

use embassy_time::Instant;
use input_runtime_types::codes::{EV_REL, REL_HWHEEL, REL_WHEEL, REL_X, REL_Y};
use input_runtime_types::config::{AxisSnapMode, ProcessorConfig};

use self::pipeline::PipelineState;
pub use self::settings::Settings;
use self::temp_layer::TempLayer;
pub use self::temp_layer::TempLayerState;
use crate::event::InputEvent;
use crate::keymap::Keymap;
use crate::scheduler::Schedule;

/// Result of an input processor, whether the event goes on to the next one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProcessResult {
    Continue,
    Stop,
}

/// What a processor may use while it handles one event
pub struct ProcessContext<'a, K, S> {
    pub keymap: &'a K,
    pub tasks: &'a mut S,
    pub now: Instant,
}

/// The trait for processors in the pointer input chain.
///
/// The processor rewrites the event in place; the returned [`ProcessResult`]
/// tells the chain whether to hand it to the next processor.
pub trait InputProcessor {
    fn handle_event<K: Keymap, S: Schedule>(
        &mut self,
        event: &mut InputEvent,
        ctx: &mut ProcessContext<'_, K, S>,
    ) -> ProcessResult;
}

/// Static shape of a processor, fixed at build time
#[derive(Clone, Copy, Debug)]
pub struct ProcessorDescriptor {
    /// Unique name, at most [`crate::PROCESSOR_NAME_MAX_LEN`] bytes
    pub name: &'static str,
    /// Event type the processor handles
    pub event_type: u8,
    pub x_codes: &'static [u16],
    pub y_codes: &'static [u16],
    /// Build-time tunables, seeded into both configuration copies
    pub defaults: ProcessorConfig,
    /// Keycodes that don't interrupt the temp layer, empty means modifiers
    pub keep_keycodes: &'static [u32],
}

impl ProcessorDescriptor {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            event_type: EV_REL,
            x_codes: &[REL_X],
            y_codes: &[REL_Y],
            defaults: ProcessorConfig::DEFAULT,
            keep_keycodes: &[],
        }
    }

    pub const fn with_event_type(mut self, event_type: u8) -> Self {
        self.event_type = event_type;
        self
    }

    pub const fn with_codes(mut self, x_codes: &'static [u16], y_codes: &'static [u16]) -> Self {
        self.x_codes = x_codes;
        self.y_codes = y_codes;
        self
    }

    pub const fn with_defaults(mut self, defaults: ProcessorConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub const fn with_keep_keycodes(mut self, keep_keycodes: &'static [u32]) -> Self {
        self.keep_keycodes = keep_keycodes;
        self
    }

    /// Axis of a code, `(is_x, index in the code list)`
    fn axis_of(&self, code: u16) -> Option<(bool, usize)> {
        if let Some(idx) = self.x_codes.iter().position(|&c| c == code) {
            return Some((true, idx));
        }
        self.y_codes.iter().position(|&c| c == code).map(|idx| (false, idx))
    }
}

pub struct RuntimeProcessor {
    id: u8,
    descriptor: ProcessorDescriptor,
    pub(crate) settings: Settings,
    pub(crate) pipeline: PipelineState,
    pub(crate) temp_layer: TempLayer,
}

impl RuntimeProcessor {
    pub fn new(id: u8, descriptor: ProcessorDescriptor) -> Self {
        Self {
            id,
            descriptor,
            settings: Settings::new(descriptor.defaults),
            pipeline: PipelineState::new(),
            temp_layer: TempLayer::new(),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    pub fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    /// Active configuration
    pub fn config(&self) -> &ProcessorConfig {
        &self.settings.active
    }

    pub fn persistent_config(&self) -> &ProcessorConfig {
        &self.settings.persistent
    }

    pub fn is_keep_active(&self) -> bool {
        self.temp_layer.is_keep_active()
    }

    pub fn temp_layer_state(&self, tasks: &impl Schedule) -> TempLayerState {
        self.temp_layer.state(self.id, tasks)
    }

    pub fn axis_snap_accumulator(&self) -> i32 {
        self.pipeline.axis_snap_accumulator()
    }

    /// Replace both copies with a stored record
    pub(crate) fn load(&mut self, config: ProcessorConfig) {
        self.settings.replace(config);
        self.pipeline.reset();
    }
}

impl InputProcessor for RuntimeProcessor {
    fn handle_event<K: Keymap, S: Schedule>(
        &mut self,
        event: &mut InputEvent,
        ctx: &mut ProcessContext<'_, K, S>,
    ) -> ProcessResult {
        if event.typ != self.descriptor.event_type {
            return ProcessResult::Continue;
        }
        let Some((is_x, idx)) = self.descriptor.axis_of(event.code) else {
            return ProcessResult::Continue;
        };
        let config = self.settings.active;

        self.temp_layer.sync_layer_state(self.id, ctx.tasks, ctx.keymap);

        if config.active_layers != 0 && !ctx.keymap.any_layer_active(config.active_layers) {
            return ProcessResult::Continue;
        }

        if config.flags.xy_to_scroll() {
            event.code = if is_x { REL_HWHEEL } else { REL_WHEEL };
        } else if config.flags.xy_swap() {
            let swapped = if is_x {
                self.descriptor.y_codes.get(idx)
            } else {
                self.descriptor.x_codes.get(idx)
            };
            if let Some(&code) = swapped {
                event.code = code;
            }
        }

        if config.temp_layer.enabled && event.value != 0 {
            self.temp_layer
                .on_motion(self.id, &config.temp_layer, ctx.tasks, ctx.now);
        }

        if PipelineState::rotation_enabled(config.rotation_degrees) {
            event.value = self.pipeline.rotate(is_x, event.value, config.rotation_degrees);
        }

        let invert = if is_x {
            config.flags.invert_x()
        } else {
            config.flags.invert_y()
        };
        if invert {
            event.value = event.value.saturating_neg();
        }

        if config.axis_snap.mode != AxisSnapMode::None && event.value != 0 {
            event.value = self.pipeline.axis_snap(is_x, event.value, &config.axis_snap, ctx.now);
        }

        if config.scale_multiplier > 0 && config.scale_divisor > 0 {
            event.value = self
                .pipeline
                .scale(is_x, event.value, config.scale_multiplier, config.scale_divisor);
        }

        self.temp_layer
            .after_motion(self.id, &config.temp_layer, ctx.tasks, ctx.now);

        ProcessResult::Continue
    }
}
