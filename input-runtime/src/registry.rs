//! The set of runtime processors of a keyboard.
//!
//! Processors are registered once at startup. Their index is their id for
//! the lifetime of the firmware; names are looked up with a linear scan.
//! Configuration changes go through [`ProcessorMut`], deferred work (temp
//! layer transitions and settings saves) through the registry's task queue.

use embassy_time::{Duration, Instant};
use heapless::Vec;
use input_runtime_types::config::{AxisSnapMode, ProcessorConfig};
use input_runtime_types::notification::ProcessorChanged;

use crate::channel::publish_processor_changed;
use crate::error::ProcessorError;
use crate::event::{InputEvent, KeyEvent};
use crate::keymap::Keymap;
use crate::processor::{
    InputProcessor, ProcessContext, ProcessResult, ProcessorDescriptor, RuntimeProcessor, TempLayerState,
};
use crate::scheduler::{Schedule, TaskKey, TaskKind, TaskQueue};
use crate::storage::{SettingsStore, load_stored, save_settings};
use crate::{PROCESSOR_NAME_MAX_LEN, SETTINGS_SAVE_DEBOUNCE_MS};

/// Options of the registry
#[derive(Clone, Copy, Debug)]
pub struct RegistryConfig {
    /// Time between the last durable write and the settings save
    pub save_debounce: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            save_debounce: Duration::from_millis(SETTINGS_SAVE_DEBOUNCE_MS),
        }
    }
}

/// Persistent settings of a processor that are due to be written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SaveRequest {
    pub id: u8,
    pub name: &'static str,
    pub config: ProcessorConfig,
}

pub struct ProcessorRegistry<const N: usize> {
    processors: Vec<RuntimeProcessor, N>,
    tasks: TaskQueue<N>,
    config: RegistryConfig,
}

impl<const N: usize> ProcessorRegistry<N> {
    pub fn new(descriptors: &[ProcessorDescriptor], config: RegistryConfig) -> Result<Self, ProcessorError> {
        let mut processors: Vec<RuntimeProcessor, N> = Vec::new();
        for descriptor in descriptors {
            if descriptor.name.len() > PROCESSOR_NAME_MAX_LEN {
                error!("Processor name {} is too long", descriptor.name);
                return Err(ProcessorError::NameTooLong);
            }
            if descriptor.x_codes.len() != descriptor.y_codes.len() {
                error!("Processor {}: X and Y code lists differ in length", descriptor.name);
                return Err(ProcessorError::CodeListMismatch);
            }
            if processors.iter().any(|p| p.name() == descriptor.name) {
                error!("Processor name {} is used twice", descriptor.name);
                return Err(ProcessorError::DuplicateName);
            }
            let id = u8::try_from(processors.len()).map_err(|_| ProcessorError::RegistryFull)?;
            processors
                .push(RuntimeProcessor::new(id, *descriptor))
                .map_err(|_| ProcessorError::RegistryFull)?;
            info!("Registered runtime processor {}: {}", id, descriptor.name);
        }

        Ok(Self {
            processors,
            tasks: TaskQueue::new(),
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// All processors in id order
    pub fn iter(&self) -> impl Iterator<Item = &RuntimeProcessor> {
        self.processors.iter()
    }

    pub fn get(&self, id: u8) -> Option<&RuntimeProcessor> {
        self.processors.get(id as usize)
    }

    pub fn find_by_name(&self, name: &str) -> Option<u8> {
        self.processors.iter().find(|p| p.name() == name).map(|p| p.id())
    }

    pub fn temp_layer_state(&self, id: u8) -> Option<TempLayerState> {
        self.get(id).map(|p| p.temp_layer_state(&self.tasks))
    }

    /// Handle for changing the configuration of a processor at `now`
    pub fn processor_mut(&mut self, id: u8, now: Instant) -> Result<ProcessorMut<'_, N>, ProcessorError> {
        let processor = self.processors.get_mut(id as usize).ok_or_else(|| {
            warn!("Unknown runtime processor {}", id);
            ProcessorError::UnknownProcessor(id)
        })?;
        Ok(ProcessorMut {
            processor,
            tasks: &mut self.tasks,
            save_debounce: self.config.save_debounce,
            now,
        })
    }

    pub fn processor_mut_by_name(&mut self, name: &str, now: Instant) -> Result<ProcessorMut<'_, N>, ProcessorError> {
        let id = self.find_by_name(name).ok_or(ProcessorError::UnknownName)?;
        self.processor_mut(id, now)
    }

    /// Run one pointer sample through processor `id`
    pub fn handle_event<K: Keymap>(
        &mut self,
        id: u8,
        event: &mut InputEvent,
        keymap: &K,
        now: Instant,
    ) -> Result<ProcessResult, ProcessorError> {
        let processor = self
            .processors
            .get_mut(id as usize)
            .ok_or(ProcessorError::UnknownProcessor(id))?;
        let mut ctx = ProcessContext {
            keymap,
            tasks: &mut self.tasks,
            now,
        };
        Ok(processor.handle_event(event, &mut ctx))
    }

    /// Layers changed outside the processors. Processors whose temp layer
    /// was turned off forget it.
    pub fn on_layer_state_changed<K: Keymap>(&mut self, keymap: &K) {
        for processor in self.processors.iter_mut() {
            let id = processor.id();
            processor.temp_layer.sync_layer_state(id, &mut self.tasks, keymap);
        }
    }

    /// Key events from the keyboard, fanned out to every processor
    pub fn on_key_event<K: Keymap>(&mut self, event: &KeyEvent, keymap: &mut K) {
        if !event.pressed {
            return;
        }
        self.on_layer_state_changed(&*keymap);
        for processor in self.processors.iter_mut() {
            let config = processor.settings.active.temp_layer;
            let keep = processor.descriptor().keep_keycodes;
            processor.temp_layer.on_key_press(
                processor.id(),
                &config,
                keep,
                &mut self.tasks,
                keymap,
                event.position,
                event.timestamp,
            );
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.next_deadline()
    }

    /// Fire every task due at `now`. Temp layer transitions run inline;
    /// the first due save is returned for the caller to write.
    pub fn poll_due<K: Keymap>(&mut self, now: Instant, keymap: &mut K) -> Option<SaveRequest> {
        while let Some(key) = self.tasks.pop_due(now) {
            let Some(processor) = self.processors.get_mut(key.processor as usize) else {
                continue;
            };
            let id = processor.id();
            match key.kind {
                TaskKind::Activate => {
                    processor.temp_layer.sync_layer_state(id, &mut self.tasks, &*keymap);
                    let config = processor.settings.active.temp_layer;
                    processor.temp_layer.activate(id, &config, &mut self.tasks, keymap, now);
                }
                TaskKind::Deactivate => processor.temp_layer.deactivate(id, keymap),
                TaskKind::Save => {
                    return Some(SaveRequest {
                        id,
                        name: processor.name(),
                        config: processor.settings.persistent,
                    });
                }
            }
        }
        None
    }

    /// Fire every due task and write the due saves to `store`
    pub async fn flush_due<K: Keymap, S: SettingsStore>(&mut self, now: Instant, keymap: &mut K, store: &mut S) {
        while let Some(request) = self.poll_due(now, keymap) {
            save_settings(store, &request).await;
        }
    }

    /// Replace both configuration copies of `id` with a stored record
    pub fn apply_stored(&mut self, id: u8, config: ProcessorConfig) -> Result<(), ProcessorError> {
        let processor = self
            .processors
            .get_mut(id as usize)
            .ok_or(ProcessorError::UnknownProcessor(id))?;
        processor.load(config);
        info!("Loaded settings of processor {}: {}", id, processor.name());
        publish_processor_changed(ProcessorChanged {
            id,
            name: processor.name(),
            config: *processor.config(),
        });
        Ok(())
    }

    /// Apply the outcome of a store lookup, `None` keeps the current settings
    pub(crate) fn apply_loaded(&mut self, id: u8, stored: Option<ProcessorConfig>) {
        let Some(config) = stored else {
            return;
        };
        if let Err(e) = self.apply_stored(id, config) {
            error!("Failed to apply stored settings of processor {}: {:?}", id, e);
        }
    }

    /// Load every processor's stored record, keeping defaults where none is found
    pub async fn load_settings<S: SettingsStore>(&mut self, store: &mut S) {
        for id in 0..self.processors.len() as u8 {
            let Some(name) = self.get(id).map(|p| p.name()) else {
                continue;
            };
            let stored = load_stored(store, name).await;
            self.apply_loaded(id, stored);
        }
    }
}

/// Configuration access to one processor.
///
/// Every setter takes `persistent`. Temporary writes only change the active
/// configuration. Persistent writes change both copies, (re)schedule the
/// settings save and publish a [`ProcessorChanged`] notification.
pub struct ProcessorMut<'r, const N: usize> {
    processor: &'r mut RuntimeProcessor,
    tasks: &'r mut TaskQueue<N>,
    save_debounce: Duration,
    now: Instant,
}

impl<const N: usize> ProcessorMut<'_, N> {
    pub fn id(&self) -> u8 {
        self.processor.id()
    }

    pub fn name(&self) -> &'static str {
        self.processor.name()
    }

    pub fn config(&self) -> &ProcessorConfig {
        self.processor.config()
    }

    pub fn persistent_config(&self) -> &ProcessorConfig {
        self.processor.persistent_config()
    }

    pub fn temp_layer_state(&self) -> TempLayerState {
        self.processor.temp_layer_state(&*self.tasks)
    }

    pub fn is_keep_active(&self) -> bool {
        self.processor.is_keep_active()
    }

    fn write(&mut self, persistent: bool, f: impl Fn(&mut ProcessorConfig)) {
        self.processor.settings.update(persistent, f);
        if persistent {
            self.persisted();
        }
    }

    /// Both copies changed: save later, tell the host now
    fn persisted(&mut self) {
        let id = self.processor.id();
        self.tasks
            .schedule(TaskKey::new(id, TaskKind::Save), self.now + self.save_debounce);
        publish_processor_changed(ProcessorChanged {
            id,
            name: self.processor.name(),
            config: *self.processor.config(),
        });
    }

    /// Zero leaves that part of the ratio unchanged
    pub fn set_scaling(&mut self, multiplier: u32, divisor: u32, persistent: bool) {
        self.write(persistent, |c| {
            if multiplier > 0 {
                c.scale_multiplier = multiplier;
            }
            if divisor > 0 {
                c.scale_divisor = divisor;
            }
        });
        info!(
            "Processor {}: scaling {}/{} (persistent: {})",
            self.name(),
            self.config().scale_multiplier,
            self.config().scale_divisor,
            persistent
        );
    }

    pub fn set_rotation(&mut self, degrees: i32, persistent: bool) {
        self.write(persistent, |c| c.rotation_degrees = degrees);
        self.processor.pipeline.reset_rotation();
        info!("Processor {}: rotation {} (persistent: {})", self.name(), degrees, persistent);
    }

    pub fn set_invert_x(&mut self, invert: bool, persistent: bool) {
        self.write(persistent, |c| c.flags.set_invert_x(invert));
    }

    pub fn set_invert_y(&mut self, invert: bool, persistent: bool) {
        self.write(persistent, |c| c.flags.set_invert_y(invert));
    }

    pub fn set_xy_to_scroll(&mut self, enabled: bool, persistent: bool) {
        self.write(persistent, |c| c.flags.set_xy_to_scroll(enabled));
        info!("Processor {}: xy to scroll {} (persistent: {})", self.name(), enabled, persistent);
    }

    pub fn set_xy_swap(&mut self, enabled: bool, persistent: bool) {
        self.write(persistent, |c| c.flags.set_xy_swap(enabled));
        info!("Processor {}: xy swap {} (persistent: {})", self.name(), enabled, persistent);
    }

    pub fn set_axis_snap(&mut self, mode: AxisSnapMode, threshold: u16, timeout_ms: u16, persistent: bool) {
        self.write(persistent, |c| {
            c.axis_snap.mode = mode;
            c.axis_snap.threshold = threshold;
            c.axis_snap.timeout_ms = timeout_ms;
        });
        self.processor.pipeline.reset_axis_snap();
        info!(
            "Processor {}: axis snap {:?}, threshold {}, timeout {}ms (persistent: {})",
            self.name(),
            mode,
            threshold,
            timeout_ms,
            persistent
        );
    }

    pub fn set_axis_snap_mode(&mut self, mode: AxisSnapMode, persistent: bool) {
        self.write(persistent, |c| c.axis_snap.mode = mode);
        self.processor.pipeline.reset_axis_snap();
    }

    /// Set the snap mode from its raw value, as sent by a host
    pub fn set_axis_snap_mode_raw(&mut self, mode: u8, persistent: bool) -> Result<(), ProcessorError> {
        let mode = AxisSnapMode::from_repr(mode).ok_or_else(|| {
            warn!("Invalid axis snap mode {}", mode);
            ProcessorError::InvalidSnapMode(mode)
        })?;
        self.set_axis_snap_mode(mode, persistent);
        Ok(())
    }

    pub fn set_axis_snap_threshold(&mut self, threshold: u16, persistent: bool) {
        self.write(persistent, |c| c.axis_snap.threshold = threshold);
    }

    pub fn set_axis_snap_timeout(&mut self, timeout_ms: u16, persistent: bool) {
        self.write(persistent, |c| c.axis_snap.timeout_ms = timeout_ms);
    }

    /// Bitmask of layers the processor runs on, 0 for all
    pub fn set_active_layers(&mut self, layers: u32, persistent: bool) {
        self.write(persistent, |c| c.active_layers = layers);
        info!("Processor {}: active layers {} (persistent: {})", self.name(), layers, persistent);
    }

    pub fn set_temp_layer(
        &mut self,
        enabled: bool,
        layer: u8,
        activation_delay_ms: u32,
        deactivation_delay_ms: u32,
        persistent: bool,
    ) {
        self.write(persistent, |c| {
            c.temp_layer.enabled = enabled;
            c.temp_layer.layer = layer;
            c.temp_layer.activation_delay_ms = activation_delay_ms;
            c.temp_layer.deactivation_delay_ms = deactivation_delay_ms;
        });
        self.temp_layer_enabled_changed();
        info!(
            "Processor {}: temp layer {} on layer {}, delays {}/{}ms (persistent: {})",
            self.name(),
            enabled,
            layer,
            activation_delay_ms,
            deactivation_delay_ms,
            persistent
        );
    }

    pub fn set_temp_layer_enabled(&mut self, enabled: bool, persistent: bool) {
        self.write(persistent, |c| c.temp_layer.enabled = enabled);
        self.temp_layer_enabled_changed();
    }

    pub fn set_temp_layer_layer(&mut self, layer: u8, persistent: bool) {
        self.write(persistent, |c| c.temp_layer.layer = layer);
    }

    pub fn set_temp_layer_activation_delay(&mut self, delay_ms: u32, persistent: bool) {
        self.write(persistent, |c| c.temp_layer.activation_delay_ms = delay_ms);
    }

    pub fn set_temp_layer_deactivation_delay(&mut self, delay_ms: u32, persistent: bool) {
        self.write(persistent, |c| c.temp_layer.deactivation_delay_ms = delay_ms);
    }

    fn temp_layer_enabled_changed(&mut self) {
        if !self.processor.config().temp_layer.enabled {
            let id = self.processor.id();
            self.processor.temp_layer.disable(id, self.tasks, self.now);
        }
    }

    /// Override that keeps the temp layer on, held by a behavior
    pub fn set_keep_active(&mut self, keep: bool) {
        let id = self.processor.id();
        let config = self.processor.config().temp_layer;
        self.processor
            .temp_layer
            .set_keep_active(id, keep, &config, self.tasks, self.now);
        debug!("Processor {}: keep active {}", id, keep);
    }

    /// Drop temporary changes and the state derived from them
    pub fn restore_persistent(&mut self) {
        self.processor.settings.restore_persistent();
        self.processor.pipeline.reset_rotation();
        self.processor.pipeline.reset_axis_snap();
        debug!("Processor {}: restored persistent settings", self.name());
    }

    /// Back to the build-time defaults, temp layer off, defaults saved
    pub fn reset<K: Keymap>(&mut self, keymap: &mut K) {
        let id = self.processor.id();
        let defaults = self.processor.descriptor().defaults;
        self.processor.settings.replace(defaults);
        self.processor.pipeline.reset();
        self.processor.temp_layer.reset(id, self.tasks, keymap);
        self.persisted();
        info!("Processor {}: reset to defaults", self.name());
    }
}

#[cfg(test)]
mod tests {
    use input_runtime_types::config::TempLayerConfig;

    use super::*;
    use crate::keymap::{Binding, LayerStack};

    static DESCRIPTORS: [ProcessorDescriptor; 2] = [
        ProcessorDescriptor::new("ball"),
        ProcessorDescriptor::new("scroller").with_defaults(ProcessorConfig::DEFAULT.with_scaling(1, 4)),
    ];

    fn registry() -> ProcessorRegistry<4> {
        ProcessorRegistry::new(&DESCRIPTORS, RegistryConfig::default()).unwrap()
    }

    fn ms(t: u64) -> Instant {
        Instant::from_millis(t)
    }

    #[test]
    fn test_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.find_by_name("scroller"), Some(1));
        assert_eq!(registry.find_by_name("mouse"), None);
        assert_eq!(registry.get(1).unwrap().config().scale_divisor, 4);
        let names: std::vec::Vec<_> = registry.iter().map(|p| (p.id(), p.name())).collect();
        assert_eq!(names, [(0, "ball"), (1, "scroller")]);
    }

    #[test]
    fn test_invalid_descriptors() {
        let long = [ProcessorDescriptor::new("trackball0")];
        assert_eq!(
            ProcessorRegistry::<2>::new(&long, RegistryConfig::default()).err(),
            Some(ProcessorError::NameTooLong)
        );
        let twice = [ProcessorDescriptor::new("a"), ProcessorDescriptor::new("a")];
        assert_eq!(
            ProcessorRegistry::<2>::new(&twice, RegistryConfig::default()).err(),
            Some(ProcessorError::DuplicateName)
        );
        let uneven = [ProcessorDescriptor::new("a").with_codes(&[0, 3], &[1])];
        assert_eq!(
            ProcessorRegistry::<2>::new(&uneven, RegistryConfig::default()).err(),
            Some(ProcessorError::CodeListMismatch)
        );
        assert_eq!(
            ProcessorRegistry::<1>::new(&DESCRIPTORS, RegistryConfig::default()).err(),
            Some(ProcessorError::RegistryFull)
        );
    }

    #[test]
    fn test_unknown_processor() {
        let mut registry = registry();
        let keymap: LayerStack<1, 1> = LayerStack::new([[Binding::Transparent]]);
        assert_eq!(registry.processor_mut(7, ms(0)).err(), Some(ProcessorError::UnknownProcessor(7)));
        assert_eq!(
            registry.processor_mut_by_name("mouse", ms(0)).err(),
            Some(ProcessorError::UnknownName)
        );
        let mut event = InputEvent::rel(0, 1);
        assert_eq!(
            registry.handle_event(2, &mut event, &keymap, ms(0)),
            Err(ProcessorError::UnknownProcessor(2))
        );
    }

    #[test]
    fn test_invalid_snap_mode_changes_nothing() {
        let mut registry = registry();
        let mut processor = registry.processor_mut(0, ms(0)).unwrap();
        assert_eq!(
            processor.set_axis_snap_mode_raw(3, true),
            Err(ProcessorError::InvalidSnapMode(3))
        );
        assert_eq!(processor.config().axis_snap.mode, AxisSnapMode::None);
        assert_eq!(registry.next_deadline(), None);
    }

    #[test]
    fn test_temporary_write_schedules_nothing() {
        let mut registry = registry();
        let mut processor = registry.processor_mut(0, ms(0)).unwrap();
        processor.set_scaling(3, 1, false);
        processor.set_rotation(90, false);
        assert_eq!(processor.config().scale_multiplier, 3);
        assert_eq!(processor.persistent_config().scale_multiplier, 1);
        assert_eq!(registry.next_deadline(), None);
    }

    #[test]
    fn test_durable_writes_coalesce() {
        let mut registry = registry();
        let mut keymap: LayerStack<1, 1> = LayerStack::new([[Binding::Transparent]]);
        for (t, multiplier) in [(0, 2), (100, 3), (200, 4)] {
            registry.processor_mut(0, ms(t)).unwrap().set_scaling(multiplier, 1, true);
        }
        let save_at = ms(200 + SETTINGS_SAVE_DEBOUNCE_MS);
        assert_eq!(registry.next_deadline(), Some(save_at));
        assert_eq!(registry.poll_due(ms(60_100), &mut keymap), None);

        let request = registry.poll_due(save_at, &mut keymap).unwrap();
        assert_eq!(request.name, "ball");
        assert_eq!(request.config.scale_multiplier, 4);
        assert_eq!(registry.poll_due(save_at, &mut keymap), None);
    }

    #[test]
    fn test_restore_persistent() {
        let mut registry = registry();
        let mut processor = registry.processor_mut(0, ms(0)).unwrap();
        processor.set_scaling(3, 1, false);
        processor.set_scaling(1, 1, true);
        processor.set_scaling(5, 2, false);
        processor.restore_persistent();
        assert_eq!(processor.config().scale_multiplier, 1);
        assert_eq!(processor.config().scale_divisor, 1);
    }

    #[test]
    fn test_zero_scaling_component_ignored() {
        let mut registry = registry();
        let mut processor = registry.processor_mut(1, ms(0)).unwrap();
        processor.set_scaling(3, 0, false);
        assert_eq!(processor.config().scale_multiplier, 3);
        assert_eq!(processor.config().scale_divisor, 4);
    }

    #[test]
    fn test_reset() {
        let mut registry = registry();
        let mut keymap: LayerStack<2, 1> = LayerStack::new([[Binding::Transparent]; 2]);
        {
            let mut processor = registry.processor_mut(1, ms(0)).unwrap();
            processor.set_rotation(45, true);
            processor.set_temp_layer(
                true,
                1,
                TempLayerConfig::DEFAULT.activation_delay_ms,
                TempLayerConfig::DEFAULT.deactivation_delay_ms,
                true,
            );
        }
        let mut event = InputEvent::rel(0, 3);
        registry.handle_event(1, &mut event, &keymap, ms(10)).unwrap();
        registry.poll_due(ms(110), &mut keymap);
        assert!(keymap.is_layer_active(1));

        registry.processor_mut(1, ms(200)).unwrap().reset(&mut keymap);
        assert!(!keymap.is_layer_active(1));
        assert_eq!(registry.temp_layer_state(1), Some(TempLayerState::Inactive));
        let processor = registry.get(1).unwrap();
        assert_eq!(*processor.config(), DESCRIPTORS[1].defaults);
        assert_eq!(*processor.persistent_config(), DESCRIPTORS[1].defaults);
        // Only the save is left
        assert_eq!(registry.next_deadline(), Some(ms(200 + SETTINGS_SAVE_DEBOUNCE_MS)));
    }

    #[test]
    fn test_disable_temp_layer_turns_it_off() {
        let mut registry = registry();
        let mut keymap: LayerStack<2, 1> = LayerStack::new([[Binding::Transparent]; 2]);
        registry
            .processor_mut(0, ms(0))
            .unwrap()
            .set_temp_layer(true, 1, 0, 500, false);
        let mut event = InputEvent::rel(1, -2);
        registry.handle_event(0, &mut event, &keymap, ms(0)).unwrap();
        registry.poll_due(ms(0), &mut keymap);
        assert!(keymap.is_layer_active(1));

        registry.processor_mut(0, ms(5)).unwrap().set_temp_layer_enabled(false, false);
        registry.poll_due(ms(5), &mut keymap);
        assert!(!keymap.is_layer_active(1));
    }

    #[test]
    fn test_keep_release_after_disable_turns_layer_off() {
        let mut registry = registry();
        let mut keymap: LayerStack<2, 1> = LayerStack::new([[Binding::Transparent]; 2]);
        registry
            .processor_mut(0, ms(0))
            .unwrap()
            .set_temp_layer(true, 1, 0, 500, false);
        let mut event = InputEvent::rel(0, 4);
        registry.handle_event(0, &mut event, &keymap, ms(0)).unwrap();
        registry.poll_due(ms(0), &mut keymap);
        assert!(keymap.is_layer_active(1));

        registry.processor_mut(0, ms(10)).unwrap().set_keep_active(true);
        registry.processor_mut(0, ms(20)).unwrap().set_temp_layer_enabled(false, false);
        // Kept on through the deactivation of the disable
        registry.poll_due(ms(20), &mut keymap);
        assert!(keymap.is_layer_active(1));

        registry.processor_mut(0, ms(30)).unwrap().set_keep_active(false);
        assert_eq!(registry.next_deadline(), Some(ms(530)));
        registry.poll_due(ms(530), &mut keymap);
        assert!(!keymap.is_layer_active(1));
        assert_eq!(registry.temp_layer_state(0), Some(TempLayerState::Inactive));
    }

    #[test]
    fn test_layer_turned_off_externally() {
        let mut registry = registry();
        let mut keymap: LayerStack<2, 1> = LayerStack::new([[Binding::Transparent]; 2]);
        registry
            .processor_mut(0, ms(0))
            .unwrap()
            .set_temp_layer(true, 1, 0, 500, false);
        let mut event = InputEvent::rel(0, 4);
        registry.handle_event(0, &mut event, &keymap, ms(0)).unwrap();
        registry.poll_due(ms(0), &mut keymap);
        assert_eq!(registry.temp_layer_state(0), Some(TempLayerState::DeactivationPending));

        keymap.deactivate_layer(1).unwrap();
        registry.on_layer_state_changed(&keymap);
        assert_eq!(registry.temp_layer_state(0), Some(TempLayerState::Inactive));
        assert_eq!(registry.next_deadline(), None);
    }
}
