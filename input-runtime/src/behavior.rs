//! Keymap behaviors that change a runtime processor while their key is held.
//!
//! Changes are temporary: releasing the key restores the persistent
//! configuration.

use embassy_time::Instant;

use crate::error::ProcessorError;
use crate::registry::ProcessorRegistry;

/// Snap timeout used by [`AxisSnapBehavior`]
pub const AXIS_SNAP_BEHAVIOR_TIMEOUT_MS: u16 = 1000;

fn find_processor<const N: usize>(registry: &ProcessorRegistry<N>, name: &str) -> Result<u8, ProcessorError> {
    registry.find_by_name(name).ok_or_else(|| {
        error!("Behavior refers to unknown processor {}", name);
        ProcessorError::UnknownName
    })
}

/// Temporary scaling and/or rotation, e.g. a precision mode key
pub struct TempConfigBehavior {
    processor: u8,
    scale: Option<(u32, u32)>,
    rotation: Option<i32>,
    applied: bool,
}

impl TempConfigBehavior {
    pub fn new<const N: usize>(registry: &ProcessorRegistry<N>, processor: &str) -> Result<Self, ProcessorError> {
        Ok(Self {
            processor: find_processor(registry, processor)?,
            scale: None,
            rotation: None,
            applied: false,
        })
    }

    /// Ignored unless both parts are positive
    pub fn with_scaling(mut self, multiplier: u32, divisor: u32) -> Self {
        self.scale = (multiplier > 0 && divisor > 0).then_some((multiplier, divisor));
        self
    }

    /// Ignored outside of [-360, 360]
    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation = (-360..=360).contains(&degrees).then_some(degrees);
        self
    }

    pub fn on_pressed<const N: usize>(
        &mut self,
        registry: &mut ProcessorRegistry<N>,
        now: Instant,
    ) -> Result<(), ProcessorError> {
        let mut processor = registry.processor_mut(self.processor, now)?;
        if let Some((multiplier, divisor)) = self.scale {
            processor.set_scaling(multiplier, divisor, false);
        }
        if let Some(degrees) = self.rotation {
            processor.set_rotation(degrees, false);
        }
        self.applied = true;
        Ok(())
    }

    pub fn on_released<const N: usize>(
        &mut self,
        registry: &mut ProcessorRegistry<N>,
        now: Instant,
    ) -> Result<(), ProcessorError> {
        if !self.applied {
            return Ok(());
        }
        registry.processor_mut(self.processor, now)?.restore_persistent();
        self.applied = false;
        Ok(())
    }
}

/// Temporary axis snap. Mode and threshold come from the key binding.
pub struct AxisSnapBehavior {
    processor: u8,
    timeout_ms: u16,
    applied: bool,
}

impl AxisSnapBehavior {
    pub fn new<const N: usize>(registry: &ProcessorRegistry<N>, processor: &str) -> Result<Self, ProcessorError> {
        Ok(Self {
            processor: find_processor(registry, processor)?,
            timeout_ms: AXIS_SNAP_BEHAVIOR_TIMEOUT_MS,
            applied: false,
        })
    }

    /// `mode` is the raw snap mode of the binding
    pub fn on_pressed<const N: usize>(
        &mut self,
        registry: &mut ProcessorRegistry<N>,
        mode: u8,
        threshold: u16,
        now: Instant,
    ) -> Result<(), ProcessorError> {
        let mut processor = registry.processor_mut(self.processor, now)?;
        processor.set_axis_snap_mode_raw(mode, false)?;
        processor.set_axis_snap_threshold(threshold, false);
        processor.set_axis_snap_timeout(self.timeout_ms, false);
        self.applied = true;
        Ok(())
    }

    pub fn on_released<const N: usize>(
        &mut self,
        registry: &mut ProcessorRegistry<N>,
        now: Instant,
    ) -> Result<(), ProcessorError> {
        if !self.applied {
            return Ok(());
        }
        registry.processor_mut(self.processor, now)?.restore_persistent();
        self.applied = false;
        Ok(())
    }
}

/// Keeps the temp layer on while held
pub struct KeepActiveBehavior {
    processor: u8,
}

impl KeepActiveBehavior {
    pub fn new<const N: usize>(registry: &ProcessorRegistry<N>, processor: &str) -> Result<Self, ProcessorError> {
        Ok(Self {
            processor: find_processor(registry, processor)?,
        })
    }

    pub fn on_pressed<const N: usize>(
        &self,
        registry: &mut ProcessorRegistry<N>,
        now: Instant,
    ) -> Result<(), ProcessorError> {
        registry.processor_mut(self.processor, now)?.set_keep_active(true);
        Ok(())
    }

    pub fn on_released<const N: usize>(
        &self,
        registry: &mut ProcessorRegistry<N>,
        now: Instant,
    ) -> Result<(), ProcessorError> {
        registry.processor_mut(self.processor, now)?.set_keep_active(false);
        Ok(())
    }
}
