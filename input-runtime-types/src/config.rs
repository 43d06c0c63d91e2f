//! Tunables of a runtime pointer processor.
//!
//! [`ProcessorConfig`] is the unit of the active/persistent pair kept by each
//! processor and is also the persisted record, so every field serializes
//! with postcard and has a bounded encoded size.

use bitfield_struct::bitfield;
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};
use strum::FromRepr;

/// Which axis movement is snapped to.
///
/// Samples on the other axis (the cross axis) are suppressed until their
/// accumulated movement reaches the snap threshold.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisSnapMode {
    #[default]
    None = 0,
    X = 1,
    Y = 2,
}

impl AxisSnapMode {
    /// Whether a sample on the given axis is on the cross axis of this mode
    pub fn is_cross_axis(self, is_x: bool) -> bool {
        match self {
            AxisSnapMode::None => false,
            AxisSnapMode::X => !is_x,
            AxisSnapMode::Y => is_x,
        }
    }
}

/// Per-axis and code mapping flags
#[bitfield(u8, defmt = cfg(feature = "defmt"))]
#[derive(Eq, PartialEq, Serialize, Deserialize, MaxSize)]
pub struct AxisFlags {
    #[bits(1)]
    pub invert_x: bool,
    #[bits(1)]
    pub invert_y: bool,
    /// Exchange X and Y codes
    #[bits(1)]
    pub xy_swap: bool,
    /// Rewrite X/Y to horizontal/vertical scroll, wins over `xy_swap`
    #[bits(1)]
    pub xy_to_scroll: bool,
    #[bits(4)]
    _reserved: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisSnapConfig {
    pub mode: AxisSnapMode,
    pub threshold: u16,
    pub timeout_ms: u16,
}

impl AxisSnapConfig {
    pub const DEFAULT: Self = Self {
        mode: AxisSnapMode::None,
        threshold: 100,
        timeout_ms: 1000,
    };
}

impl Default for AxisSnapConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Layer that is turned on while the pointing device moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TempLayerConfig {
    pub enabled: bool,
    pub layer: u8,
    /// Idle time after the last key press before motion may turn the layer on
    pub activation_delay_ms: u32,
    /// Idle time after the last motion before the layer is turned off
    pub deactivation_delay_ms: u32,
}

impl TempLayerConfig {
    pub const DEFAULT: Self = Self {
        enabled: false,
        layer: 0,
        activation_delay_ms: 100,
        deactivation_delay_ms: 500,
    };
}

impl Default for TempLayerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// All runtime tunables of one processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProcessorConfig {
    pub scale_multiplier: u32,
    pub scale_divisor: u32,
    pub rotation_degrees: i32,
    pub flags: AxisFlags,
    pub axis_snap: AxisSnapConfig,
    /// Bitmask of layers the processor is active on, 0 means all layers
    pub active_layers: u32,
    pub temp_layer: TempLayerConfig,
}

impl ProcessorConfig {
    pub const DEFAULT: Self = Self {
        scale_multiplier: 1,
        scale_divisor: 1,
        rotation_degrees: 0,
        flags: AxisFlags::new(),
        axis_snap: AxisSnapConfig::DEFAULT,
        active_layers: 0,
        temp_layer: TempLayerConfig::DEFAULT,
    };

    pub const fn with_scaling(mut self, multiplier: u32, divisor: u32) -> Self {
        self.scale_multiplier = multiplier;
        self.scale_divisor = divisor;
        self
    }

    pub const fn with_rotation(mut self, degrees: i32) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub const fn with_flags(mut self, flags: AxisFlags) -> Self {
        self.flags = flags;
        self
    }

    pub const fn with_axis_snap(mut self, axis_snap: AxisSnapConfig) -> Self {
        self.axis_snap = axis_snap;
        self
    }

    pub const fn with_active_layers(mut self, active_layers: u32) -> Self {
        self.active_layers = active_layers;
        self
    }

    pub const fn with_temp_layer(mut self, temp_layer: TempLayerConfig) -> Self {
        self.temp_layer = temp_layer;
        self
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
