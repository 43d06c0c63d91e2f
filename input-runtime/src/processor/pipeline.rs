//! Sample transformation stages and their per-processor state.
//!
//! Stage order inside [`super::RuntimeProcessor`]: rotation, inversion, axis
//! snap, scaling. Each stage here takes the value produced by the previous
//! one, so stages never look at the raw sample.

use core::f64::consts::PI;

use embassy_time::Instant;
use input_runtime_types::config::AxisSnapConfig;

use crate::SNAP_DECAY_TICK_MS;

/// Fixed point scale of the trig cache, a precision of 0.001
pub const TRIG_SCALE: i32 = 1000;

/// Largest rotation magnitude the pipeline applies
pub const MAX_ROTATION_DEGREES: i32 = 360;

/// cos/sin of a rotation angle, scaled by [`TRIG_SCALE`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trig {
    pub degrees: i32,
    pub cos: i32,
    pub sin: i32,
}

impl Trig {
    pub const IDENTITY: Self = Self {
        degrees: 0,
        cos: TRIG_SCALE,
        sin: 0,
    };

    pub fn new(degrees: i32) -> Self {
        if degrees == 0 {
            return Self::IDENTITY;
        }
        let rad = degrees as f64 * PI / 180.0;
        let trig = Self {
            degrees,
            cos: libm::round(libm::cos(rad) * TRIG_SCALE as f64) as i32,
            sin: libm::round(libm::sin(rad) * TRIG_SCALE as f64) as i32,
        };
        debug!("Rotation {} degrees: cos={}, sin={}", degrees, trig.cos, trig.sin);
        trig
    }
}

fn clamp_i16(value: i64) -> i16 {
    value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

/// Runtime state of the transformation stages, never persisted
#[derive(Clone, Debug)]
pub struct PipelineState {
    trig: Trig,
    // Rotation pairing buffer
    last_x: i16,
    last_y: i16,
    has_x: bool,
    has_y: bool,
    // Axis snap
    snap_accum: i32,
    last_decay: Option<Instant>,
    // Scaling remainders, per axis
    remainder_x: i64,
    remainder_y: i64,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub const fn new() -> Self {
        Self {
            trig: Trig::IDENTITY,
            last_x: 0,
            last_y: 0,
            has_x: false,
            has_y: false,
            snap_accum: 0,
            last_decay: None,
            remainder_x: 0,
            remainder_y: 0,
        }
    }

    pub fn axis_snap_accumulator(&self) -> i32 {
        self.snap_accum
    }

    pub fn reset_rotation(&mut self) {
        self.last_x = 0;
        self.last_y = 0;
        self.has_x = false;
        self.has_y = false;
    }

    pub fn reset_axis_snap(&mut self) {
        self.snap_accum = 0;
        self.last_decay = None;
    }

    /// Clear everything derived from previous samples
    pub fn reset(&mut self) {
        self.reset_rotation();
        self.reset_axis_snap();
        self.remainder_x = 0;
        self.remainder_y = 0;
    }

    /// Whether the rotation stage runs for this angle
    pub fn rotation_enabled(degrees: i32) -> bool {
        degrees != 0 && (-MAX_ROTATION_DEGREES..=MAX_ROTATION_DEGREES).contains(&degrees)
    }

    /// Buffer one axis and emit its rotated value once the other axis of the
    /// pair has arrived. The first axis of a pair always emits 0.
    pub fn rotate(&mut self, is_x: bool, value: i16, degrees: i32) -> i16 {
        if self.trig.degrees != degrees {
            self.trig = Trig::new(degrees);
        }
        let Trig { cos, sin, .. } = self.trig;

        if is_x {
            self.last_x = value;
            self.has_x = true;
            if !self.has_y {
                return 0;
            }
            self.has_y = false;
            // X' = X * cos - Y * sin
            clamp_i16((self.last_x as i64 * cos as i64 - self.last_y as i64 * sin as i64) / TRIG_SCALE as i64)
        } else {
            self.last_y = value;
            self.has_y = true;
            if !self.has_x {
                return 0;
            }
            self.has_x = false;
            // Y' = X * sin + Y * cos
            clamp_i16((self.last_x as i64 * sin as i64 + self.last_y as i64 * cos as i64) / TRIG_SCALE as i64)
        }
    }

    /// Move the cross axis accumulator towards zero for every elapsed tick
    fn decay_axis_snap(&mut self, config: &AxisSnapConfig, now: Instant) {
        if config.timeout_ms == 0 {
            return;
        }
        let Some(elapsed) = self.last_decay.and_then(|last| now.checked_duration_since(last)) else {
            return;
        };
        let ticks = elapsed.as_millis() / SNAP_DECAY_TICK_MS;
        if ticks == 0 {
            return;
        }

        let ticks_per_timeout = (config.timeout_ms as u64 / SNAP_DECAY_TICK_MS).max(1);
        let step = (config.threshold as u64 / ticks_per_timeout).max(1);
        let decay = step.saturating_mul(ticks).min(i32::MAX as u64) as i32;
        self.snap_accum = if self.snap_accum > 0 {
            (self.snap_accum - decay).max(0)
        } else {
            (self.snap_accum + decay).min(0)
        };
        self.last_decay = Some(now);
        trace!("Axis snap: decayed accumulator to {} (decay={})", self.snap_accum, decay);
    }

    /// Suppress cross axis samples until their accumulated movement
    /// reaches the threshold. Samples on the snapped axis only drive decay.
    pub fn axis_snap(&mut self, is_x: bool, value: i16, config: &AxisSnapConfig, now: Instant) -> i16 {
        self.decay_axis_snap(config, now);

        if !config.mode.is_cross_axis(is_x) {
            return value;
        }

        let threshold = config.threshold as i32;
        let value = value as i32;
        let current = self.snap_accum.abs();
        self.snap_accum = if current >= threshold {
            // Already unlocked, keep growing
            current + value.abs()
        } else {
            self.snap_accum + value
        };
        self.last_decay = Some(now);

        let accum = self.snap_accum.abs();
        if accum < threshold {
            trace!("Axis snap: suppressing cross axis (accum={}, threshold={})", self.snap_accum, threshold);
            return 0;
        }
        // Cap so that the accumulator decays under the threshold within one timeout
        if accum > threshold * 2 {
            self.snap_accum = self.snap_accum.signum() * threshold * 2;
        }
        value as i16
    }

    /// Scale by `multiplier / divisor`, carrying the truncated remainder
    /// over to the next sample of the same axis.
    pub fn scale(&mut self, is_x: bool, value: i16, multiplier: u32, divisor: u32) -> i16 {
        let remainder = if is_x {
            &mut self.remainder_x
        } else {
            &mut self.remainder_y
        };
        let total = value as i64 * multiplier as i64 + *remainder;
        let output = total / divisor as i64;
        *remainder = total - output * divisor as i64;
        clamp_i16(output)
    }
}
