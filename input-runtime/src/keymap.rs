//! Keymap collaborator of the runtime processors.
//!
//! The processors only need to know which layers are on, to toggle one layer,
//! and what a key position resolves to. [`Keymap`] is that seam; firmware
//! implements it on top of its own keymap. [`LayerStack`] is a small fixed
//! size implementation for boards without one and for tests.

use input_runtime_types::keycode::is_modifier;

use crate::error::KeymapError;

/// What a keymap position is bound to, as far as the processors care
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Binding {
    /// Falls through to the next active layer below
    #[default]
    Transparent,
    /// Plain key press of a packed HID usage
    KeyPress(u32),
    /// Any other behavior: layer keys, mouse keys, macros...
    Other,
}

impl Binding {
    pub fn is_transparent(&self) -> bool {
        matches!(self, Binding::Transparent)
    }

    /// HID usage if this is a plain key press
    pub fn keycode(&self) -> Option<u32> {
        match self {
            Binding::KeyPress(usage) => Some(*usage),
            _ => None,
        }
    }
}

pub trait Keymap {
    fn num_layers(&self) -> u8;

    fn is_layer_active(&self, layer: u8) -> bool;

    fn activate_layer(&mut self, layer: u8) -> Result<(), KeymapError>;

    fn deactivate_layer(&mut self, layer: u8) -> Result<(), KeymapError>;

    /// Binding of `position` on `layer`, `None` if either is out of range
    fn binding_at(&self, layer: u8, position: u16) -> Option<Binding>;

    /// Binding that a press at `position` resolves to, looking through the
    /// active layers from the highest down and skipping transparent ones.
    fn resolve_binding(&self, position: u16) -> Option<Binding> {
        (0..self.num_layers())
            .rev()
            .filter(|&layer| self.is_layer_active(layer))
            .filter_map(|layer| self.binding_at(layer, position))
            .find(|binding| !binding.is_transparent())
    }

    /// Whether any layer in the bitmask is active
    fn any_layer_active(&self, mask: u32) -> bool {
        (0..self.num_layers().min(32)).any(|layer| mask & (1 << layer) != 0 && self.is_layer_active(layer))
    }
}

/// Whether a key press at `position` should interrupt the pointer layer.
///
/// Keys bound on the pointer layer itself, transparent positions and kept
/// keycodes never interrupt. An empty `keep_keycodes` keeps the modifiers.
pub(crate) fn interrupts_temp_layer<K: Keymap>(
    keymap: &K,
    temp_layer: u8,
    position: u16,
    keep_keycodes: &[u32],
) -> bool {
    if keymap
        .binding_at(temp_layer, position)
        .is_some_and(|binding| !binding.is_transparent())
    {
        return false;
    }

    match keymap.resolve_binding(position) {
        None => false,
        Some(Binding::KeyPress(usage)) => {
            let kept = if keep_keycodes.is_empty() {
                is_modifier(usage)
            } else {
                keep_keycodes.contains(&usage)
            };
            !kept
        }
        Some(_) => true,
    }
}

/// Keymap with a fixed number of layers and positions.
///
/// Layer 0 is the default layer and always active.
pub struct LayerStack<const NUM_LAYER: usize, const NUM_POS: usize> {
    layers: [[Binding; NUM_POS]; NUM_LAYER],
    /// Current state of each layer
    layer_state: [bool; NUM_LAYER],
}

impl<const NUM_LAYER: usize, const NUM_POS: usize> LayerStack<NUM_LAYER, NUM_POS> {
    pub fn new(layers: [[Binding; NUM_POS]; NUM_LAYER]) -> Self {
        Self {
            layers,
            layer_state: [false; NUM_LAYER],
        }
    }

    pub fn set_binding(&mut self, layer: u8, position: u16, binding: Binding) {
        if let Some(slot) = self
            .layers
            .get_mut(layer as usize)
            .and_then(|l| l.get_mut(position as usize))
        {
            *slot = binding;
        }
    }

    fn check_layer(&self, layer: u8) -> Result<usize, KeymapError> {
        if (layer as usize) < NUM_LAYER {
            Ok(layer as usize)
        } else {
            warn!(
                "Not a valid layer {}, keyboard supports only {} layers",
                layer, NUM_LAYER
            );
            Err(KeymapError::InvalidLayer(layer))
        }
    }
}

impl<const NUM_LAYER: usize, const NUM_POS: usize> Keymap for LayerStack<NUM_LAYER, NUM_POS> {
    fn num_layers(&self) -> u8 {
        NUM_LAYER as u8
    }

    fn is_layer_active(&self, layer: u8) -> bool {
        layer == 0 || self.layer_state.get(layer as usize).copied().unwrap_or(false)
    }

    fn activate_layer(&mut self, layer: u8) -> Result<(), KeymapError> {
        let idx = self.check_layer(layer)?;
        self.layer_state[idx] = true;
        Ok(())
    }

    fn deactivate_layer(&mut self, layer: u8) -> Result<(), KeymapError> {
        let idx = self.check_layer(layer)?;
        self.layer_state[idx] = false;
        Ok(())
    }

    fn binding_at(&self, layer: u8, position: u16) -> Option<Binding> {
        self.layers.get(layer as usize)?.get(position as usize).copied()
    }
}
