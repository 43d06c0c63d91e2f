//! # Input Runtime
//!
//! Runtime reconfigurable processors for pointing device input in keyboard
//! firmware. Each processor reshapes relative X/Y samples (scale, rotate,
//! invert, axis snap, map to scroll) and can turn a keymap layer on while the
//! pointing device is in use. Tunables can be changed temporarily, for
//! example while a key is held, or durably, in which case they are saved to
//! a settings store after a debounce window.
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod behavior;
pub mod channel;
pub mod error;
pub mod event;
pub mod keymap;
pub mod processor;
pub mod registry;
pub mod runner;
pub mod scheduler;
pub mod storage;

pub use input_runtime_types as types;

pub(crate) type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Max length of a processor name, also the length of its storage key
pub const PROCESSOR_NAME_MAX_LEN: usize = 8;
/// Time between the last durable write and the settings save
pub const SETTINGS_SAVE_DEBOUNCE_MS: u64 = 60_000;
/// Axis snap decay tick
pub const SNAP_DECAY_TICK_MS: u64 = 50;

pub const KEY_EVENT_CHANNEL_SIZE: usize = 16;
pub const PROCESSOR_CHANGED_CHANNEL_SIZE: usize = 4;
pub const PROCESSOR_CHANGED_CHANNEL_SUBS: usize = 2;
pub const PROCESSOR_CHANGED_CHANNEL_PUBS: usize = 1;
