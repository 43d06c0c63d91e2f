//! # Input Runtime Types
//!
//! Plain data shared by the runtime pointer input processors, the persisted
//! settings record and host side tools.
//!
//! ## Modules
//!
//! - [`config`] - Tunables of one processor and the axis snap mode
//! - [`codes`] - Input event types and relative axis codes
//! - [`keycode`] - HID usage helpers used by the keep-active allow-list
//! - [`notification`] - Payload of the "processor changed" stream

#![no_std]

pub mod codes;
pub mod config;
pub mod keycode;
pub mod notification;
