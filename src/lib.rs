//! Reflow oven controller library.
//!
//! Exposes the runtime (active objects, time events), the reflow process
//! and its drivers for the firmware binary, integration tests and fuzz
//! targets. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod active;
pub mod app;
pub mod cmd;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod error;
pub mod pins;
pub mod reflow;
pub mod time_event;

pub mod adapters;
pub mod drivers;
pub mod sensors;
