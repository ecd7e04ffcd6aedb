//! Core-pinned thread spawning for active objects.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread` creates a FreeRTOS
//! task pinned to a specific CPU core with explicit priority and stack size.
//! On non-ESP targets only the name and stack size are honoured.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation on the same thread.

use std::io;
use std::thread::JoinHandle;

/// CPU core identifiers for the ESP32-S3 Xtensa LX7 dual-core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Core {
    /// Core 0 (PRO_CPU) — protocol stacks, console.
    Pro = 0,
    /// Core 1 (APP_CPU) — control loop actors.
    App = 1,
}

/// Scheduler parameters for an active object's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadConfig {
    /// Null-terminated task name (e.g. `"reflow\0"`).
    pub name: &'static str,
    pub stack_kb: usize,
    pub priority: u8,
    pub core: Core,
}

impl ThreadConfig {
    pub const fn new(name: &'static str, stack_kb: usize) -> Self {
        Self {
            name,
            stack_kb,
            priority: 5,
            core: Core::App,
        }
    }

    pub const fn priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub const fn core(mut self, core: Core) -> Self {
        self.core = core;
        self
    }

    fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }
}

#[cfg(target_os = "espidf")]
pub fn spawn(config: &ThreadConfig, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    // SAFETY: the default config is a plain C struct; `thread_name` points at
    // a 'static null-terminated string that outlives the pthread.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = config.core as i32;
        cfg.prio = config.priority as i32;
        cfg.stack_size = (config.stack_kb * 1024) as _;
        cfg.thread_name = config.name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
        }
    }

    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        config.display_name(),
        config.core,
        config.priority,
        config.stack_kb
    );

    std::thread::Builder::new()
        .name(config.display_name().into())
        .spawn(f)
}

/// Host stack floor; debug-build frames and the logger need far more than
/// the device budget.
#[cfg(not(target_os = "espidf"))]
const SIM_MIN_STACK: usize = 256 * 1024;

/// Simulation fallback — ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn(config: &ThreadConfig, f: impl FnOnce() + Send + 'static) -> io::Result<JoinHandle<()>> {
    log::info!(
        "Spawning '{}' (sim, no core pinning, stack={}KB)",
        config.display_name(),
        config.stack_kb
    );

    std::thread::Builder::new()
        .name(config.display_name().into())
        .stack_size((config.stack_kb * 1024).max(SIM_MIN_STACK))
        .spawn(f)
}
