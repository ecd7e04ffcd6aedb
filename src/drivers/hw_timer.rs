//! Heartbeat timer using ESP-IDF's esp_timer API.
//!
//! One periodic timer drives [`TimeEventRegistry::tick`] for every time
//! event in the system. On simulation targets a dedicated thread sleeps
//! for the period between ticks.
//!
//! Timer callbacks execute in the ESP timer task context (not ISR), so
//! they may take the registry's critical section and post to mailboxes.

use log::info;

use crate::error::TimerError;
use crate::time_event::TimeEventRegistry;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn heartbeat_cb(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` is the `&'static TimeEventRegistry` passed to
    // esp_timer_create in start_heartbeat.
    let registry = unsafe { &*(arg as *const TimeEventRegistry) };
    registry.tick();
}

/// Start ticking `registry` every `period_ms` milliseconds.
#[cfg(target_os = "espidf")]
pub fn start_heartbeat(registry: &'static TimeEventRegistry, period_ms: u32) -> Result<(), TimerError> {
    let mut handle: esp_timer_handle_t = core::ptr::null_mut();
    let args = esp_timer_create_args_t {
        callback: Some(heartbeat_cb),
        arg: registry as *const TimeEventRegistry as *mut core::ffi::c_void,
        dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
        name: b"heartbeat\0".as_ptr() as *const _,
        skip_unhandled_events: false,
    };

    // SAFETY: `args` outlives the create call; the handle is never deleted,
    // the heartbeat runs until reset.
    unsafe {
        let ret = esp_timer_create(&args, &mut handle);
        if ret != ESP_OK {
            return Err(TimerError::HeartbeatFailed(ret));
        }
        let ret = esp_timer_start_periodic(handle, u64::from(period_ms) * 1000);
        if ret != ESP_OK {
            return Err(TimerError::HeartbeatFailed(ret));
        }
    }

    info!("hw_timer: heartbeat @{}ms started", period_ms);
    Ok(())
}

/// Simulation fallback — a sleeping thread.
#[cfg(not(target_os = "espidf"))]
pub fn start_heartbeat(registry: &'static TimeEventRegistry, period_ms: u32) -> Result<(), TimerError> {
    let period = std::time::Duration::from_millis(u64::from(period_ms));
    std::thread::Builder::new()
        .name("heartbeat".into())
        .spawn(move || {
            loop {
                std::thread::sleep(period);
                registry.tick();
            }
        })
        .map_err(|_| TimerError::HeartbeatFailed(-1))?;

    info!("hw_timer(sim): heartbeat @{}ms started", period_ms);
    Ok(())
}
