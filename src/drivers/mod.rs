//! Actuator drivers and the time-event heartbeat.

pub mod heater;
pub mod hw_timer;
