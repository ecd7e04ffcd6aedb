//! Port traits — the hexagonal boundary between the process controller and
//! the oven hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ReflowController (domain)
//! ```
//!
//! Driven adapters (thermocouple converter, heater output) implement these
//! traits. The [`ReflowController`](crate::reflow::ReflowController)
//! consumes them via generics, so the state machine never touches a
//! peripheral directly and runs unchanged against mocks on the host.

use crate::error::ThermoFault;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: oven temperature.
pub trait ThermocouplePort {
    /// Latest hot-junction temperature in Celsius, or the converter fault.
    fn read_celsius(&mut self) -> Result<f32, ThermoFault>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the heating element.
pub trait HeaterPort {
    /// Allow the heater to be driven.
    fn enable(&mut self);

    /// Force the output to zero and refuse further drive until re-enabled.
    fn disable(&mut self);

    /// Drive the heater with a controller output (PID units). Ignored
    /// (held at zero) while disabled.
    fn set_command(&mut self, command: f32);

    fn is_enabled(&self) -> bool;

    /// Last command actually applied.
    fn command(&self) -> f32;
}
