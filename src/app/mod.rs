//! Application boundary.
//!
//! The reflow process interacts with the oven only through the **port
//! traits** defined in [`ports`], keeping the state machine testable
//! without real peripherals.

pub mod ports;
