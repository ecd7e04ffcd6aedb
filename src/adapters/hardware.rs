//! Hardware adapter — bridges the oven peripherals to the domain ports.
//!
//! Owns the thermocouple converter and the heater driver and exposes them
//! through [`ThermocouplePort`] and [`HeaterPort`]. This is the only type
//! the reflow controller is instantiated with in the firmware binary. The
//! bus and PWM types are generic, so the same adapter wraps ESP-IDF
//! peripherals on the device and the simulated oven on the host.

use embedded_hal::pwm::SetDutyCycle;
use embedded_hal::spi::SpiDevice;

use crate::app::ports::{HeaterPort, ThermocouplePort};
use crate::drivers::heater::Heater;
use crate::error::ThermoFault;
use crate::sensors::thermocouple::{Max31855, ThermoReading};

/// Concrete adapter that combines all oven hardware behind port traits.
pub struct HardwareAdapter<SPI, PWM> {
    thermocouple: Max31855<SPI>,
    heater: Heater<PWM>,
}

impl<SPI: SpiDevice, PWM: SetDutyCycle> HardwareAdapter<SPI, PWM> {
    pub fn new(thermocouple: Max31855<SPI>, heater: Heater<PWM>) -> Self {
        Self {
            thermocouple,
            heater,
        }
    }

    /// Last good converter frame, including the cold-junction temperature.
    pub fn last_reading(&self) -> Option<ThermoReading> {
        self.thermocouple.last()
    }
}

// ── ThermocouplePort implementation ──────────────────────────

impl<SPI: SpiDevice, PWM: SetDutyCycle> ThermocouplePort for HardwareAdapter<SPI, PWM> {
    fn read_celsius(&mut self) -> Result<f32, ThermoFault> {
        self.thermocouple.read_celsius()
    }
}

// ── HeaterPort implementation ────────────────────────────────

impl<SPI: SpiDevice, PWM: SetDutyCycle> HeaterPort for HardwareAdapter<SPI, PWM> {
    fn enable(&mut self) {
        self.heater.enable();
    }

    fn disable(&mut self) {
        self.heater.disable();
    }

    fn set_command(&mut self, command: f32) {
        self.heater.set_command(command);
    }

    fn is_enabled(&self) -> bool {
        self.heater.is_enabled()
    }

    fn command(&self) -> f32 {
        self.heater.command()
    }
}
