//! Oven heater driver (SSR on a PWM output).
//!
//! The controller works in PID output units (`0..=full_scale`, 4095 by
//! default); this driver scales that onto the PWM peripheral's duty range.
//!
//! ## Safety contract
//!
//! `disable()` writes zero duty before marking the heater off, and commands
//! issued while disabled are forced to zero. The heater never heats unless
//! the process state machine has explicitly enabled it.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::pwm::SetDutyCycle`: an LEDC channel on
//! ESP-IDF, the simulated oven on the host, a recording mock in tests.

use embedded_hal::pwm::SetDutyCycle;
use log::{info, warn};

use crate::app::ports::HeaterPort;

pub struct Heater<P> {
    pwm: P,
    full_scale: f32,
    enabled: bool,
    command: f32,
}

impl<P: SetDutyCycle> Heater<P> {
    /// A `full_scale` that is not positive leaves the heater unable to
    /// drive: every command is forced to zero duty.
    pub fn new(mut pwm: P, full_scale: f32) -> Self {
        if pwm.set_duty_cycle_fully_off().is_err() {
            warn!("heater: initial duty write failed");
        }
        let full_scale = if full_scale > 0.0 {
            full_scale
        } else {
            warn!("heater: full scale {full_scale} is not positive, output locked at zero");
            0.0
        };
        Self {
            pwm,
            full_scale,
            enabled: false,
            command: 0.0,
        }
    }

    fn write_duty(&mut self, duty: u16) {
        if self.pwm.set_duty_cycle(duty).is_err() {
            warn!("heater: duty write failed ({duty})");
        }
    }

    /// Duty value that corresponds to `command`.
    fn duty_for(&self, command: f32) -> u16 {
        if self.full_scale <= 0.0 {
            return 0;
        }
        let max = f32::from(self.pwm.max_duty_cycle());
        ((command / self.full_scale) * max).round().clamp(0.0, max) as u16
    }

    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> HeaterPort for Heater<P> {
    fn enable(&mut self) {
        if !self.enabled {
            info!("heater: enabled");
        }
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.write_duty(0);
        self.command = 0.0;
        if self.enabled {
            info!("heater: disabled");
        }
        self.enabled = false;
    }

    fn set_command(&mut self, command: f32) {
        let command = if self.enabled && command.is_finite() && self.full_scale > 0.0 {
            command.clamp(0.0, self.full_scale)
        } else {
            0.0
        };
        self.command = command;
        let duty = self.duty_for(command);
        self.write_duty(duty);
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn command(&self) -> f32 {
        self.command
    }
}
