//! Simulated oven for host builds.
//!
//! A first-order thermal plant shared between two peripheral stand-ins:
//!
//! ```text
//!   SimHeaterPwm ──duty──▶ ┌───────────┐ ──frame──▶ SimThermocoupleSpi
//!   (SetDutyCycle)         │   Plant   │            (SpiDevice, MAX31855K)
//!                          └───────────┘
//!   dT/dt = (ambient + power × gain − T) / tau
//! ```
//!
//! The plant advances lazily on every access using wall-clock time scaled
//! by `time_scale`, so the host binary can run a full profile in seconds.
//! Tests call [`SimOven::step`] with a fixed `time_scale` of zero instead.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use embedded_hal::pwm::{self, SetDutyCycle};
use embedded_hal::spi::{self, ErrorKind, Operation, SpiDevice};

use crate::error::ThermoFault;
use crate::sensors::thermocouple::encode;

const FAULT_FLAG: u32 = 1 << 16;
const SIM_MAX_DUTY: u16 = 1000;

struct Plant {
    temp_c: f32,
    ambient_c: f32,
    /// Steady-state rise above ambient at full power.
    gain_c: f32,
    tau_secs: f32,
    /// Heater power, 0.0..=1.0.
    power: f32,
    fault: Option<ThermoFault>,
    time_scale: f32,
    last: Instant,
}

impl Plant {
    fn advance(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32() * self.time_scale;
        self.last = now;
        self.integrate(dt);
    }

    fn integrate(&mut self, dt_secs: f32) {
        if dt_secs <= 0.0 {
            return;
        }
        let target = self.ambient_c + self.power * self.gain_c;
        let alpha = 1.0 - (-dt_secs / self.tau_secs).exp();
        self.temp_c += (target - self.temp_c) * alpha;
    }
}

/// Handle to the shared plant. Cheap to clone.
#[derive(Clone)]
pub struct SimOven {
    plant: Arc<Mutex<Plant>>,
}

impl SimOven {
    /// Oven at `ambient_c`, frozen in time until [`step`](Self::step) or
    /// [`with_time_scale`](Self::with_time_scale) is used.
    pub fn new(ambient_c: f32) -> Self {
        Self {
            plant: Arc::new(Mutex::new(Plant {
                temp_c: ambient_c,
                ambient_c,
                gain_c: 250.0,
                tau_secs: 60.0,
                power: 0.0,
                fault: None,
                time_scale: 0.0,
                last: Instant::now(),
            })),
        }
    }

    /// Run the plant against the wall clock, `scale` simulated seconds per
    /// real second.
    pub fn with_time_scale(self, scale: f32) -> Self {
        {
            let mut p = self.lock();
            p.time_scale = scale.max(0.0);
            p.last = Instant::now();
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, Plant> {
        self.plant.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance the plant by a fixed simulated interval.
    pub fn step(&self, dt_secs: f32) {
        self.lock().integrate(dt_secs);
    }

    pub fn temperature(&self) -> f32 {
        let mut p = self.lock();
        p.advance();
        p.temp_c
    }

    /// Force the oven temperature (e.g. start hot).
    pub fn set_temperature(&self, celsius: f32) {
        self.lock().temp_c = celsius;
    }

    pub fn power(&self) -> f32 {
        self.lock().power
    }

    /// Make the converter report `fault` until cleared with `None`.
    pub fn inject_fault(&self, fault: Option<ThermoFault>) {
        self.lock().fault = fault;
    }

    pub fn thermocouple(&self) -> SimThermocoupleSpi {
        SimThermocoupleSpi { oven: self.clone() }
    }

    pub fn heater_pwm(&self) -> SimHeaterPwm {
        SimHeaterPwm {
            oven: self.clone(),
            duty: 0,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Thermocouple converter
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SimBusError;

impl spi::Error for SimBusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// MAX31855K stand-in: answers every read with a frame for the current
/// plant temperature, or the injected fault.
pub struct SimThermocoupleSpi {
    oven: SimOven,
}

impl SimThermocoupleSpi {
    fn frame(&self) -> Result<u32, SimBusError> {
        let mut p = self.oven.lock();
        p.advance();
        match p.fault {
            None => Ok(encode(p.temp_c, p.ambient_c)),
            Some(ThermoFault::ShortToVcc) => Ok(FAULT_FLAG | 1 << 2),
            Some(ThermoFault::ShortToGnd) => Ok(FAULT_FLAG | 1 << 1),
            Some(ThermoFault::OpenCircuit) => Ok(FAULT_FLAG | 1),
            Some(ThermoFault::AllZeros) => Ok(0),
            Some(ThermoFault::Bus) => Err(SimBusError),
        }
    }
}

impl spi::ErrorType for SimThermocoupleSpi {
    type Error = SimBusError;
}

impl SpiDevice for SimThermocoupleSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), SimBusError> {
        let bytes = self.frame()?.to_be_bytes();
        for op in operations {
            if let Operation::Read(buf) = op {
                for (dst, src) in buf.iter_mut().zip(bytes.iter().cycle()) {
                    *dst = *src;
                }
            }
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Heater output
// ───────────────────────────────────────────────────────────────

/// PWM stand-in: duty cycle becomes plant heating power.
pub struct SimHeaterPwm {
    oven: SimOven,
    duty: u16,
}

impl pwm::ErrorType for SimHeaterPwm {
    type Error = core::convert::Infallible;
}

impl SetDutyCycle for SimHeaterPwm {
    fn max_duty_cycle(&self) -> u16 {
        SIM_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty.min(SIM_MAX_DUTY);
        let mut p = self.oven.lock();
        p.advance();
        p.power = f32::from(self.duty) / f32::from(SIM_MAX_DUTY);
        Ok(())
    }
}
