//! PID controller for oven temperature
//!
//! Discrete PID with a trapezoidal integrator, a band-limited derivative
//! taken on the measurement (so setpoint steps do not kick the output), and
//! clamping anti-windup: while the last output sits on a limit and the error
//! would push it further out, the integrator is frozen.

use crate::config::PidConfig;

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    kp: f32,
    ki: f32,
    kd: f32,
    tau: f32,
    ts: f32,
    out_min: f32,
    out_max: f32,

    integral: f32,
    derivative: f32,
    prev_error: f32,
    prev_measurement: f32,
    out: f32,
}

impl PidController {
    pub fn new(config: &PidConfig) -> Self {
        Self {
            kp: config.kp,
            ki: config.ki,
            kd: config.kd,
            tau: config.tau,
            ts: config.ts_secs,
            out_min: config.out_min,
            out_max: config.out_max,
            integral: 0.0,
            derivative: 0.0,
            prev_error: 0.0,
            prev_measurement: 0.0,
            out: 0.0,
        }
    }

    /// Compute the next output for one sample period.
    pub fn compute(&mut self, setpoint: f32, measurement: f32) -> f32 {
        let error = setpoint - measurement;

        let p = self.kp * error;

        // Frozen while saturated in the direction the error is driving.
        let saturated = self.out >= self.out_max || self.out <= self.out_min;
        let same_sign = (self.out <= 0.0) == (error <= 0.0);
        if !(saturated && same_sign) {
            self.integral += 0.5 * self.ki * self.ts * (error + self.prev_error);
        }

        // Derivative on measurement through a first-order low-pass.
        let denom = 2.0 * self.tau + self.ts;
        self.derivative = -(2.0 * self.kd * (measurement - self.prev_measurement)
            + (2.0 * self.tau - self.ts) * self.derivative)
            / denom;

        self.out = (p + self.integral + self.derivative).clamp(self.out_min, self.out_max);

        self.prev_error = error;
        self.prev_measurement = measurement;
        self.out
    }

    /// Clear all dynamic state.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.derivative = 0.0;
        self.prev_error = 0.0;
        self.prev_measurement = 0.0;
        self.out = 0.0;
    }

    pub fn integral(&self) -> f32 {
        self.integral
    }

    pub fn output(&self) -> f32 {
        self.out
    }
}
