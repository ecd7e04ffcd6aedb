//! System configuration parameters
//!
//! All tunable parameters for the reflow controller: PID gains, the
//! temperature profile and runtime sizing. Defaults reproduce the values the
//! oven was commissioned with; the host binary can override them from a
//! JSON document.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of profile phases (one per non-Reset process state).
pub const PHASE_COUNT: usize = 5;

// ---------------------------------------------------------------------------
// PID
// ---------------------------------------------------------------------------

/// Gains, filter constant, sample period and output limits of the PID loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
    /// Derivative low-pass time constant (seconds)
    pub tau: f32,
    /// Sample period (seconds)
    pub ts_secs: f32,
    pub out_min: f32,
    pub out_max: f32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 10.0,
            ki: 0.0,
            kd: 0.0,
            tau: 1.0,
            ts_secs: 0.5,
            out_min: 0.0,
            out_max: 4095.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// How a phase decides it is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseKind {
    /// Done when the oven reaches the target temperature.
    ReachTemperature,
    /// Done when the phase duration elapses; setpoint ramps toward target.
    ReachTime,
}

/// One step of the reflow profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReflowPhase {
    pub kind: PhaseKind,
    /// Target temperature (Celsius)
    pub target_c: f32,
    /// Phase duration (milliseconds); only meaningful for `ReachTime`.
    pub duration_ms: u32,
}

impl ReflowPhase {
    pub const fn reach_temp(target_c: f32) -> Self {
        Self {
            kind: PhaseKind::ReachTemperature,
            target_c,
            duration_ms: 0,
        }
    }

    pub const fn reach_time(target_c: f32, duration_ms: u32) -> Self {
        Self {
            kind: PhaseKind::ReachTime,
            target_c,
            duration_ms,
        }
    }
}

/// Phases in process order: Preheat, Soak, RampUp, Peak, Cooldown.
pub type Profile = [ReflowPhase; PHASE_COUNT];

/// Completion rule each phase slot must use. Soak and Peak are timed, the
/// others are temperature-driven.
pub const PHASE_KINDS: [PhaseKind; PHASE_COUNT] = [
    PhaseKind::ReachTemperature,
    PhaseKind::ReachTime,
    PhaseKind::ReachTemperature,
    PhaseKind::ReachTime,
    PhaseKind::ReachTemperature,
];

/// The lead-free profile the oven ships with.
pub const DEFAULT_PROFILE: Profile = [
    ReflowPhase::reach_temp(125.0),
    ReflowPhase::reach_time(180.0, 120_000),
    ReflowPhase::reach_temp(225.0),
    ReflowPhase::reach_time(225.0, 5_000),
    ReflowPhase::reach_temp(35.0),
];

// ---------------------------------------------------------------------------
// Runtime sizing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Time-event heartbeat period (milliseconds)
    pub heartbeat_ms: u32,
    /// Reflow actor stack (KB)
    pub reflow_stack_kb: usize,
    /// Reflow actor FreeRTOS priority
    pub reflow_priority: u8,
    /// Band around a ReachTemperature target that counts as reached (Celsius)
    pub temp_tolerance_c: f32,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_ms: 1,
            reflow_stack_kb: 4,
            reflow_priority: 5,
            temp_tolerance_c: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub pid: PidConfig,
    pub profile: Profile,
    pub runtime: RuntimeConfig,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            pid: PidConfig::default(),
            profile: DEFAULT_PROFILE,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl SystemConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Sample period expressed in heartbeat ticks.
    pub fn sample_ticks(&self) -> u32 {
        ((self.pid.ts_secs * 1000.0).round() as u32 / self.runtime.heartbeat_ms).max(1)
    }

    /// Phase duration expressed in heartbeat ticks.
    pub fn duration_ticks(&self, phase: &ReflowPhase) -> u32 {
        (phase.duration_ms / self.runtime.heartbeat_ms).max(1)
    }

    /// Reject parameter sets the controller cannot run safely.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pid = &self.pid;
        if !(pid.ts_secs > 0.0) {
            return Err(ConfigError::Invalid("pid.ts_secs"));
        }
        if !(pid.tau >= 0.0) {
            return Err(ConfigError::Invalid("pid.tau"));
        }
        if !(pid.out_max > pid.out_min) {
            return Err(ConfigError::Invalid("pid output limits"));
        }
        // The heater scales commands over 0..=out_max.
        if !(pid.out_max > 0.0) {
            return Err(ConfigError::Invalid("pid.out_max"));
        }
        let heartbeat = self.runtime.heartbeat_ms;
        if heartbeat == 0 {
            return Err(ConfigError::Invalid("runtime.heartbeat_ms"));
        }
        if !(self.runtime.temp_tolerance_c > 0.0) {
            return Err(ConfigError::Invalid("runtime.temp_tolerance_c"));
        }
        if self.runtime.reflow_stack_kb == 0 {
            return Err(ConfigError::Invalid("runtime.reflow_stack_kb"));
        }
        // Timers count whole heartbeats; the soak ramp assumes exact ones.
        let sample_ms = (pid.ts_secs * 1000.0).round() as u32;
        if (sample_ms as f32 - pid.ts_secs * 1000.0).abs() > 1e-3 || sample_ms % heartbeat != 0 {
            return Err(ConfigError::Invalid("pid.ts_secs is not a whole number of heartbeats"));
        }
        for (phase, expected) in self.profile.iter().zip(PHASE_KINDS) {
            if phase.kind != expected {
                return Err(ConfigError::Invalid("phase kind does not match its state"));
            }
            if !phase.target_c.is_finite() {
                return Err(ConfigError::Invalid("phase target"));
            }
            if phase.kind == PhaseKind::ReachTime {
                if phase.duration_ms < sample_ms {
                    return Err(ConfigError::Invalid("phase duration shorter than sample period"));
                }
                if phase.duration_ms % heartbeat != 0 {
                    return Err(ConfigError::Invalid("phase duration is not a whole number of heartbeats"));
                }
            }
        }
        Ok(())
    }
}
