//! Mock oven hardware for integration tests.
//!
//! The reflow object owns its hardware on its own thread, so the mock is a
//! cheap handle onto shared state: the test keeps one clone to script the
//! thermocouple and inspect every heater call after the fact.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use reflow::app::ports::{HeaterPort, ThermocouplePort};
use reflow::error::ThermoFault;
use reflow::reflow::{ReflowHandle, ReflowState};

// ── Heater call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaterCall {
    Enable,
    Disable,
    Command(f32),
}

#[derive(Debug)]
struct OvenState {
    reading: Result<f32, ThermoFault>,
    enabled: bool,
    command: f32,
    calls: Vec<HeaterCall>,
}

// ── MockOven ──────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct MockOven {
    state: Arc<Mutex<OvenState>>,
}

#[allow(dead_code)]
impl MockOven {
    pub fn at(celsius: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(OvenState {
                reading: Ok(celsius),
                enabled: false,
                command: 0.0,
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OvenState> {
        self.state.lock().unwrap()
    }

    pub fn set_temperature(&self, celsius: f32) {
        self.lock().reading = Ok(celsius);
    }

    pub fn set_fault(&self, fault: ThermoFault) {
        self.lock().reading = Err(fault);
    }

    pub fn heater_on(&self) -> bool {
        self.lock().enabled
    }

    pub fn calls(&self) -> Vec<HeaterCall> {
        self.lock().calls.clone()
    }

    /// Largest command sent while the heater was enabled.
    pub fn peak_command(&self) -> f32 {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                HeaterCall::Command(v) => Some(*v),
                _ => None,
            })
            .fold(0.0, f32::max)
    }
}

impl ThermocouplePort for MockOven {
    fn read_celsius(&mut self) -> Result<f32, ThermoFault> {
        self.lock().reading
    }
}

impl HeaterPort for MockOven {
    fn enable(&mut self) {
        let mut s = self.lock();
        s.enabled = true;
        s.calls.push(HeaterCall::Enable);
    }

    fn disable(&mut self) {
        let mut s = self.lock();
        s.enabled = false;
        s.command = 0.0;
        s.calls.push(HeaterCall::Disable);
    }

    fn set_command(&mut self, command: f32) {
        let mut s = self.lock();
        s.command = if s.enabled { command } else { 0.0 };
        let applied = s.command;
        s.calls.push(HeaterCall::Command(applied));
    }

    fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    fn command(&self) -> f32 {
        self.lock().command
    }
}

// ── Polling helpers ───────────────────────────────────────────

/// Poll `cond` until it holds or two seconds pass.
pub fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}

#[allow(dead_code)]
pub fn wait_for_state(handle: &ReflowHandle, state: ReflowState) -> bool {
    eventually(|| handle.status().state == state)
}
