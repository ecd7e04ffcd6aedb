//! End-to-end tests of the reflow active object on its own thread.
//!
//! Each test owns a private time-event registry and plays the heartbeat by
//! calling `tick()` directly, in bursts of one sample period. After each
//! burst it waits for the actor to catch up, so the five-slot mailbox is
//! never flooded.

use reflow::config::SystemConfig;
use reflow::error::{PostError, ThermoFault};
use reflow::reflow::{ReflowHandle, ReflowState};
use reflow::time_event::TimeEventRegistry;

use crate::mock_hw::{HeaterCall, MockOven, eventually, wait_for_state};

/// Default gains with short timed phases.
fn fast_profile() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.profile[1].duration_ms = 2_000;
    c.profile[3].duration_ms = 1_000;
    c
}

struct Rig {
    oven: MockOven,
    registry: &'static TimeEventRegistry,
    handle: ReflowHandle,
    ticks_per_sample: u32,
}

impl Rig {
    fn new(celsius: f32) -> Self {
        let config = fast_profile();
        let oven = MockOven::at(celsius);
        let registry: &'static TimeEventRegistry = Box::leak(Box::new(TimeEventRegistry::new()));
        let handle = reflow::reflow::start(&config, oven.clone(), registry).unwrap();
        assert!(wait_for_state(&handle, ReflowState::Reset));
        Self {
            oven,
            registry,
            handle,
            ticks_per_sample: config.sample_ticks(),
        }
    }

    /// Run one sample period of heartbeat and wait for the PID sample it
    /// produces to be applied.
    fn sample(&self) {
        let before = self.commands();
        for _ in 0..self.ticks_per_sample {
            self.registry.tick();
        }
        assert!(eventually(|| self.commands() > before), "sample was not processed");
    }

    fn commands(&self) -> usize {
        self.oven
            .calls()
            .iter()
            .filter(|c| matches!(c, HeaterCall::Command(_)))
            .count()
    }

    fn state(&self) -> ReflowState {
        self.handle.status().state
    }
}

#[test]
fn full_profile_runs_to_completion() {
    let rig = Rig::new(25.0);
    rig.handle.start().unwrap();
    assert!(wait_for_state(&rig.handle, ReflowState::Preheat));
    assert!(rig.oven.heater_on());

    // Preheat: regulate toward 125 °C, then reach it.
    rig.sample();
    assert!(rig.oven.peak_command() > 0.0);
    rig.oven.set_temperature(125.0);
    rig.sample();
    assert!(wait_for_state(&rig.handle, ReflowState::Soak));

    // Soak: 2 s = 4 samples, the phase timer fires with the fourth.
    rig.oven.set_temperature(140.0);
    for _ in 0..4 {
        assert_eq!(rig.state(), ReflowState::Soak);
        rig.sample();
    }
    assert!(wait_for_state(&rig.handle, ReflowState::RampUp));

    rig.oven.set_temperature(224.5);
    rig.sample();
    assert!(wait_for_state(&rig.handle, ReflowState::Peak));
    assert_eq!(rig.handle.status().setpoint_c, 225.0);

    // Peak: 1 s = 2 samples.
    rig.sample();
    rig.sample();
    assert!(wait_for_state(&rig.handle, ReflowState::Cooldown));

    rig.oven.set_temperature(35.5);
    rig.sample();
    assert!(wait_for_state(&rig.handle, ReflowState::Reset));
    assert!(!rig.oven.heater_on());
    assert_eq!(rig.oven.calls().last(), Some(&HeaterCall::Disable));
}

#[test]
fn hot_oven_refuses_to_start() {
    let rig = Rig::new(60.0);
    rig.handle.start().unwrap();
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert_eq!(rig.state(), ReflowState::Reset);
    assert!(!rig.oven.calls().contains(&HeaterCall::Enable));
    assert_eq!(rig.handle.status().temperature_c, Some(60.0));
}

#[test]
fn sensor_fault_mid_run_returns_to_reset() {
    let rig = Rig::new(25.0);
    rig.handle.start().unwrap();
    assert!(wait_for_state(&rig.handle, ReflowState::Preheat));

    rig.oven.set_fault(ThermoFault::OpenCircuit);
    for _ in 0..rig.ticks_per_sample {
        rig.registry.tick();
    }
    assert!(wait_for_state(&rig.handle, ReflowState::Reset));
    assert!(!rig.oven.heater_on());
}

#[test]
fn stop_during_soak_cancels_every_timer() {
    let rig = Rig::new(25.0);
    rig.handle.start().unwrap();
    assert!(wait_for_state(&rig.handle, ReflowState::Preheat));
    rig.oven.set_temperature(125.0);
    rig.sample();
    assert!(wait_for_state(&rig.handle, ReflowState::Soak));

    rig.handle.stop().unwrap();
    assert!(wait_for_state(&rig.handle, ReflowState::Reset));
    assert_eq!(rig.registry.armed(), 0);

    // Nothing fires after the stop: no samples, no phase end.
    let calls = rig.oven.calls().len();
    for _ in 0..10_000 {
        rig.registry.tick();
    }
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert_eq!(rig.oven.calls().len(), calls);
    assert_eq!(rig.state(), ReflowState::Reset);
}

#[test]
fn restart_after_stop_runs_again() {
    let rig = Rig::new(25.0);
    for _ in 0..2 {
        rig.handle.start().unwrap();
        assert!(wait_for_state(&rig.handle, ReflowState::Preheat));
        rig.sample();
        rig.handle.stop().unwrap();
        assert!(wait_for_state(&rig.handle, ReflowState::Reset));
    }
    let enables = rig.oven.calls().iter().filter(|c| **c == HeaterCall::Enable).count();
    assert_eq!(enables, 2);
}

#[test]
fn unstarted_object_rejects_posts() {
    let active = reflow::active::Active::<reflow::reflow::ReflowSignal>::reserve("idle");
    assert_eq!(active.post(reflow::reflow::ReflowSignal::Start), Err(PostError::NotStarted));
}
