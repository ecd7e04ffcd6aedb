//! Console commands against the full host stack: simulated oven behind the
//! hardware adapter, reflow object on its own thread.

use reflow::adapters::hardware::HardwareAdapter;
use reflow::adapters::sim_oven::SimOven;
use reflow::cmd::CommandRegistry;
use reflow::config::SystemConfig;
use reflow::diagnostics;
use reflow::drivers::heater::Heater;
use reflow::error::{CommandError, ThermoFault};
use reflow::reflow::{ReflowHandle, ReflowState};
use reflow::sensors::thermocouple::Max31855;
use reflow::time_event::TimeEventRegistry;

use crate::mock_hw::{eventually, wait_for_state};

struct Bench {
    oven: SimOven,
    registry: &'static TimeEventRegistry,
    handle: ReflowHandle,
    console: CommandRegistry,
}

fn bench() -> Bench {
    let config = SystemConfig::default();
    let oven = SimOven::new(25.0);
    let hw = HardwareAdapter::new(
        Max31855::new(oven.thermocouple()),
        Heater::new(oven.heater_pwm(), config.pid.out_max),
    );
    let registry: &'static TimeEventRegistry = Box::leak(Box::new(TimeEventRegistry::new()));
    let handle = reflow::reflow::start(&config, hw, registry).unwrap();
    let mut console = CommandRegistry::new();
    diagnostics::register_all(&mut console, handle.clone()).unwrap();
    Bench {
        oven,
        registry,
        handle,
        console,
    }
}

fn run(console: &CommandRegistry, line: &str) -> (Result<(), CommandError>, String) {
    let mut out = String::new();
    let result = console.execute(line, &mut out);
    (result, out)
}

#[test]
fn start_heats_the_simulated_oven() {
    let b = bench();
    let (result, out) = run(&b.console, "reflow start");
    assert_eq!(result, Ok(()));
    assert!(out.contains("start requested"));
    assert!(wait_for_state(&b.handle, ReflowState::Preheat));

    // One sample period drives the SSR.
    for _ in 0..500 {
        b.registry.tick();
    }
    assert!(eventually(|| b.oven.power() > 0.0));

    let (_, out) = run(&b.console, "reflow get state");
    assert!(out.contains("State: Preheat"));
    assert!(out.contains("Heater: on"));

    run(&b.console, "reflow stop").0.unwrap();
    assert!(wait_for_state(&b.handle, ReflowState::Reset));
    assert!(eventually(|| b.oven.power() == 0.0));
}

#[test]
fn hot_oven_start_is_refused_by_the_state_machine() {
    let b = bench();
    b.oven.set_temperature(120.0);
    let (result, _) = run(&b.console, "reflow start");
    // The command is accepted; the policy refusal happens in Reset.
    assert_eq!(result, Ok(()));
    assert!(eventually(|| b.handle.status().temperature_c == Some(120.0)));
    assert_eq!(b.handle.status().state, ReflowState::Reset);
    assert_eq!(b.oven.power(), 0.0);
}

#[test]
fn converter_fault_refuses_start() {
    let b = bench();
    b.oven.inject_fault(Some(ThermoFault::ShortToGnd));
    run(&b.console, "reflow start").0.unwrap();
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert_eq!(b.handle.status().state, ReflowState::Reset);
}

#[test]
fn malformed_lines_never_reach_the_state_machine() {
    let b = bench();
    for line in [
        "",
        "oven start",
        "reflow go",
        "reflow start now",
        "reflow get",
        "reflow get pid profile",
        "reflow start a b c d e f g h i",
    ] {
        let (result, out) = run(&b.console, line);
        let err = result.unwrap_err();
        assert_ne!(err.code(), 0, "{line:?}");
        assert!(out.starts_with("Error"), "{line:?}: {out}");
    }
    std::thread::sleep(std::time::Duration::from_millis(50));
    assert_eq!(b.handle.status().state, ReflowState::Reset);
    assert_eq!(b.oven.power(), 0.0);
}

#[test]
fn help_lists_both_clients() {
    let b = bench();
    let (result, out) = run(&b.console, "help");
    assert_eq!(result, Ok(()));
    for needle in ["reflow get", "reflow start", "reflow stop", "log get", "log set"] {
        assert!(out.contains(needle), "missing {needle}");
    }
}
