//! Reflow action functions and the state × signal table.
//!
//! Every cell is a plain `fn` pointer; the table is rebuilt once per
//! controller and never changes.
//!
//! ```text
//!  RESET ──[START, oven cool]──▶ PREHEAT ──[REACH_TEMP]──▶ SOAK
//!    ▲                                                       │
//!    │                                                  [REACH_TIME]
//!    │                                                       ▼
//!  COOLDOWN ◀──[REACH_TIME]── PEAK ◀──[REACH_TEMP]──────── RAMP_UP
//!    │
//!    └──[REACH_TEMP]──▶ RESET
//!
//!  Any non-Reset state ──[STOP]──▶ RESET
//! ```

use log::{debug, info, warn};

use super::{ReflowController, ReflowSignal, ReflowState, StateTable, Status};
use crate::app::ports::{HeaterPort, ThermocouplePort};
use crate::config::PhaseKind;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the state table. Columns follow [`ReflowSignal`] order:
/// Init, Entry, Exit, Start, ReachTime, ReachTemp, Stop, Sample.
pub fn build_state_table<H: ThermocouplePort + HeaterPort>() -> StateTable<H> {
    [
        // Index 0 — Reset
        [reset_init, reset_entry, ignore, reset_start, ignore, ignore, ignore, ignore],
        // Index 1 — Preheat
        [ignore, preheat_entry, ignore, ignore, ignore, preheat_reached, stop, sample],
        // Index 2 — Soak
        [ignore, soak_entry, phase_exit, ignore, soak_elapsed, ignore, stop, sample],
        // Index 3 — RampUp
        [ignore, ramp_up_entry, ignore, ignore, ignore, ramp_up_reached, stop, sample],
        // Index 4 — Peak
        [ignore, peak_entry, phase_exit, ignore, peak_elapsed, ignore, stop, sample],
        // Index 5 — Cooldown
        [ignore, cooldown_entry, ignore, ignore, ignore, cooldown_reached, stop, sample],
    ]
}

fn ignore<H>(_: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    Status::Ignored
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared actions
// ═══════════════════════════════════════════════════════════════════════════

fn stop<H: ThermocouplePort + HeaterPort>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    ctl.sample_timer.disarm();
    info!("{}: stop requested", ctl.state);
    Status::Transition(ReflowState::Reset)
}

/// ReachTime phases arm a one-shot on entry; leaving early must cancel it.
fn phase_exit<H>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    ctl.phase_timer.disarm();
    Status::Handled
}

/// One PID period: read, check the phase goal, regulate.
fn sample<H: ThermocouplePort + HeaterPort>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    let temp = match ctl.hw.read_celsius() {
        Ok(t) => t,
        Err(fault) => {
            warn!("{}: {}, aborting profile", ctl.state, fault);
            ctl.post_self(ReflowSignal::Stop);
            return Status::Handled;
        }
    };
    ctl.last_temp = Some(temp);

    let Some(phase) = ctl.phase(ctl.state) else {
        return Status::Ignored;
    };
    match phase.kind {
        PhaseKind::ReachTemperature => {
            if (temp - phase.target_c).abs() <= ctl.config.runtime.temp_tolerance_c {
                ctl.post_self(ReflowSignal::ReachTemp);
            }
        }
        PhaseKind::ReachTime => {
            let next = ctl.setpoint + ctl.ramp_step;
            ctl.setpoint = if ctl.ramp_step >= 0.0 {
                next.min(phase.target_c)
            } else {
                next.max(phase.target_c)
            };
        }
    }

    let output = ctl.pid.compute(ctl.setpoint, temp);
    ctl.hw.set_command(output);
    debug!(
        "{}: pv={:.2} sp={:.2} out={:.0}",
        ctl.state, temp, ctl.setpoint, output
    );
    Status::Handled
}

// ═══════════════════════════════════════════════════════════════════════════
//  RESET — heater off, waiting for an operator start
// ═══════════════════════════════════════════════════════════════════════════

fn reset_init<H>(_: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    Status::InitialTransition(ReflowState::Reset)
}

fn reset_entry<H: ThermocouplePort + HeaterPort>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    ctl.hw.set_command(0.0);
    ctl.hw.disable();
    ctl.pid.reset();
    ctl.phase_timer.disarm();
    ctl.sample_timer.disarm();
    ctl.setpoint = 0.0;
    ctl.ramp_step = 0.0;
    info!("RESET: heater off, idle");
    Status::Handled
}

fn reset_start<H: ThermocouplePort + HeaterPort>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    let limit = ctl.config.profile[ReflowState::Cooldown as usize - 1].target_c;
    match ctl.hw.read_celsius() {
        Err(fault) => {
            warn!("RESET: start refused, {}", fault);
            Status::Handled
        }
        Ok(t) if t > limit => {
            ctl.last_temp = Some(t);
            warn!(
                "RESET: start refused, oven at {:.1}°C must cool to {:.1}°C first",
                t, limit
            );
            Status::Handled
        }
        Ok(t) => {
            ctl.last_temp = Some(t);
            info!("RESET: starting profile at {:.1}°C", t);
            Status::Transition(ReflowState::Preheat)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PREHEAT — heat to the preheat target
// ═══════════════════════════════════════════════════════════════════════════

fn preheat_entry<H: ThermocouplePort + HeaterPort>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    let target = ctl.config.profile[ReflowState::Preheat as usize - 1].target_c;
    ctl.hw.enable();
    ctl.setpoint = target;
    ctl.ramp_step = 0.0;
    let ticks = ctl.config.sample_ticks();
    ctl.sample_timer.arm(ticks, ticks);
    info!("PREHEAT: heating to {:.1}°C, sampling every {} ticks", target, ticks);
    Status::Handled
}

fn preheat_reached<H>(_: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    Status::Transition(ReflowState::Soak)
}

// ═══════════════════════════════════════════════════════════════════════════
//  SOAK — ramp the setpoint slowly to the soak target over the duration
// ═══════════════════════════════════════════════════════════════════════════

fn soak_entry<H>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    let phase = ctl.config.profile[ReflowState::Soak as usize - 1];
    let samples = (phase.duration_ms as f32 / 1000.0) / ctl.config.pid.ts_secs;
    ctl.ramp_step = (phase.target_c - ctl.setpoint) / samples;
    ctl.phase_timer.arm(ctl.config.duration_ticks(&phase), 0);
    info!(
        "SOAK: {:.1} -> {:.1}°C over {}ms ({:.4}°C/sample)",
        ctl.setpoint, phase.target_c, phase.duration_ms, ctl.ramp_step
    );
    Status::Handled
}

fn soak_elapsed<H>(_: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    Status::Transition(ReflowState::RampUp)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RAMP_UP — heat to reflow temperature
// ═══════════════════════════════════════════════════════════════════════════

fn ramp_up_entry<H>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    ctl.setpoint = ctl.config.profile[ReflowState::RampUp as usize - 1].target_c;
    ctl.ramp_step = 0.0;
    info!("RAMP_UP: heating to {:.1}°C", ctl.setpoint);
    Status::Handled
}

fn ramp_up_reached<H>(_: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    Status::Transition(ReflowState::Peak)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PEAK — hold reflow temperature for the duration
// ═══════════════════════════════════════════════════════════════════════════

fn peak_entry<H>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    let phase = ctl.config.profile[ReflowState::Peak as usize - 1];
    ctl.setpoint = phase.target_c;
    ctl.ramp_step = 0.0;
    ctl.phase_timer.arm(ctl.config.duration_ticks(&phase), 0);
    info!("PEAK: holding {:.1}°C for {}ms", phase.target_c, phase.duration_ms);
    Status::Handled
}

fn peak_elapsed<H>(_: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    Status::Transition(ReflowState::Cooldown)
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN — regulate down to the safe-handling temperature
// ═══════════════════════════════════════════════════════════════════════════

fn cooldown_entry<H>(ctl: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    ctl.setpoint = ctl.config.profile[ReflowState::Cooldown as usize - 1].target_c;
    ctl.ramp_step = 0.0;
    info!("COOLDOWN: cooling to {:.1}°C", ctl.setpoint);
    Status::Handled
}

fn cooldown_reached<H>(_: &mut ReflowController<H>, _: ReflowSignal) -> Status {
    info!("COOLDOWN: profile complete");
    Status::Transition(ReflowState::Reset)
}
