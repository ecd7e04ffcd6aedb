//! Console diagnostics: the `reflow` and `log` command clients.
//!
//! ```text
//!   reflow get <pid|profile|state|*>   dump parameters / live status
//!   reflow start                       post START to the reflow object
//!   reflow stop                        post STOP to the reflow object
//!   log get                            show the global log level
//!   log set <off|error|...|trace>      change the global log level
//! ```
//!
//! Commands never touch controller state directly. `start`/`stop` go
//! through the reflow mailbox; `get` reads the config copy and the status
//! atomics held by [`ReflowHandle`].

use core::fmt::Write;

use log::{LevelFilter, info, warn};

use crate::cmd::{CommandInfo, CommandRegistry};
use crate::config::{PhaseKind, SystemConfig};
use crate::error::CommandError;
use crate::reflow::{ReflowHandle, ReflowState, StatusSnapshot};

/// Register every diagnostics client.
pub fn register_all(registry: &mut CommandRegistry, reflow: ReflowHandle) -> Result<(), CommandError> {
    register_reflow(registry, reflow)?;
    register_log(registry)
}

// ───────────────────────────────────────────────────────────────
// reflow
// ───────────────────────────────────────────────────────────────

pub fn register_reflow(registry: &mut CommandRegistry, reflow: ReflowHandle) -> Result<(), CommandError> {
    let get = reflow.clone();
    let start = reflow.clone();
    let stop = reflow;

    registry.register(
        "reflow",
        vec![
            CommandInfo::new("get", "<pid|profile|state|*> show parameters", move |args, out| {
                reflow_get(&get, args, out)
            }),
            CommandInfo::new("start", "begin the reflow profile", move |args, out| {
                no_args(args)?;
                start.start().map_err(|e| {
                    warn!("reflow start not queued: {}", e);
                    CommandError::Rejected
                })?;
                let _ = writeln!(out, "start requested");
                Ok(())
            }),
            CommandInfo::new("stop", "abort and return to reset", move |args, out| {
                no_args(args)?;
                stop.stop().map_err(|e| {
                    warn!("reflow stop not queued: {}", e);
                    CommandError::Rejected
                })?;
                let _ = writeln!(out, "stop requested");
                Ok(())
            }),
        ],
    )
}

fn no_args(args: &[&str]) -> Result<(), CommandError> {
    if args.is_empty() { Ok(()) } else { Err(CommandError::BadArguments) }
}

fn reflow_get(reflow: &ReflowHandle, args: &[&str], out: &mut dyn Write) -> Result<(), CommandError> {
    let [what] = args else {
        warn!("reflow get: expecting a single argument");
        return Err(CommandError::BadArguments);
    };
    let config = reflow.config();
    if what.eq_ignore_ascii_case("*") {
        write_pid(config, out);
        write_profile(config, out);
        write_state(&reflow.status(), out);
    } else if what.eq_ignore_ascii_case("pid") {
        write_pid(config, out);
    } else if what.eq_ignore_ascii_case("profile") {
        write_profile(config, out);
    } else if what.eq_ignore_ascii_case("state") {
        write_state(&reflow.status(), out);
    } else {
        warn!("reflow get: invalid argument {}", what);
        return Err(CommandError::BadArguments);
    }
    Ok(())
}

fn write_pid(config: &SystemConfig, out: &mut dyn Write) {
    let p = &config.pid;
    let _ = writeln!(
        out,
        "Kp: {:.2}\tKi: {:.2}\tKd: {:.2}\tTau: {:.2}",
        p.kp, p.ki, p.kd, p.tau
    );
    let _ = writeln!(
        out,
        "Sampling Period: {:.2} s\tMax Limit: {:.2}\tMin Limit: {:.2}",
        p.ts_secs, p.out_max, p.out_min
    );
}

fn write_profile(config: &SystemConfig, out: &mut dyn Write) {
    for (i, phase) in config.profile.iter().enumerate() {
        let kind = match phase.kind {
            PhaseKind::ReachTemperature => "REACHTEMP",
            PhaseKind::ReachTime => "REACHTIME",
        };
        let _ = writeln!(
            out,
            "Phase: {}\tType: {}\tReach Temp: {:.0} deg C\tReach Time: {} s",
            ReflowState::from_index(i + 1),
            kind,
            phase.target_c,
            phase.duration_ms / 1000
        );
    }
}

fn write_state(snap: &StatusSnapshot, out: &mut dyn Write) {
    let _ = write!(out, "State: {}\tSetpoint: {:.2} deg C\tTemp: ", snap.state, snap.setpoint_c);
    let _ = match snap.temperature_c {
        Some(t) => write!(out, "{t:.2} deg C"),
        None => write!(out, "--"),
    };
    let _ = writeln!(
        out,
        "\tOutput: {:.0}\tHeater: {}",
        snap.output,
        if snap.heater_enabled { "on" } else { "off" }
    );
}

// ───────────────────────────────────────────────────────────────
// log
// ───────────────────────────────────────────────────────────────

pub fn register_log(registry: &mut CommandRegistry) -> Result<(), CommandError> {
    registry.register(
        "log",
        vec![
            CommandInfo::new("get", "show the global log level", |args, out| {
                no_args(args)?;
                let _ = writeln!(out, "Current log level: {}", log::max_level());
                Ok(())
            }),
            CommandInfo::new("set", "<off|error|warn|info|debug|trace>", |args, out| {
                let [level] = args else {
                    return Err(CommandError::BadArguments);
                };
                let Ok(filter) = level.parse::<LevelFilter>() else {
                    let _ = writeln!(out, "Log level {level} not recognized");
                    return Err(CommandError::BadArguments);
                };
                log::set_max_level(filter);
                info!("log level set to {}", filter);
                let _ = writeln!(out, "Global log level set to {filter}");
                Ok(())
            }),
        ],
    )
}
