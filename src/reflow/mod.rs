//! Reflow process state machine, run as an active object.
//!
//! Table-driven: every (state, signal) pair maps to one action function.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable[state][signal] -> fn(&mut ctl, sig) -> Status        │
//! │  ┌──────────┬──────┬───────┬──────┬───────┬─────┬──────┬────────┐│
//! │  │          │ INIT │ ENTRY │ EXIT │ START │ ... │ STOP │ SAMPLE ││
//! │  ├──────────┼──────┼───────┼──────┼───────┼─────┼──────┼────────┤│
//! │  │ Reset    │ init │ enter │  -   │ start │     │  -   │   -    ││
//! │  │ Preheat  │  -   │ enter │  -   │   -   │     │ stop │ sample ││
//! │  │ ...      │      │       │      │       │     │      │        ││
//! │  └──────────┴──────┴───────┴──────┴───────┴─────┴──────┴────────┘│
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! When an action returns [`Status::Transition`], the dispatcher runs the
//! EXIT cell of the old state, switches, then runs the ENTRY cell of the new
//! one. A two-dimensional array makes the table total by construction: a
//! missing cell is a compile error, not a runtime lookup failure.
//!
//! All controller state lives on the reflow thread. The diagnostics surface
//! sees it only through the atomics in [`ReflowStatus`].

pub mod states;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use log::{info, warn};

use crate::active::{Active, ActiveEvent, ActiveObject, Core, ThreadConfig};
use crate::app::ports::{HeaterPort, ThermocouplePort};
use crate::config::{Profile, ReflowPhase, SystemConfig};
use crate::control::pid::PidController;
use crate::error::{Error, PostError, TimerError};
use crate::time_event::{TimeEvent, TimeEventRegistry};

/// Mailbox depth of the reflow active object.
pub const REFLOW_MAILBOX_LEN: usize = 5;

// ---------------------------------------------------------------------------
// States and signals
// ---------------------------------------------------------------------------

/// Process states. Every state except `Reset` owns one profile phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReflowState {
    Reset = 0,
    Preheat = 1,
    Soak = 2,
    RampUp = 3,
    Peak = 4,
    Cooldown = 5,
}

impl ReflowState {
    pub const COUNT: usize = 6;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Reset,
        Self::Preheat,
        Self::Soak,
        Self::RampUp,
        Self::Peak,
        Self::Cooldown,
    ];

    /// Convert an index back to a state. Out of range maps to `Reset`.
    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_else(|| {
            debug_assert!(false, "invalid state index: {idx}");
            Self::Reset
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Reset => "Reset",
            Self::Preheat => "Preheat",
            Self::Soak => "Soak",
            Self::RampUp => "RampUp",
            Self::Peak => "Peak",
            Self::Cooldown => "Cooldown",
        }
    }

    /// Index into the profile, `None` for `Reset`.
    pub const fn phase_index(self) -> Option<usize> {
        match self {
            Self::Reset => None,
            s => Some(s as usize - 1),
        }
    }
}

impl core::fmt::Display for ReflowState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Signals understood by the reflow active object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReflowSignal {
    Init = 0,
    Entry = 1,
    Exit = 2,
    Start = 3,
    ReachTime = 4,
    ReachTemp = 5,
    Stop = 6,
    /// Periodic PID sample tick.
    Sample = 7,
}

impl ReflowSignal {
    pub const COUNT: usize = 8;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Init,
        Self::Entry,
        Self::Exit,
        Self::Start,
        Self::ReachTime,
        Self::ReachTemp,
        Self::Stop,
        Self::Sample,
    ];

    /// Entry and exit are synthesised by the dispatcher only.
    pub const fn is_reserved(self) -> bool {
        matches!(self, Self::Entry | Self::Exit)
    }
}

impl ActiveEvent for ReflowSignal {
    const INIT: Self = Self::Init;
}

/// Outcome of one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Leave the current state for the given one.
    Transition(ReflowState),
    /// Enter the given state without exiting anything (initial transition).
    InitialTransition(ReflowState),
    /// Consumed, no state change.
    Handled,
    /// Not meaningful in this state.
    Ignored,
}

/// One table cell.
pub type Action<H> = fn(&mut ReflowController<H>, ReflowSignal) -> Status;

/// Full state × signal table.
pub type StateTable<H> = [[Action<H>; ReflowSignal::COUNT]; ReflowState::COUNT];

// ---------------------------------------------------------------------------
// Shared status
// ---------------------------------------------------------------------------

/// Lock-free view of the controller for other threads.
#[derive(Debug)]
pub struct ReflowStatus {
    state: AtomicU8,
    setpoint: AtomicU32,
    temperature: AtomicU32,
    output: AtomicU32,
    heater_enabled: AtomicBool,
}

/// Point-in-time copy of [`ReflowStatus`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub state: ReflowState,
    pub setpoint_c: f32,
    /// Last good oven reading, `None` before the first one.
    pub temperature_c: Option<f32>,
    pub output: f32,
    pub heater_enabled: bool,
}

impl ReflowStatus {
    fn new() -> Self {
        Self {
            state: AtomicU8::new(ReflowState::Reset as u8),
            setpoint: AtomicU32::new(0f32.to_bits()),
            temperature: AtomicU32::new(f32::NAN.to_bits()),
            output: AtomicU32::new(0f32.to_bits()),
            heater_enabled: AtomicBool::new(false),
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let temperature = f32::from_bits(self.temperature.load(Ordering::Acquire));
        StatusSnapshot {
            state: ReflowState::from_index(self.state.load(Ordering::Acquire) as usize),
            setpoint_c: f32::from_bits(self.setpoint.load(Ordering::Acquire)),
            temperature_c: (!temperature.is_nan()).then_some(temperature),
            output: f32::from_bits(self.output.load(Ordering::Acquire)),
            heater_enabled: self.heater_enabled.load(Ordering::Acquire),
        }
    }

    pub fn state(&self) -> ReflowState {
        ReflowState::from_index(self.state.load(Ordering::Acquire) as usize)
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// The reflow process: state table, PID loop, heater and thermocouple.
pub struct ReflowController<H> {
    me: Active<ReflowSignal>,
    hw: H,
    table: StateTable<H>,
    state: ReflowState,

    config: SystemConfig,
    pid: PidController,
    setpoint: f32,
    ramp_step: f32,
    last_temp: Option<f32>,

    /// One-shot: end of a ReachTime phase.
    phase_timer: TimeEvent<'static>,
    /// Periodic: PID sample tick.
    sample_timer: TimeEvent<'static>,

    status: Arc<ReflowStatus>,
}

impl<H: ThermocouplePort + HeaterPort> ReflowController<H> {
    /// Build the controller and register its two time events. Starts in
    /// `Reset`; nothing runs until `Init` is dispatched.
    pub fn new(
        config: &SystemConfig,
        hw: H,
        me: Active<ReflowSignal>,
        registry: &'static TimeEventRegistry,
    ) -> Result<Self, TimerError> {
        let phase_timer = TimeEvent::new(registry, me, ReflowSignal::ReachTime)?;
        let sample_timer = TimeEvent::new(registry, me, ReflowSignal::Sample)?;
        Ok(Self {
            me,
            hw,
            table: states::build_state_table(),
            state: ReflowState::Reset,
            config: config.clone(),
            pid: PidController::new(&config.pid),
            setpoint: 0.0,
            ramp_step: 0.0,
            last_temp: None,
            phase_timer,
            sample_timer,
            status: Arc::new(ReflowStatus::new()),
        })
    }

    /// Run one event to completion. Entry and exit are refused here; only
    /// the dispatcher itself may synthesise them.
    pub fn dispatch(&mut self, signal: ReflowSignal) -> Status {
        if signal.is_reserved() {
            warn!("REFLOW: refusing externally posted {:?}", signal);
            return Status::Ignored;
        }
        let status = self.run(signal);
        self.publish();
        status
    }

    fn run(&mut self, signal: ReflowSignal) -> Status {
        let prev = self.state;
        let action = self.table[prev as usize][signal as usize];
        let status = action(self, signal);

        match status {
            Status::Transition(next) => {
                info!("REFLOW: {} -> {} on {:?}", prev, next, signal);
                let exit = self.table[prev as usize][ReflowSignal::Exit as usize];
                exit(self, ReflowSignal::Exit);
                self.state = next;
                let entry = self.table[next as usize][ReflowSignal::Entry as usize];
                entry(self, ReflowSignal::Entry);
            }
            Status::InitialTransition(first) => {
                info!("REFLOW: initial state {}", first);
                self.state = first;
                let entry = self.table[first as usize][ReflowSignal::Entry as usize];
                entry(self, ReflowSignal::Entry);
            }
            Status::Handled | Status::Ignored => {}
        }
        status
    }

    fn publish(&self) {
        let s = &self.status;
        s.state.store(self.state as u8, Ordering::Release);
        s.setpoint.store(self.setpoint.to_bits(), Ordering::Release);
        s.temperature
            .store(self.last_temp.unwrap_or(f32::NAN).to_bits(), Ordering::Release);
        s.output.store(self.hw.command().to_bits(), Ordering::Release);
        s.heater_enabled.store(self.hw.is_enabled(), Ordering::Release);
    }

    /// Post to our own mailbox; a full mailbox drops the event.
    fn post_self(&self, signal: ReflowSignal) {
        if let Err(e) = self.me.post(signal) {
            warn!("REFLOW: dropped {:?}: {}", signal, e);
        }
    }

    fn phase(&self, state: ReflowState) -> Option<ReflowPhase> {
        state.phase_index().map(|i| self.config.profile[i])
    }

    pub fn state(&self) -> ReflowState {
        self.state
    }

    pub fn setpoint(&self) -> f32 {
        self.setpoint
    }

    pub fn ramp_step(&self) -> f32 {
        self.ramp_step
    }

    pub fn last_temperature(&self) -> Option<f32> {
        self.last_temp
    }

    pub fn profile(&self) -> &Profile {
        &self.config.profile
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn phase_timer(&self) -> &TimeEvent<'static> {
        &self.phase_timer
    }

    pub fn sample_timer(&self) -> &TimeEvent<'static> {
        &self.sample_timer
    }

    pub fn status(&self) -> Arc<ReflowStatus> {
        Arc::clone(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Startup
// ---------------------------------------------------------------------------

/// What the rest of the firmware keeps after the reflow object is running.
#[derive(Debug, Clone)]
pub struct ReflowHandle {
    active: Active<ReflowSignal>,
    status: Arc<ReflowStatus>,
    config: SystemConfig,
}

impl ReflowHandle {
    pub fn start(&self) -> Result<(), PostError> {
        self.active.post(ReflowSignal::Start)
    }

    pub fn stop(&self) -> Result<(), PostError> {
        self.active.post(ReflowSignal::Stop)
    }

    pub fn active(&self) -> Active<ReflowSignal> {
        self.active
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}

/// Construct the reflow controller, bind it to an active object and start
/// its thread. Errors here are fatal configuration errors.
pub fn start<H>(config: &SystemConfig, hw: H, registry: &'static TimeEventRegistry) -> Result<ReflowHandle, Error>
where
    H: ThermocouplePort + HeaterPort + Send + 'static,
{
    let me = Active::reserve("reflow");
    let mut controller = ReflowController::new(config, hw, me, registry)?;
    let status = controller.status();

    let ao = ActiveObject::builder(me)
        .handler(move |signal| {
            controller.dispatch(signal);
        })
        .build()?;

    let thread = ThreadConfig::new("reflow\0", config.runtime.reflow_stack_kb)
        .priority(config.runtime.reflow_priority)
        .core(Core::App);
    let active = ao.start::<REFLOW_MAILBOX_LEN>(&thread)?;

    Ok(ReflowHandle {
        active,
        status,
        config: config.clone(),
    })
}
