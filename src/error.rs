//! Unified error types for the reflow firmware.
//!
//! Every subsystem owns a small `Copy` error enum; all of them convert into
//! the top-level [`Error`] so boot code can propagate with `?` and halt on
//! the first fatal configuration problem.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Active object construction or startup failed.
    Active(ActiveError),
    /// An event could not be delivered.
    Post(PostError),
    /// Time event registration or heartbeat setup failed.
    Timer(TimerError),
    /// The thermocouple reported a fault.
    Sensor(ThermoFault),
    /// A diagnostics command was rejected.
    Command(CommandError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active(e) => write!(f, "active object: {e}"),
            Self::Post(e) => write!(f, "post: {e}"),
            Self::Timer(e) => write!(f, "timer: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Active object runtime
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveError {
    /// `build()` was called without an event handler.
    MissingHandler,
    /// The object already owns a mailbox; start is allowed exactly once.
    AlreadyStarted,
    /// The scheduler refused to create the thread.
    SpawnFailed,
}

impl fmt::Display for ActiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHandler => write!(f, "no event handler bound"),
            Self::AlreadyStarted => write!(f, "already started"),
            Self::SpawnFailed => write!(f, "thread creation failed"),
        }
    }
}

impl From<ActiveError> for Error {
    fn from(e: ActiveError) -> Self {
        Self::Active(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostError {
    /// The target mailbox has no free slot.
    MailboxFull,
    /// The target has not been started yet.
    NotStarted,
}

impl fmt::Display for PostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MailboxFull => write!(f, "mailbox full"),
            Self::NotStarted => write!(f, "target not started"),
        }
    }
}

impl From<PostError> for Error {
    fn from(e: PostError) -> Self {
        Self::Post(e)
    }
}

// ---------------------------------------------------------------------------
// Time events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    /// All time-event slots are taken.
    RegistryFull,
    /// The heartbeat timer could not be created or started.
    HeartbeatFailed(i32),
}

impl fmt::Display for TimerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegistryFull => write!(f, "time event registry full"),
            Self::HeartbeatFailed(rc) => write!(f, "heartbeat start failed (rc={rc})"),
        }
    }
}

impl From<TimerError> for Error {
    fn from(e: TimerError) -> Self {
        Self::Timer(e)
    }
}

// ---------------------------------------------------------------------------
// Thermocouple faults
// ---------------------------------------------------------------------------

/// Faults reported by the MAX31855K converter, plus SPI transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThermoFault {
    /// Thermocouple shorted to VCC.
    ShortToVcc,
    /// Thermocouple shorted to GND.
    ShortToGnd,
    /// No thermocouple connected.
    OpenCircuit,
    /// The converter returned an all-zero frame (unpowered or unwired).
    AllZeros,
    /// The SPI transaction itself failed.
    Bus,
}

impl fmt::Display for ThermoFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortToVcc => write!(f, "thermocouple shorted to VCC"),
            Self::ShortToGnd => write!(f, "thermocouple shorted to GND"),
            Self::OpenCircuit => write!(f, "thermocouple open circuit"),
            Self::AllZeros => write!(f, "converter returned all zeros"),
            Self::Bus => write!(f, "SPI transfer failed"),
        }
    }
}

impl From<ThermoFault> for Error {
    fn from(e: ThermoFault) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Diagnostics commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Blank input line.
    Empty,
    /// More tokens than the tokenizer accepts.
    TooManyTokens,
    /// No client registered under that name.
    UnknownClient,
    /// The client has no command with that name.
    UnknownCommand,
    /// Wrong number or value of arguments.
    BadArguments,
    /// The command was valid but could not be carried out.
    Rejected,
    /// Client table is full or the name is taken.
    RegistrationFailed,
}

impl CommandError {
    /// Nonzero status code reported back to the console.
    pub const fn code(self) -> i32 {
        match self {
            Self::Empty => 1,
            Self::TooManyTokens => 2,
            Self::UnknownClient => 3,
            Self::UnknownCommand => 4,
            Self::BadArguments => 5,
            Self::Rejected => 6,
            Self::RegistrationFailed => 7,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty command"),
            Self::TooManyTokens => write!(f, "too many tokens"),
            Self::UnknownClient => write!(f, "unknown client"),
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::BadArguments => write!(f, "bad arguments"),
            Self::Rejected => write!(f, "command rejected"),
            Self::RegistrationFailed => write!(f, "command registration failed"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The stored or supplied document could not be parsed.
    Parse,
    /// A value is out of its allowed range.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "parse failed"),
            Self::Invalid(what) => write!(f, "invalid {what}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
