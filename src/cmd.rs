//! Console command registry.
//!
//! Subsystems register a *client* (first token on the line) with a set of
//! commands (second token). The remaining tokens are passed to the
//! callback as arguments:
//!
//! ```text
//!   reflow get pid
//!   └─┬──┘ └┬┘ └┬┘
//!   client cmd  args
//! ```
//!
//! `help` on its own lists every registered command. Output goes to any
//! `core::fmt::Write` sink so the same registry serves stdin on the host
//! and a UART console on the device.

use core::fmt::Write;

use log::{debug, warn};

use crate::error::CommandError;

/// Maximum number of registered clients.
pub const MAX_CLIENTS: usize = 10;

/// Maximum number of whitespace-separated tokens on one line.
pub const MAX_TOKENS: usize = 10;

/// Command callback: arguments after the command token, output sink.
pub type CommandFn =
    Box<dyn Fn(&[&str], &mut dyn Write) -> Result<(), CommandError> + Send + Sync>;

pub struct CommandInfo {
    pub name: &'static str,
    pub help: &'static str,
    callback: CommandFn,
}

impl CommandInfo {
    pub fn new<F>(name: &'static str, help: &'static str, callback: F) -> Self
    where
        F: Fn(&[&str], &mut dyn Write) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        Self {
            name,
            help,
            callback: Box::new(callback),
        }
    }
}

impl core::fmt::Debug for CommandInfo {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandInfo")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct Client {
    name: &'static str,
    commands: Vec<CommandInfo>,
}

impl Client {
    fn find(&self, name: &str) -> Option<&CommandInfo> {
        self.commands.iter().find(|c| c.name == name)
    }

    fn write_help(&self, out: &mut dyn Write) {
        for c in &self.commands {
            let _ = writeln!(out, "  {} {:<8} {}", self.name, c.name, c.help);
        }
    }
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    clients: heapless::Vec<Client, MAX_CLIENTS>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client. Fails when the table is full, the name is taken
    /// or reserved, or the client has no commands.
    pub fn register(
        &mut self,
        name: &'static str,
        commands: Vec<CommandInfo>,
    ) -> Result<(), CommandError> {
        if name == "help" || name.is_empty() || commands.is_empty() {
            return Err(CommandError::RegistrationFailed);
        }
        if self.clients.iter().any(|c| c.name == name) {
            warn!("CMD: client '{}' already registered", name);
            return Err(CommandError::RegistrationFailed);
        }
        self.clients
            .push(Client { name, commands })
            .map_err(|_| {
                warn!("CMD: client table full, '{}' rejected", name);
                CommandError::RegistrationFailed
            })?;
        debug!("CMD: registered client '{}'", name);
        Ok(())
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Parse and run one console line. Failures are reported on `out` as
    /// well as returned.
    pub fn execute(&self, line: &str, out: &mut dyn Write) -> Result<(), CommandError> {
        let result = self.dispatch(line, out);
        if let Err(e) = result {
            let _ = writeln!(out, "Error {}: {}", e.code(), e);
        }
        result
    }

    fn dispatch(&self, line: &str, out: &mut dyn Write) -> Result<(), CommandError> {
        let mut tokens: heapless::Vec<&str, MAX_TOKENS> = heapless::Vec::new();
        for token in line.split_whitespace() {
            tokens.push(token).map_err(|_| CommandError::TooManyTokens)?;
        }

        let Some((&first, rest)) = tokens.split_first() else {
            return Err(CommandError::Empty);
        };

        if first == "help" {
            self.write_help(out);
            return Ok(());
        }

        let client = self
            .clients
            .iter()
            .find(|c| c.name == first)
            .ok_or(CommandError::UnknownClient)?;

        let Some((&name, args)) = rest.split_first() else {
            client.write_help(out);
            return Ok(());
        };

        let command = client.find(name).ok_or(CommandError::UnknownCommand)?;
        (command.callback)(args, out)
    }

    fn write_help(&self, out: &mut dyn Write) {
        let _ = writeln!(out, "Commands:");
        for client in &self.clients {
            client.write_help(out);
        }
    }
}
