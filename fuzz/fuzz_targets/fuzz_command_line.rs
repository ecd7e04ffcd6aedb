//! Fuzz target: `CommandRegistry::execute`
//!
//! Feeds arbitrary console lines through a registry shaped like the
//! firmware's. The tokenizer must never panic, and a callback must never
//! see more arguments than the token limit allows. Every failure carries
//! a nonzero status code.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use libfuzzer_sys::fuzz_target;
use reflow::cmd::{CommandInfo, CommandRegistry, MAX_TOKENS};
use reflow::error::CommandError;

fn check(args: &[&str], _: &mut dyn core::fmt::Write) -> Result<(), CommandError> {
    assert!(args.len() <= MAX_TOKENS - 2);
    Ok(())
}

fn registry() -> CommandRegistry {
    let mut r = CommandRegistry::new();
    r.register(
        "reflow",
        vec![
            CommandInfo::new("get", "", check),
            CommandInfo::new("start", "", check),
            CommandInfo::new("stop", "", check),
        ],
    )
    .unwrap();
    r.register("log", vec![CommandInfo::new("set", "", check)]).unwrap();
    r
}

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    let mut out = String::new();
    if let Err(e) = registry().execute(line, &mut out) {
        assert_ne!(e.code(), 0);
        assert!(out.starts_with("Error"));
    }
});
