//! Property tests for the core data structures.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use proptest::prelude::*;

use reflow::active::{Active, ActiveEvent, Mailbox};
use reflow::cmd::{CommandInfo, CommandRegistry, MAX_TOKENS};
use reflow::config::SystemConfig;
use reflow::error::{PostError, ThermoFault};
use reflow::sensors::thermocouple::{decode, encode};
use reflow::time_event::{TimeEvent, TimeEventRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ev {
    Init,
    Fire,
    Value(u16),
}

impl ActiveEvent for Ev {
    const INIT: Self = Ev::Init;
}

// ── Time events ───────────────────────────────────────────────

proptest! {
    /// A periodic event armed (t, r) fires exactly 1 + (n - t) / r times in
    /// n ticks (0 if n < t).
    #[test]
    fn periodic_firing_count(timeout in 1u32..200, reload in 1u32..200, n in 0u32..2_000) {
        let registry: &'static TimeEventRegistry = Box::leak(Box::new(TimeEventRegistry::new()));
        let mb: &'static Mailbox<Ev, 64> = Mailbox::leak();
        let te = TimeEvent::new(registry, Active::with_mailbox("prop", mb), Ev::Fire).unwrap();
        te.arm(timeout, reload);

        let mut fired = 0u32;
        for _ in 0..n {
            fired += registry.tick() as u32;
            while mb.try_fetch().is_some() {}
        }
        let expected = if n < timeout { 0 } else { 1 + (n - timeout) / reload };
        prop_assert_eq!(fired, expected);
    }

    /// A one-shot never fires more than once, however long the heartbeat runs.
    #[test]
    fn one_shot_fires_at_most_once(timeout in 1u32..500, extra in 0u32..500) {
        let registry: &'static TimeEventRegistry = Box::leak(Box::new(TimeEventRegistry::new()));
        let mb: &'static Mailbox<Ev, 4> = Mailbox::leak();
        let te = TimeEvent::new(registry, Active::with_mailbox("prop", mb), Ev::Fire).unwrap();
        te.arm(timeout, 0);

        let fired: usize = (0..timeout + extra).map(|_| registry.tick()).sum();
        prop_assert_eq!(fired, 1);
        prop_assert!(!te.is_armed());
    }
}

// ── Mailbox ───────────────────────────────────────────────────

proptest! {
    /// Posts beyond capacity fail; the accepted ones come out in order.
    #[test]
    fn mailbox_keeps_fifo_under_overflow(values in proptest::collection::vec(any::<u16>(), 0..20)) {
        let mb: Mailbox<Ev, 5> = Mailbox::new();
        let mut accepted = Vec::new();
        for v in &values {
            match mb.post(Ev::Value(*v)) {
                Ok(()) => accepted.push(Ev::Value(*v)),
                Err(e) => prop_assert_eq!(e, PostError::MailboxFull),
            }
        }
        prop_assert_eq!(accepted.len(), values.len().min(5));
        let drained: Vec<Ev> = std::iter::from_fn(|| mb.try_fetch()).collect();
        prop_assert_eq!(drained, accepted);
    }
}

// ── Thermocouple decoding ─────────────────────────────────────

proptest! {
    /// Any frame either decodes to an in-range temperature or reports a
    /// fault; any frame with a fault cause bit is never accepted.
    #[test]
    fn decode_is_total_and_bounded(frame in any::<u32>()) {
        match decode(frame) {
            Ok(r) => {
                prop_assert!((-2048.0..2048.0).contains(&r.hot_junction_c));
                prop_assert!((-128.0..128.0).contains(&r.cold_junction_c));
                prop_assert_eq!(frame & 0x0001_0007, 0);
            }
            Err(fault) => prop_assert_ne!(fault, ThermoFault::Bus),
        }
    }

    /// Quarter-degree hot-junction values survive encoding exactly.
    #[test]
    fn encode_decode_quarter_degrees(q in -1_000i32..6_400, cj16 in -800i32..2_000) {
        let hj = q as f32 * 0.25;
        let cj = cj16 as f32 * 0.0625;
        prop_assume!(q != 0 || cj16 != 0);
        let r = decode(encode(hj, cj)).unwrap();
        prop_assert_eq!(r.hot_junction_c, hj);
        prop_assert_eq!(r.cold_junction_c, cj);
    }
}

// ── Command line ──────────────────────────────────────────────

proptest! {
    /// The registry never panics on arbitrary input and only reaches the
    /// callback for lines within the token limit.
    #[test]
    fn execute_never_panics(line in ".{0,120}") {
        let mut registry = CommandRegistry::new();
        registry
            .register("t", vec![CommandInfo::new("x", "", |args, _| {
                assert!(args.len() <= MAX_TOKENS - 2);
                Ok(())
            })])
            .unwrap();
        let mut out = String::new();
        let _ = registry.execute(&line, &mut out);
    }
}

// ── Configuration ─────────────────────────────────────────────

proptest! {
    /// Any config that validates round-trips through JSON unchanged.
    #[test]
    fn valid_config_json_roundtrip(kp in 0.0f32..100.0, ki in 0.0f32..10.0, soak_ms in 500u32..600_000) {
        let mut c = SystemConfig::default();
        c.pid.kp = kp;
        c.pid.ki = ki;
        c.profile[1].duration_ms = soak_ms;
        prop_assert!(c.validate().is_ok());
        let json = serde_json::to_string(&c).unwrap();
        prop_assert_eq!(SystemConfig::from_json(&json).unwrap(), c);
    }
}
