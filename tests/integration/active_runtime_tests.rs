//! Active-object runtime and time events, exercised through the public API
//! with real threads.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use reflow::active::{Active, ActiveEvent, ActiveObject, ThreadConfig};
use reflow::error::{ActiveError, PostError};
use reflow::time_event::{TimeEvent, TimeEventRegistry};

use crate::mock_hw::eventually;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sig {
    Init,
    Ping(u32),
    Pong(u32),
    Tick,
}

impl ActiveEvent for Sig {
    const INIT: Self = Sig::Init;
}

fn leak_registry() -> &'static TimeEventRegistry {
    Box::leak(Box::new(TimeEventRegistry::new()))
}

#[test]
fn two_objects_ping_pong() {
    let ping = Active::<Sig>::reserve("ping");
    let pong = Active::<Sig>::reserve("pong");
    let rounds = Arc::new(AtomicU32::new(0));

    // pong first, so ping's INIT can post to it.
    ActiveObject::builder(pong)
        .handler(move |sig| {
            if let Sig::Ping(n) = sig {
                let _ = ping.post(Sig::Pong(n));
            }
        })
        .build()
        .unwrap()
        .start::<4>(&ThreadConfig::new("pong\0", 4))
        .unwrap();

    let seen = Arc::clone(&rounds);
    ActiveObject::builder(ping)
        .handler(move |sig| match sig {
            Sig::Init => {
                let _ = pong.post(Sig::Ping(1));
            }
            Sig::Pong(n) => {
                seen.store(n, Ordering::SeqCst);
                if n < 10 {
                    let _ = pong.post(Sig::Ping(n + 1));
                }
            }
            _ => {}
        })
        .build()
        .unwrap()
        .start::<4>(&ThreadConfig::new("ping\0", 4))
        .unwrap();

    assert!(eventually(|| rounds.load(Ordering::SeqCst) == 10));
}

#[test]
fn init_precedes_posted_events() {
    let me = Active::<Sig>::reserve("order");
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let ao = ActiveObject::builder(me)
        .handler(move |sig| sink.lock().unwrap().push(sig))
        .build()
        .unwrap();
    let me = ao.start::<8>(&ThreadConfig::new("order\0", 4)).unwrap();
    me.post(Sig::Ping(1)).unwrap();
    me.post(Sig::Ping(2)).unwrap();

    assert!(eventually(|| log.lock().unwrap().len() == 3));
    assert_eq!(*log.lock().unwrap(), vec![Sig::Init, Sig::Ping(1), Sig::Ping(2)]);
}

#[test]
fn builder_requires_handler() {
    let me = Active::<Sig>::reserve("bare");
    assert!(matches!(ActiveObject::builder(me).build(), Err(ActiveError::MissingHandler)));
    assert_eq!(me.post(Sig::Tick), Err(PostError::NotStarted));
}

#[test]
fn periodic_time_event_drives_an_object() {
    let registry = leak_registry();
    let me = Active::<Sig>::reserve("ticker");
    let ticks = Arc::new(AtomicU32::new(0));
    let count = Arc::clone(&ticks);
    let me = ActiveObject::builder(me)
        .handler(move |sig| {
            if sig == Sig::Tick {
                count.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build()
        .unwrap()
        .start::<4>(&ThreadConfig::new("ticker\0", 4))
        .unwrap();

    let te = TimeEvent::new(registry, me, Sig::Tick).unwrap();
    te.arm(1000, 1000);
    let mut posted = 0;
    for _ in 0..3500 {
        posted += registry.tick();
    }
    assert_eq!(posted, 3);
    assert_eq!(te.countdown(), 500);
    assert!(eventually(|| ticks.load(Ordering::SeqCst) == 3));
}

#[test]
fn one_shot_fires_once_then_stays_quiet() {
    let registry = leak_registry();
    let me = Active::<Sig>::reserve("oneshot");
    let ticks = Arc::new(AtomicU32::new(0));
    let count = Arc::clone(&ticks);
    let me = ActiveObject::builder(me)
        .handler(move |sig| {
            if sig == Sig::Tick {
                count.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build()
        .unwrap()
        .start::<4>(&ThreadConfig::new("oneshot\0", 4))
        .unwrap();

    let te = TimeEvent::new(registry, me, Sig::Tick).unwrap();
    te.arm(5000, 0);
    let posted: usize = (0..5000).map(|_| registry.tick()).sum();
    assert_eq!(posted, 1);
    assert!(!te.is_armed());
    assert_eq!(registry.tick(), 0);
    assert!(eventually(|| ticks.load(Ordering::SeqCst) == 1));
}
