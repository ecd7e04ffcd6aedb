//! Time events: many countdown timers multiplexed onto one heartbeat.
//!
//! Each registered [`TimeEvent`] owns a slot in a fixed-capacity registry.
//! Every heartbeat, [`TimeEventRegistry::tick`] decrements the armed slots;
//! a slot that reaches zero posts its signal to its owner and reloads
//! (reload 0 means one-shot, so the slot stays disarmed).
//!
//! ```text
//!  heartbeat ──▶ tick() ──┬─ slot 0: 500/500  ──▶ post(Sample)
//!     (1 ms)              ├─ slot 1: 0 (idle)
//!                         └─ slot 2: 5000/0   ──▶ post(ReachTime) once
//! ```
//!
//! Slot fields are only touched inside `critical_section::with`, so the
//! owner's arm/disarm never races the heartbeat. Disarming stops future
//! firings only; an event already in the owner's mailbox is still delivered.

use core::cell::RefCell;

use critical_section::Mutex;
use log::warn;

use crate::active::{Active, ActiveEvent};
use crate::error::{PostError, TimerError};

/// Registry capacity.
pub const MAX_TIME_EVENTS: usize = 8;

/// The registry driven by the board heartbeat.
pub static TIME_EVENTS: TimeEventRegistry = TimeEventRegistry::new();

type FireFn = Box<dyn Fn() -> Result<(), PostError> + Send>;

struct Slot {
    /// Ticks until firing; 0 = disarmed.
    countdown: u32,
    /// Value loaded after firing; 0 = one-shot.
    reload: u32,
    fire: FireFn,
}

pub struct TimeEventRegistry {
    slots: Mutex<RefCell<heapless::Vec<Slot, MAX_TIME_EVENTS>>>,
}

impl TimeEventRegistry {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(heapless::Vec::new())),
        }
    }

    fn register(&self, fire: FireFn) -> Result<usize, TimerError> {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let index = slots.len();
            slots
                .push(Slot {
                    countdown: 0,
                    reload: 0,
                    fire,
                })
                .map_err(|_| TimerError::RegistryFull)?;
            Ok(index)
        })
    }

    fn with_slot<R>(&self, index: usize, f: impl FnOnce(&mut Slot) -> R) -> R {
        critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            // Indices come from register() and slots are never removed.
            f(&mut slots[index])
        })
    }

    /// Advance every armed time event by one heartbeat. Returns the number
    /// of events successfully posted.
    pub fn tick(&self) -> usize {
        let (posted, dropped) = critical_section::with(|cs| {
            let mut slots = self.slots.borrow_ref_mut(cs);
            let mut posted = 0;
            let mut dropped = 0;
            for slot in slots.iter_mut().filter(|s| s.countdown > 0) {
                slot.countdown -= 1;
                if slot.countdown == 0 {
                    match (slot.fire)() {
                        Ok(()) => posted += 1,
                        Err(_) => dropped += 1,
                    }
                    slot.countdown = slot.reload;
                }
            }
            (posted, dropped)
        });

        if dropped > 0 {
            warn!("time events: {dropped} firing(s) dropped, target mailbox full");
        }
        posted
    }

    /// Number of registered time events.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.slots.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of time events currently counting down.
    pub fn armed(&self) -> usize {
        critical_section::with(|cs| {
            self.slots
                .borrow_ref(cs)
                .iter()
                .filter(|s| s.countdown > 0)
                .count()
        })
    }
}

impl Default for TimeEventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one registered countdown timer.
#[derive(Clone, Copy)]
pub struct TimeEvent<'r> {
    registry: &'r TimeEventRegistry,
    index: usize,
}

impl core::fmt::Debug for TimeEvent<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimeEvent")
            .field("index", &self.index)
            .field("countdown", &self.countdown())
            .finish()
    }
}

impl<'r> TimeEvent<'r> {
    /// Register a timer that posts `signal` to `target` when it fires.
    /// Starts disarmed.
    pub fn new<E: ActiveEvent>(
        registry: &'r TimeEventRegistry,
        target: Active<E>,
        signal: E,
    ) -> Result<Self, TimerError> {
        let index = registry.register(Box::new(move || target.post(signal)))?;
        Ok(Self { registry, index })
    }

    /// Fire after `timeout` ticks, then every `reload` ticks (0 = once).
    /// A zero timeout disarms.
    pub fn arm(&self, timeout: u32, reload: u32) {
        self.registry.with_slot(self.index, |slot| {
            slot.countdown = timeout;
            slot.reload = reload;
        });
    }

    pub fn disarm(&self) {
        self.registry.with_slot(self.index, |slot| {
            slot.countdown = 0;
            slot.reload = 0;
        });
    }

    pub fn is_armed(&self) -> bool {
        self.countdown() > 0
    }

    pub fn countdown(&self) -> u32 {
        self.registry.with_slot(self.index, |slot| slot.countdown)
    }

    pub fn reload(&self) -> u32 {
        self.registry.with_slot(self.index, |slot| slot.reload)
    }
}
