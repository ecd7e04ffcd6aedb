//! Active-object runtime.
//!
//! An active object is an event handler that owns a private mailbox and a
//! private thread. Other threads (and the time-event heartbeat) talk to it
//! only by posting events; the owning thread dequeues them one at a time and
//! runs the handler to completion before looking at the next.
//!
//! ```text
//!   post() ──▶ ┌─────────┐   fetch()   ┌──────────────┐
//!   post() ──▶ │ Mailbox │ ──────────▶ │ event loop   │──▶ handler(e)
//!   tick() ──▶ └─────────┘  (blocks)   │ (own thread) │
//!                                      └──────────────┘
//! ```
//!
//! Lifecycle:
//!
//! 1. [`Active::reserve`] creates the identity. Time events and the handler
//!    state can bind to it before anything runs; posts fail with
//!    [`PostError::NotStarted`] until step 3.
//! 2. [`ActiveObject::builder`] binds the handler.
//! 3. [`ActiveObject::start`] allocates the mailbox, spawns the thread,
//!    dispatches the `INIT` event once, then loops forever.
//!
//! There is no teardown: active objects live until reset.

pub mod mailbox;
pub mod thread;

use std::io;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info};

use crate::error::{ActiveError, PostError};
pub use mailbox::Mailbox;
pub use thread::{Core, ThreadConfig};

/// Events deliverable to an active object.
pub trait ActiveEvent: Copy + Send + 'static {
    /// Synthesised once by the event loop before the first fetch.
    const INIT: Self;
}

/// Type-erased enqueue side of a mailbox.
trait Inbox<E>: Sync {
    fn post(&self, event: E) -> Result<(), PostError>;
}

impl<E: Send, const N: usize> Inbox<E> for Mailbox<E, N> {
    fn post(&self, event: E) -> Result<(), PostError> {
        Mailbox::post(self, event)
    }
}

struct Identity<E: 'static> {
    name: &'static str,
    inbox: OnceLock<&'static dyn Inbox<E>>,
    /// Set once a thread is draining `inbox`; cleared if the spawn fails.
    live: AtomicBool,
}

/// Thread spawner used by [`ActiveObject::start`].
type Spawner<'a> = &'a mut dyn FnMut(&ThreadConfig, Box<dyn FnOnce() + Send>) -> io::Result<()>;

// ───────────────────────────────────────────────────────────────
// Handle
// ───────────────────────────────────────────────────────────────

/// Copyable handle used to post events to an active object.
pub struct Active<E: 'static> {
    core: &'static Identity<E>,
}

impl<E: 'static> Clone for Active<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E: 'static> Copy for Active<E> {}

impl<E: Send + 'static> core::fmt::Debug for Active<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Active")
            .field("name", &self.core.name)
            .field("started", &self.is_started())
            .finish()
    }
}

impl<E: Send + 'static> Active<E> {
    /// Create an identity with no mailbox yet.
    pub fn reserve(name: &'static str) -> Self {
        let core = Box::leak(Box::new(Identity {
            name,
            inbox: OnceLock::new(),
            live: AtomicBool::new(false),
        }));
        Self { core }
    }

    /// Bind an identity directly to a caller-owned mailbox with no thread
    /// behind it. The caller drains the mailbox itself.
    pub fn with_mailbox<const N: usize>(name: &'static str, mailbox: &'static Mailbox<E, N>) -> Self {
        let me = Self::reserve(name);
        // Freshly reserved, so the cell is empty.
        let _ = me.core.inbox.set(mailbox);
        me.core.live.store(true, Ordering::Release);
        me
    }

    fn attach<const N: usize>(&self, mailbox: &'static Mailbox<E, N>) -> Result<(), ActiveError> {
        self.core
            .inbox
            .set(mailbox)
            .map_err(|_| ActiveError::AlreadyStarted)
    }

    /// Non-blocking post. Safe from any thread and from the heartbeat.
    pub fn post(&self, event: E) -> Result<(), PostError> {
        if !self.is_started() {
            return Err(PostError::NotStarted);
        }
        self.core
            .inbox
            .get()
            .ok_or(PostError::NotStarted)?
            .post(event)
    }

    pub fn name(&self) -> &'static str {
        self.core.name
    }

    pub fn is_started(&self) -> bool {
        self.core.live.load(Ordering::Acquire)
    }
}

// ───────────────────────────────────────────────────────────────
// Construction
// ───────────────────────────────────────────────────────────────

/// Boxed run-to-completion handler.
pub type EventHandler<E> = Box<dyn FnMut(E) + Send>;

pub struct ActiveObjectBuilder<E: 'static> {
    active: Active<E>,
    handler: Option<EventHandler<E>>,
}

impl<E: ActiveEvent> ActiveObjectBuilder<E> {
    pub fn handler(mut self, handler: impl FnMut(E) + Send + 'static) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> Result<ActiveObject<E>, ActiveError> {
        let handler = self.handler.ok_or(ActiveError::MissingHandler)?;
        Ok(ActiveObject {
            active: self.active,
            handler,
        })
    }
}

/// A constructed, not yet running, active object.
pub struct ActiveObject<E: 'static> {
    active: Active<E>,
    handler: EventHandler<E>,
}

impl<E: ActiveEvent> ActiveObject<E> {
    pub fn builder(active: Active<E>) -> ActiveObjectBuilder<E> {
        ActiveObjectBuilder {
            active,
            handler: None,
        }
    }

    pub fn handle(&self) -> Active<E> {
        self.active
    }

    /// Allocate a mailbox of `N` slots, spawn the thread and enter the
    /// event loop. Allowed exactly once per identity.
    pub fn start<const N: usize>(self, config: &ThreadConfig) -> Result<Active<E>, ActiveError> {
        self.start_on::<N>(config, &mut |cfg, body| thread::spawn(cfg, body).map(drop))
    }

    /// The identity is marked live before the spawn so the handler may post
    /// to itself from `INIT`. A failed spawn clears it again: the identity
    /// stays claimed, and posts keep failing with `NotStarted`.
    fn start_on<const N: usize>(self, config: &ThreadConfig, spawn: Spawner<'_>) -> Result<Active<E>, ActiveError> {
        let Self { active, handler } = self;
        let mailbox: &'static Mailbox<E, N> = Mailbox::leak();
        active.attach(mailbox)?;
        active.core.live.store(true, Ordering::Release);

        if let Err(e) = spawn(config, Box::new(move || event_loop(active, mailbox, handler))) {
            active.core.live.store(false, Ordering::Release);
            error!("{}: thread spawn failed: {e}", active.name());
            return Err(ActiveError::SpawnFailed);
        }

        info!("{}: started (mailbox={N})", active.name());
        Ok(active)
    }
}

fn event_loop<E: ActiveEvent, const N: usize>(
    active: Active<E>,
    mailbox: &'static Mailbox<E, N>,
    mut handler: EventHandler<E>,
) {
    log::debug!("{}: dispatching INIT", active.name());
    handler(E::INIT);
    loop {
        let event = mailbox.fetch();
        handler(event);
    }
}
