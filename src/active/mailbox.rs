//! Bounded FIFO mailbox backing one active object.
//!
//! A thin wrapper over an `embassy-sync` channel guarded by a
//! critical-section raw mutex, so producers may live on any thread or in
//! the heartbeat callback. Posting never blocks; only the owning thread
//! suspends, in [`Mailbox::fetch`].

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};

use crate::error::PostError;

pub struct Mailbox<E, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, E, N>,
}

impl<E, const N: usize> Mailbox<E, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Allocate a mailbox that lives for the rest of the program.
    pub fn leak() -> &'static Self
    where
        E: 'static,
    {
        Box::leak(Box::new(Self::new()))
    }

    /// Zero-wait enqueue.
    pub fn post(&self, event: E) -> Result<(), PostError> {
        self.channel
            .try_send(event)
            .map_err(|TrySendError::Full(_)| PostError::MailboxFull)
    }

    /// Block the calling thread until an event is available.
    pub fn fetch(&self) -> E {
        futures_lite::future::block_on(self.channel.receive())
    }

    pub fn try_fetch(&self) -> Option<E> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }
}

impl<E, const N: usize> Default for Mailbox<E, N> {
    fn default() -> Self {
        Self::new()
    }
}
