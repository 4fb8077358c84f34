//! Remote link lifecycle
//!
//! [`RemoteLink`] replaces global task/queue handles with one object the
//! application owns (typically in a `static`). The dispatch task runs
//! [`RemoteLink::serve`]; anything else may call [`RemoteLink::stop`] or
//! [`RemoteLink::write_raw`].
//!
//! Stopping is cooperative. The request is checked before every wait, so a
//! data event that is being drained is finished (every read byte echoed
//! and acted on) before the loop exits, and a busy line delays the stop by
//! at most that one event.

use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};

use rcserial_hal::{UartEvent, UartPort};

use crate::dispatch::{write_fully, Dispatcher, Outcome};
use crate::playback::Playback;

/// Largest piece of a raw write queued at once
pub const RAW_CHUNK_SIZE: usize = 32;

/// Raw chunks that can wait for the dispatch task
pub const RAW_QUEUE_DEPTH: usize = 4;

type RawChunk = Vec<u8, RAW_CHUNK_SIZE>;

/// Lifecycle misuse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// `begin` called while the link is running
    AlreadyRunning,
    /// Raw write attempted while the link is stopped
    NotRunning,
}

/// One step of the serve loop, reported to the observer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    /// A hardware event was handled
    Event { event: UartEvent, outcome: Outcome },
    /// A queued raw chunk was transmitted (or failed to)
    RawWrite { len: usize, ok: bool },
    /// The loop is exiting after a stop request
    Stopped,
}

/// Lifecycle object for the dispatch loop
pub struct RemoteLink<M: RawMutex> {
    running: AtomicBool,
    stop: Signal<M, ()>,
    raw: Channel<M, RawChunk, RAW_QUEUE_DEPTH>,
}

impl<M: RawMutex> RemoteLink<M> {
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            stop: Signal::new(),
            raw: Channel::new(),
        }
    }

    /// Mark the link running
    ///
    /// Must be called before [`RemoteLink::serve`]. Fails if the link is
    /// already running; it never starts a second loop.
    pub fn begin(&self) -> Result<(), LinkError> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LinkError::AlreadyRunning)?;
        self.stop.reset();
        self.raw.clear();
        Ok(())
    }

    /// Ask the serve loop to exit; no-op when not running
    pub fn stop(&self) {
        if self.is_running() {
            self.stop.signal(());
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Queue bytes for transmission outside the echo path
    ///
    /// Waits while the raw queue is full. The serve loop writes each chunk
    /// completely before handling the next event.
    pub async fn write_raw(&self, data: &[u8]) -> Result<(), LinkError> {
        if !self.is_running() {
            return Err(LinkError::NotRunning);
        }

        for chunk in data.chunks(RAW_CHUNK_SIZE) {
            if !self.is_running() {
                return Err(LinkError::NotRunning);
            }
            let Ok(buf) = RawChunk::from_slice(chunk) else {
                unreachable!("chunks() yields at most RAW_CHUNK_SIZE bytes")
            };
            self.raw.send(buf).await;
        }
        Ok(())
    }

    /// Run the dispatch loop until [`RemoteLink::stop`] is called
    ///
    /// Each turn first honors a pending stop, then a queued raw write, and
    /// only then waits on all three sources. Every handled step is passed to
    /// `observe`. On exit the raw queue is emptied and the link is left
    /// stopped; the dispatcher (and its receive buffer) stays with the
    /// caller.
    pub async fn serve<U, P, F, const N: usize>(
        &self,
        port: &mut U,
        dispatcher: &mut Dispatcher<P, N>,
        mut observe: F,
    ) where
        U: UartPort,
        P: Playback,
        F: FnMut(&Activity),
    {
        if !self.is_running() {
            return;
        }

        loop {
            if self.stop.signaled() {
                break;
            }

            let step = match self.raw.try_receive() {
                Ok(chunk) => Either3::Second(chunk),
                Err(_) => select3(port.next_event(), self.raw.receive(), self.stop.wait()).await,
            };

            match step {
                Either3::First(event) => {
                    let outcome = dispatcher.handle(port, event).await;
                    observe(&Activity::Event { event, outcome });
                }
                Either3::Second(chunk) => {
                    let ok = write_fully(port, &chunk).await.is_ok();
                    observe(&Activity::RawWrite {
                        len: chunk.len(),
                        ok,
                    });
                }
                Either3::Third(()) => break,
            }
        }

        self.raw.clear();
        self.running.store(false, Ordering::Release);
        observe(&Activity::Stopped);
    }
}

impl<M: RawMutex> Default for RemoteLink<M> {
    fn default() -> Self {
        Self::new()
    }
}
