//! Shared state between the UART tasks
//!
//! Uses embassy-sync primitives behind a critical-section mutex so the
//! RX pump, the dispatch task and `main` can all reach them.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use rcserial_core::config::{EVENT_QUEUE_DEPTH, RING_SIZE};
use rcserial_core::{RemoteLink, RxQueues};

/// Software receive ring and hardware event queue
pub static RX_QUEUES: RxQueues<CriticalSectionRawMutex, RING_SIZE, EVENT_QUEUE_DEPTH> =
    RxQueues::new();

/// Lifecycle of the remote control dispatch loop
pub static REMOTE: RemoteLink<CriticalSectionRawMutex> = RemoteLink::new();
