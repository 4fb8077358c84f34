//! Remote link configuration
//!
//! The firmware compiles [`RemoteConfig::DEFAULT`] in. The threshold in
//! the UART settings is inert because flow control is disabled, and is
//! kept at 120 for compatibility with existing remotes.

use rcserial_hal::{BufferConfig, ConfigError, PinAssignment, UartConfig};

/// Size of the dispatcher's receive buffer (one read chunk)
pub const READ_CHUNK_SIZE: usize = 1024;

/// Receive and transmit ring size requested from the driver
pub const RING_SIZE: usize = 2 * READ_CHUNK_SIZE;

/// Event queue depth requested from the driver
pub const EVENT_QUEUE_DEPTH: usize = 10;

/// Everything needed to bring the link up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RemoteConfig {
    /// Line parameters
    pub uart: UartConfig,
    /// TX/RX GPIO numbers
    pub pins: PinAssignment,
    /// Rings and event queue
    pub buffers: BufferConfig,
    /// Upper bound for a single read on a data event
    pub read_timeout_ms: u32,
}

impl RemoteConfig {
    pub const DEFAULT: Self = Self {
        uart: UartConfig::REMOTE,
        pins: PinAssignment::new(16, 17),
        buffers: BufferConfig {
            rx_ring: RING_SIZE,
            tx_ring: RING_SIZE,
            event_queue_depth: EVENT_QUEUE_DEPTH,
        },
        read_timeout_ms: 100,
    };

    /// Chip-independent checks on the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.uart.validate()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
