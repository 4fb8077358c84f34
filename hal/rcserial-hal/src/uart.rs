//! UART driver-adapter abstractions
//!
//! Provides the traits a chip-specific HAL implements so the remote
//! control core can bring a line up and then consume its events.

use core::future::Future;

use crate::error::{ConfigError, DriverInitError, PinError};
use crate::event::UartEvent;

/// Highest baud rate accepted before any chip-specific check
pub const MAX_BAUDRATE: u32 = 5_000_000;

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Hardware flow control mode
    pub flow_control: FlowControl,
    /// Receive level at which RTS is deasserted
    ///
    /// Only meaningful with [`FlowControl::RtsCts`]; otherwise passed
    /// through untouched.
    pub rx_flow_threshold: u8,
}

impl UartConfig {
    /// Line settings of the remote control link: 19200 8N1, no flow control
    pub const REMOTE: Self = Self {
        baudrate: 19200,
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::One,
        flow_control: FlowControl::Disabled,
        rx_flow_threshold: 120,
    };

    /// Chip-independent sanity checks
    ///
    /// Drivers run their own hardware checks in [`UartDriver::configure`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baudrate == 0 || self.baudrate > MAX_BAUDRATE {
            return Err(ConfigError::InvalidBaudrate(self.baudrate));
        }
        if self.flow_control == FlowControl::RtsCts && self.rx_flow_threshold == 0 {
            return Err(ConfigError::InvalidFlowThreshold);
        }
        Ok(())
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::REMOTE
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
    Nine,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

/// Hardware flow control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowControl {
    Disabled,
    RtsCts,
}

/// GPIO numbers carrying the UART signals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinAssignment {
    pub tx: u8,
    pub rx: u8,
}

impl PinAssignment {
    pub const fn new(tx: u8, rx: u8) -> Self {
        Self { tx, rx }
    }

    /// Check range and conflicts against a chip with `pin_count` GPIOs
    pub fn validate(&self, pin_count: u8) -> Result<(), PinError> {
        if self.tx >= pin_count {
            return Err(PinError::InvalidPin(self.tx));
        }
        if self.rx >= pin_count {
            return Err(PinError::InvalidPin(self.rx));
        }
        if self.tx == self.rx {
            return Err(PinError::Conflict(self.tx));
        }
        Ok(())
    }
}

/// Ring buffer and event queue sizes requested at install time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferConfig {
    /// Receive ring size in bytes
    pub rx_ring: usize,
    /// Transmit ring size in bytes (0 = unbuffered transmit)
    pub tx_ring: usize,
    /// Depth of the event notification queue
    pub event_queue_depth: usize,
}

impl BufferConfig {
    /// Check the request against what a driver has available
    pub fn check(&self, available: &BufferConfig) -> Result<(), DriverInitError> {
        if self.rx_ring == 0 || self.event_queue_depth == 0 {
            return Err(DriverInitError::ZeroSized);
        }
        if self.rx_ring > available.rx_ring {
            return Err(DriverInitError::RxBufferTooLarge {
                requested: self.rx_ring,
                available: available.rx_ring,
            });
        }
        if self.tx_ring > available.tx_ring {
            return Err(DriverInitError::TxBufferTooLarge {
                requested: self.tx_ring,
                available: available.tx_ring,
            });
        }
        if self.event_queue_depth > available.event_queue_depth {
            return Err(DriverInitError::EventQueueTooDeep {
                requested: self.event_queue_depth,
                available: available.event_queue_depth,
            });
        }
        Ok(())
    }
}

/// Startup half of a serial driver
///
/// Calls touch live hardware state and have no logical undo. Any error
/// here is fatal to startup and is not retried by the core.
pub trait UartDriver {
    /// What a successful install hands back (port halves, buffers, ...)
    type Installed;

    /// Program line parameters
    fn configure(&mut self, config: &UartConfig) -> Result<(), ConfigError>;

    /// Bind TX/RX roles to physical pins
    fn assign_pins(&mut self, pins: PinAssignment) -> Result<(), PinError>;

    /// Allocate rings and the event queue, then enable the peripheral
    fn install(self, buffers: &BufferConfig) -> Result<Self::Installed, DriverInitError>;
}

/// Steady-state half of a serial driver
///
/// One consumer owns the port. The driver guarantees that a
/// [`UartEvent::DataAvailable`] is delivered only after the bytes it
/// announces are readable.
pub trait UartPort {
    /// Error type for transmit operations
    type Error;

    /// Wait for the next hardware event
    ///
    /// This is the only place the dispatch loop suspends when idle.
    fn next_event(&mut self) -> impl Future<Output = UartEvent>;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms`
    ///
    /// Returns the number of bytes read, possibly zero. Never waits past
    /// the timeout.
    fn read_bytes(&mut self, buf: &mut [u8], timeout_ms: u32) -> impl Future<Output = usize>;

    /// Write some of `data`, returning how much was accepted
    ///
    /// May accept fewer bytes than offered when the transmit FIFO is full.
    fn write_bytes(&mut self, data: &[u8]) -> impl Future<Output = Result<usize, Self::Error>>;

    /// Discard everything in the receive ring, returning the byte count dropped
    fn flush_rx(&mut self) -> usize;

    /// Bytes currently queued for reading
    ///
    /// Diagnostics only; the return value of [`UartPort::read_bytes`] is
    /// authoritative.
    fn buffered_len(&self) -> usize;
}
