//! Hardware events reported by the serial driver

/// Something that happened on the line
///
/// Produced by the driver side, consumed exactly once by the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartEvent {
    /// Bytes are readable from the receive ring
    ///
    /// The count never exceeds what was buffered when the event was posted.
    DataAvailable(usize),
    /// Hardware receive FIFO overflowed, bytes were lost
    HardwareOverflow,
    /// Software receive ring is full, incoming bytes were dropped
    BufferFull,
    /// Break condition detected on RX
    LineBreak,
    /// Parity check failed
    ParityError,
    /// Stop bit missing
    FrameError,
    /// Configured byte pattern detected
    PatternDetected,
    /// Driver reported an event code this layer does not know
    Unknown(u8),
}

impl UartEvent {
    /// Overflow conditions recovered by flushing the receive ring
    pub fn is_recoverable(&self) -> bool {
        matches!(self, UartEvent::HardwareOverflow | UartEvent::BufferFull)
    }

    /// Line-level receive faults, logged without recovery
    pub fn is_line_fault(&self) -> bool {
        matches!(
            self,
            UartEvent::LineBreak | UartEvent::ParityError | UartEvent::FrameError
        )
    }
}
