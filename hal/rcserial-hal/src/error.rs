//! Startup error types
//!
//! Every error here is fatal to startup: without a configured line no
//! command can be processed. Steady-state conditions (overflow, line
//! faults) are reported as [`crate::UartEvent`]s instead.

/// Line parameters the hardware cannot provide
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Baud rate is zero or above the supported maximum
    InvalidBaudrate(u32),
    /// Data bit count not supported by this UART
    UnsupportedDataBits,
    /// Flow control mode not supported (e.g. RTS/CTS not wired)
    UnsupportedFlowControl,
    /// RTS/CTS enabled with a zero receive threshold
    InvalidFlowThreshold,
    /// Driver already configured
    AlreadyConfigured,
}

/// Pin assignment rejected by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range for this chip
    InvalidPin(u8),
    /// TX and RX assigned to the same pin
    Conflict(u8),
    /// Pin cannot carry the requested UART function
    WrongFunction(u8),
    /// TX and RX belong to different UART peripherals
    MixedPeripherals,
    /// Pin is valid for the chip but not wired on this board
    NotWired(u8),
}

/// Resources for the driver could not be allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverInitError {
    /// Requested receive ring larger than available
    RxBufferTooLarge { requested: usize, available: usize },
    /// Requested transmit ring larger than available
    TxBufferTooLarge { requested: usize, available: usize },
    /// Requested event queue deeper than available
    EventQueueTooDeep { requested: usize, available: usize },
    /// Receive ring or event queue of size zero
    ZeroSized,
    /// `install` called before `configure`
    NotConfigured,
    /// `install` called before `assign_pins`
    PinsNotAssigned,
}

/// Any failure of the startup sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StartupError {
    Config(ConfigError),
    Pin(PinError),
    DriverInit(DriverInitError),
}

impl From<ConfigError> for StartupError {
    fn from(e: ConfigError) -> Self {
        StartupError::Config(e)
    }
}

impl From<PinError> for StartupError {
    fn from(e: PinError) -> Self {
        StartupError::Pin(e)
    }
}

impl From<DriverInitError> for StartupError {
    fn from(e: DriverInitError) -> Self {
        StartupError::DriverInit(e)
    }
}
