//! RP2040 serial driver adapter
//!
//! Implements the startup half of the driver contract for UART0. The
//! board routes the remote control line to GPIO16 (TX) and GPIO17 (RX).
//! After install, received bytes flow through [`crate::channels::RX_QUEUES`]
//! (see the RX pump task) and transmission goes straight to the buffered
//! UART.

use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{PIN_16, PIN_17, UART0};
use embassy_rp::uart::{self, BufferedInterruptHandler, BufferedUartRx, BufferedUartTx, Uart};
use embassy_rp::Peri;
use static_cell::StaticCell;

use rcserial_core::config::RING_SIZE;
use rcserial_hal::{
    BufferConfig, ConfigError, DataBits, DriverInitError, FlowControl, Parity, PinAssignment,
    PinError, StopBits, UartConfig, UartDriver,
};

use crate::channels::RX_QUEUES;

bind_interrupts!(pub struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// RP2040 GPIO count
const GPIO_COUNT: u8 = 30;

/// Pins the remote control line is wired to on this board
const WIRED_PINS: PinAssignment = PinAssignment::new(16, 17);

/// Buffer inside the interrupt-driven UART; the RX pump drains it into
/// the software ring and empties it on every flush
pub const HW_RX_BUF_SIZE: usize = 256;

/// Transmit ring
const TX_RING_SIZE: usize = RING_SIZE;

static TX_BUF: StaticCell<[u8; TX_RING_SIZE]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; HW_RX_BUF_SIZE]> = StaticCell::new();

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UartId {
    Uart0,
    Uart1,
}

/// UART function a GPIO can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PinFunction {
    Tx(UartId),
    Rx(UartId),
}

/// RP2040 UART pin mux table
fn pin_function(gpio: u8) -> Option<PinFunction> {
    match gpio {
        0 | 12 | 16 | 28 => Some(PinFunction::Tx(UartId::Uart0)),
        1 | 13 | 17 | 29 => Some(PinFunction::Rx(UartId::Uart0)),
        4 | 8 | 20 | 24 => Some(PinFunction::Tx(UartId::Uart1)),
        5 | 9 | 21 | 25 => Some(PinFunction::Rx(UartId::Uart1)),
        _ => None,
    }
}

/// Check that `pins` is a usable TX/RX pair on the RP2040
fn check_pins(pins: PinAssignment) -> Result<(), PinError> {
    pins.validate(GPIO_COUNT)?;

    let tx_uart = match pin_function(pins.tx) {
        Some(PinFunction::Tx(id)) => id,
        _ => return Err(PinError::WrongFunction(pins.tx)),
    };
    let rx_uart = match pin_function(pins.rx) {
        Some(PinFunction::Rx(id)) => id,
        _ => return Err(PinError::WrongFunction(pins.rx)),
    };
    if tx_uart != rx_uart {
        return Err(PinError::MixedPeripherals);
    }
    Ok(())
}

/// Map line settings onto the embassy-rp UART config
fn to_rp_config(config: &UartConfig) -> Result<uart::Config, ConfigError> {
    config.validate()?;

    // RTS/CTS are not wired; the receive threshold is accepted but unused
    if config.flow_control == FlowControl::RtsCts {
        return Err(ConfigError::UnsupportedFlowControl);
    }

    let mut rp = uart::Config::default();
    rp.baudrate = config.baudrate;
    rp.data_bits = match config.data_bits {
        DataBits::Five => uart::DataBits::DataBits5,
        DataBits::Six => uart::DataBits::DataBits6,
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
        DataBits::Nine => return Err(ConfigError::UnsupportedDataBits),
    };
    rp.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    rp.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    Ok(rp)
}

/// Both halves of the installed UART
pub struct InstalledUart {
    pub tx: BufferedUartTx,
    pub rx: BufferedUartRx,
}

/// UART0 on GPIO16/17, not yet configured
pub struct Rp2040Uart {
    uart: Peri<'static, UART0>,
    tx: Peri<'static, PIN_16>,
    rx: Peri<'static, PIN_17>,
    config: Option<uart::Config>,
    pins: Option<PinAssignment>,
}

impl Rp2040Uart {
    pub fn new(
        uart: Peri<'static, UART0>,
        tx: Peri<'static, PIN_16>,
        rx: Peri<'static, PIN_17>,
    ) -> Self {
        Self {
            uart,
            tx,
            rx,
            config: None,
            pins: None,
        }
    }
}

impl UartDriver for Rp2040Uart {
    type Installed = InstalledUart;

    fn configure(&mut self, config: &UartConfig) -> Result<(), ConfigError> {
        if self.config.is_some() {
            return Err(ConfigError::AlreadyConfigured);
        }
        self.config = Some(to_rp_config(config)?);
        Ok(())
    }

    fn assign_pins(&mut self, pins: PinAssignment) -> Result<(), PinError> {
        check_pins(pins)?;
        if pins.tx != WIRED_PINS.tx {
            return Err(PinError::NotWired(pins.tx));
        }
        if pins.rx != WIRED_PINS.rx {
            return Err(PinError::NotWired(pins.rx));
        }
        self.pins = Some(pins);
        Ok(())
    }

    fn install(self, buffers: &BufferConfig) -> Result<InstalledUart, DriverInitError> {
        let config = self.config.ok_or(DriverInitError::NotConfigured)?;
        self.pins.ok_or(DriverInitError::PinsNotAssigned)?;

        // Rings are statically sized; the request only has to fit
        buffers.check(&BufferConfig {
            rx_ring: RX_QUEUES.rx_capacity(),
            tx_ring: TX_RING_SIZE,
            event_queue_depth: RX_QUEUES.event_capacity(),
        })?;

        let tx_buf = TX_BUF.init([0u8; TX_RING_SIZE]);
        let rx_buf = RX_BUF.init([0u8; HW_RX_BUF_SIZE]);

        let uart = Uart::new_blocking(self.uart, self.tx, self.rx, config);
        let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
        let (tx, rx) = uart.split();

        Ok(InstalledUart { tx, rx })
    }
}
