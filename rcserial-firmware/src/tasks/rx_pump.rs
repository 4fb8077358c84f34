//! UART receive pump task
//!
//! Drains the buffered UART into the software receive ring and turns
//! receive errors into hardware events for the dispatch task. When the
//! dispatch task flushes the ring, the pump also throws away whatever the
//! buffered UART still holds.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::{self, BufferedUartRx};
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Read;

use rcserial_hal::UartEvent;

use crate::channels::RX_QUEUES;
use crate::uart::HW_RX_BUF_SIZE;

/// Bytes moved per read
const PUMP_CHUNK_SIZE: usize = 64;

/// Event code reported for receive errors this driver does not classify
const UNCLASSIFIED_ERROR: u8 = 0xFF;

/// RX pump task - feeds the receive ring and event queue
#[embassy_executor::task]
pub async fn rx_pump_task(mut rx: BufferedUartRx) {
    info!("UART RX pump started");

    let producer = RX_QUEUES.producer();
    let mut buf = [0u8; PUMP_CHUNK_SIZE];

    loop {
        // Bytes already held by the UART predate the flush
        if producer.take_flush_request() {
            discard_held(&mut rx, &mut buf).await;
        }

        let step = select(rx.read(&mut buf), producer.flush_requested()).await;

        match step {
            Either::First(Ok(n)) if n > 0 => {
                let stored = producer.push_bytes(&buf[..n]);
                if stored < n {
                    trace!("RX ring full, dropped {} bytes", n - stored);
                }
            }
            Either::First(Ok(_)) => {
                // No bytes read, continue
            }
            Either::First(Err(e)) => {
                let event = error_event(e);
                if !producer.post(event) {
                    trace!("Event queue full, dropping {:?}", event);
                }
            }
            Either::Second(()) => discard_held(&mut rx, &mut buf).await,
        }
    }
}

/// Drop everything the buffered UART has ready, without waiting for more
async fn discard_held(rx: &mut BufferedUartRx, buf: &mut [u8]) {
    let mut discarded = 0;
    while discarded < HW_RX_BUF_SIZE {
        match with_timeout(Duration::from_ticks(0), rx.read(buf)).await {
            Ok(Ok(n)) if n > 0 => discarded += n,
            _ => break,
        }
    }
    if discarded > 0 {
        debug!("Flushed {} bytes held by the UART", discarded);
    }
}

/// Map an RP2040 receive error onto a hardware event
fn error_event(error: uart::Error) -> UartEvent {
    match error {
        uart::Error::Overrun => UartEvent::HardwareOverflow,
        uart::Error::Break => UartEvent::LineBreak,
        uart::Error::Parity => UartEvent::ParityError,
        uart::Error::Framing => UartEvent::FrameError,
        #[allow(unreachable_patterns)]
        _ => UartEvent::Unknown(UNCLASSIFIED_ERROR),
    }
}
