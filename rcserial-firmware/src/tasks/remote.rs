//! Remote control dispatch task
//!
//! Waits for hardware events, echoes received bytes and drives the
//! player. Exits when `REMOTE.stop()` is called.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;

use rcserial_core::config::READ_CHUNK_SIZE;
use rcserial_core::{Activity, Dispatcher, Outcome, RemoteConfig};
use rcserial_hal::UartEvent;

use crate::channels::{REMOTE, RX_QUEUES};
use crate::player::Player;

/// Remote task - runs the dispatch loop until stopped
#[embassy_executor::task]
pub async fn remote_task(tx: BufferedUartTx, player: Player, config: RemoteConfig) {
    info!("Remote dispatch task started");

    let mut port = RX_QUEUES.port(tx);
    let mut dispatcher: Dispatcher<Player, READ_CHUNK_SIZE> =
        Dispatcher::from_config(player, &config);

    REMOTE.serve(&mut port, &mut dispatcher, log_activity).await;

    let stats = dispatcher.stats();
    info!(
        "Remote dispatch task stopped: {} events, {} bytes echoed, {} commands, {} flushes",
        stats.events, stats.bytes_echoed, stats.commands, stats.flushes
    );
}

/// Log one step of the dispatch loop
fn log_activity(activity: &Activity) {
    match *activity {
        Activity::Event { event, outcome } => log_event(event, outcome),
        Activity::RawWrite { len, ok: true } => trace!("Raw write: {} bytes", len),
        Activity::RawWrite { len, ok: false } => warn!("Raw write of {} bytes failed", len),
        Activity::Stopped => debug!("Stop requested"),
    }
}

fn log_event(event: UartEvent, outcome: Outcome) {
    match (event, outcome) {
        (
            UartEvent::DataAvailable(_),
            Outcome::Data {
                announced,
                buffered,
                read,
                commands,
                echo_failures,
            },
        ) => {
            debug!(
                "Data, len: {}; buffered len: {}; read {}, {} commands",
                announced, buffered, read, commands
            );
            if echo_failures > 0 {
                warn!("Echo failed for {} bytes", echo_failures);
            }
        }
        (UartEvent::HardwareOverflow, Outcome::Flushed { discarded }) => {
            warn!("HW FIFO overflow, flushed {} bytes", discarded);
        }
        (UartEvent::BufferFull, Outcome::Flushed { discarded }) => {
            warn!("RX ring buffer full, flushed {} bytes", discarded);
        }
        (event, _) if event.is_line_fault() => warn!("UART line fault: {:?}", event),
        (UartEvent::PatternDetected, _) => info!("UART pattern detected"),
        (UartEvent::Unknown(code), _) => info!("UART event type: {}", code),
        (event, outcome) => debug!("Event {:?} -> {:?}", event, outcome),
    }
}
