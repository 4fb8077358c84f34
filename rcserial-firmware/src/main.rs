//! rcserial - Serial Remote Control Receiver
//!
//! Firmware for RP2040 boards. Listens on UART0 (GPIO16 TX, GPIO17 RX,
//! 19200 8N1) for single-byte commands, echoes every byte and drives the
//! player:
//!
//! - `n` next track
//! - `p` previous track
//! - space toggles play/pause

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Level, Output};
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

use rcserial_core::{bring_up, RemoteConfig};

use crate::channels::{REMOTE, RX_QUEUES};
use crate::player::Player;
use crate::uart::Rp2040Uart;

mod channels;
mod player;
mod tasks;
mod uart;

/// Tracks the demo player cycles through
const TRACK_COUNT: u16 = 16;

/// Sent once the dispatch loop is up
const READY_BANNER: &[u8] = b"rcserial ready\r\n";

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("rcserial firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = RemoteConfig::DEFAULT;
    info!(
        "Remote UART: {} baud, TX=GPIO{}, RX=GPIO{}, rx ring {} bytes, {} events",
        config.uart.baudrate,
        config.pins.tx,
        config.pins.rx,
        config.buffers.rx_ring,
        config.buffers.event_queue_depth
    );

    // Startup failures are fatal: no command can be handled without the line
    let driver = Rp2040Uart::new(p.UART0, p.PIN_16, p.PIN_17);
    let installed = match bring_up(driver, &config) {
        Ok(installed) => installed,
        Err(e) => defmt::panic!("Remote UART startup failed: {:?}", e),
    };
    info!("UART installed");

    // Status LED (Pico onboard LED on GPIO25) mirrors play state
    let led = Output::new(p.PIN_25, Level::Low);
    let player = Player::new(led, TRACK_COUNT);

    unwrap!(REMOTE.begin());

    // Spawn tasks
    spawner.spawn(tasks::rx_pump_task(installed.rx)).unwrap();
    spawner
        .spawn(tasks::remote_task(installed.tx, player, config))
        .unwrap();

    info!("All tasks spawned, remote control running");

    if REMOTE.write_raw(READY_BANNER).await.is_err() {
        warn!("Ready banner not sent");
    }

    // Main task only reports queue health from here on
    loop {
        Timer::after_secs(60).await;
        trace!(
            "Main loop heartbeat, {} events dropped",
            RX_QUEUES.dropped_events()
        );
    }
}
