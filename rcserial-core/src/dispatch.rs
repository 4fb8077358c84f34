//! Hardware event dispatch
//!
//! The dispatcher owns the receive buffer and the playback collaborator.
//! For each event it either drains and echoes the announced bytes while
//! acting on commands, flushes the receive ring, or simply notes the
//! event. It never fails: what happened is returned as an [`Outcome`] for
//! the caller to log.

use rcserial_hal::{UartEvent, UartPort};

use crate::command::Command;
use crate::config::RemoteConfig;
use crate::playback::Playback;

/// Failure to push a full payload out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError<E> {
    /// Port reported an error
    Port(E),
    /// Port accepted zero bytes of a non-empty payload
    Stalled,
}

/// Write all of `data`, looping over short writes
pub async fn write_fully<U: UartPort>(
    port: &mut U,
    mut data: &[u8],
) -> Result<(), WriteError<U::Error>> {
    while !data.is_empty() {
        let written = port.write_bytes(data).await.map_err(WriteError::Port)?;
        if written == 0 {
            return Err(WriteError::Stalled);
        }
        data = &data[written.min(data.len())..];
    }
    Ok(())
}

/// Result of handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Data event drained
    Data {
        /// Byte count carried by the event
        announced: usize,
        /// Bytes queued when handling started (diagnostic)
        buffered: usize,
        /// Bytes actually read and echoed
        read: usize,
        /// Bytes that mapped to a playback command
        commands: usize,
        /// Bytes whose echo could not be written
        echo_failures: usize,
    },
    /// Receive ring flushed after an overflow condition
    Flushed { discarded: usize },
    /// Informational event, nothing done
    Noted,
}

/// Running counters, wrapping on overflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchStats {
    pub events: u32,
    pub bytes_echoed: u32,
    pub commands: u32,
    pub flushes: u32,
    pub echo_failures: u32,
}

/// Event dispatcher with an `N`-byte receive buffer
///
/// The buffer is allocated once with the dispatcher and reused for every
/// data event.
pub struct Dispatcher<P, const N: usize> {
    playback: P,
    buf: [u8; N],
    read_timeout_ms: u32,
    stats: DispatchStats,
}

impl<P: Playback, const N: usize> Dispatcher<P, N> {
    pub fn new(playback: P, read_timeout_ms: u32) -> Self {
        Self {
            playback,
            buf: [0; N],
            read_timeout_ms,
            stats: DispatchStats::default(),
        }
    }

    pub fn from_config(playback: P, config: &RemoteConfig) -> Self {
        Self::new(playback, config.read_timeout_ms)
    }

    pub fn playback(&self) -> &P {
        &self.playback
    }

    pub fn into_playback(self) -> P {
        self.playback
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Handle one hardware event
    pub async fn handle<U: UartPort>(&mut self, port: &mut U, event: UartEvent) -> Outcome {
        self.stats.events = self.stats.events.wrapping_add(1);

        match event {
            UartEvent::DataAvailable(announced) => self.drain(port, announced).await,
            UartEvent::HardwareOverflow | UartEvent::BufferFull => {
                let discarded = port.flush_rx();
                self.stats.flushes = self.stats.flushes.wrapping_add(1);
                Outcome::Flushed { discarded }
            }
            UartEvent::LineBreak
            | UartEvent::ParityError
            | UartEvent::FrameError
            | UartEvent::PatternDetected
            | UartEvent::Unknown(_) => Outcome::Noted,
        }
    }

    /// Read the announced bytes in buffer-sized chunks, echo and act on each
    async fn drain<U: UartPort>(&mut self, port: &mut U, announced: usize) -> Outcome {
        let buffered = port.buffered_len();
        let mut remaining = announced;
        let mut read = 0;
        let mut commands = 0;
        let mut echo_failures = 0;

        while remaining > 0 {
            let want = remaining.min(N);
            let got = port
                .read_bytes(&mut self.buf[..want], self.read_timeout_ms)
                .await
                .min(want);
            if got == 0 {
                // Bytes were flushed after the event was posted
                break;
            }

            for i in 0..got {
                let byte = self.buf[i];

                // Echo first, then act; arrival order is preserved
                if write_fully(port, &[byte]).await.is_ok() {
                    self.stats.bytes_echoed = self.stats.bytes_echoed.wrapping_add(1);
                } else {
                    echo_failures += 1;
                    self.stats.echo_failures = self.stats.echo_failures.wrapping_add(1);
                }

                if let Some(command) = Command::from_byte(byte) {
                    command.apply(&mut self.playback);
                    commands += 1;
                    self.stats.commands = self.stats.commands.wrapping_add(1);
                }
            }

            read += got;
            remaining -= got;
        }

        Outcome::Data {
            announced,
            buffered,
            read,
            commands,
            echo_failures,
        }
    }
}
