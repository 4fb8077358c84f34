//! Shared test doubles: an in-memory port and a recording playback engine

#![allow(dead_code)]

use std::collections::VecDeque;

use rcserial_core::{PlayControl, Playback};
use rcserial_hal::{UartEvent, UartPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Port backed by queues; reads never wait
pub struct MockPort {
    pub events: VecDeque<UartEvent>,
    pub rx: VecDeque<u8>,
    pub echoed: Vec<u8>,
    pub flushes: usize,
    /// Bytes accepted per write call
    pub write_limit: usize,
    pub fail_writes: bool,
}

impl MockPort {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            rx: VecDeque::new(),
            echoed: Vec::new(),
            flushes: 0,
            write_limit: usize::MAX,
            fail_writes: false,
        }
    }

    /// Buffer bytes and announce them with one data event
    pub fn deliver(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
        self.events.push_back(UartEvent::DataAvailable(bytes.len()));
    }

    pub fn post(&mut self, event: UartEvent) {
        self.events.push_back(event);
    }
}

impl UartPort for MockPort {
    type Error = MockError;

    async fn next_event(&mut self) -> UartEvent {
        match self.events.pop_front() {
            Some(event) => event,
            None => core::future::pending().await,
        }
    }

    async fn read_bytes(&mut self, buf: &mut [u8], _timeout_ms: u32) -> usize {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        n
    }

    async fn write_bytes(&mut self, data: &[u8]) -> Result<usize, MockError> {
        if self.fail_writes {
            return Err(MockError);
        }
        let n = data.len().min(self.write_limit);
        self.echoed.extend_from_slice(&data[..n]);
        Ok(n)
    }

    fn flush_rx(&mut self) -> usize {
        self.flushes += 1;
        let discarded = self.rx.len();
        self.rx.clear();
        discarded
    }

    fn buffered_len(&self) -> usize {
        self.rx.len()
    }
}

/// Playback engine that records every control call
pub struct RecordingPlayer {
    pub calls: Vec<PlayControl>,
    pub playing: bool,
}

impl RecordingPlayer {
    pub fn new(playing: bool) -> Self {
        Self {
            calls: Vec::new(),
            playing,
        }
    }

    pub fn count(&self, op: PlayControl) -> usize {
        self.calls.iter().filter(|&&c| c == op).count()
    }
}

impl Playback for RecordingPlayer {
    fn control(&mut self, op: PlayControl) {
        match op {
            PlayControl::Play => self.playing = true,
            PlayControl::Pause => self.playing = false,
            PlayControl::Next | PlayControl::Previous => {}
        }
        self.calls.push(op);
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Transmitter that keeps everything written to it
#[derive(Default)]
pub struct EchoSink {
    pub data: Vec<u8>,
}

impl embedded_io_async::ErrorType for EchoSink {
    type Error = core::convert::Infallible;
}

impl embedded_io_async::Write for EchoSink {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.data.extend_from_slice(buf);
        Ok(buf.len())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
