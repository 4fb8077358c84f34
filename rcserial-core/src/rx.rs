//! Queued receive path
//!
//! Splits a serial receiver into the two sides of a single-producer /
//! single-consumer hand-off:
//!
//! ```text
//!  interrupt side                          dispatch task
//! ┌──────────────┐  bytes   ┌──────────┐  read_bytes  ┌─────────────┐
//! │  RxProducer  │ ───────▶ │   ring   │ ───────────▶ │ QueuedPort  │
//! │              │  events  ├──────────┤  next_event  │             │
//! │              │ ───────▶ │  events  │ ───────────▶ │             │
//! └──────────────┘          └──────────┘              └─────────────┘
//! ```
//!
//! Bytes always land in the ring before the event announcing them is
//! queued, so a consumer never sees a data event ahead of its bytes. Every
//! stored byte is announced exactly once: counts that do not fit in the
//! event queue are carried until the consumer picks them up, and counts
//! for bytes a flush threw away are subtracted before the consumer sees
//! them.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pipe::Pipe;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};
use embedded_io_async::Write;
use portable_atomic::{AtomicU32, AtomicUsize, Ordering};

use rcserial_hal::{UartEvent, UartPort};

/// Receive ring of `RX` bytes plus an event queue of depth `EV`
///
/// Meant to live in a `static`; see [`RxQueues::new`].
pub struct RxQueues<M: RawMutex, const RX: usize, const EV: usize> {
    ring: Pipe<M, RX>,
    events: Channel<M, UartEvent, EV>,
    /// Written bytes whose data event could not be queued yet
    unannounced: AtomicUsize,
    /// Raised whenever `unannounced` grows
    deferred: Signal<M, ()>,
    /// Raised by the consumer on flush, honored by whatever feeds the producer
    flush_request: Signal<M, ()>,
    dropped_events: AtomicU32,
}

impl<M: RawMutex, const RX: usize, const EV: usize> RxQueues<M, RX, EV> {
    pub const fn new() -> Self {
        Self {
            ring: Pipe::new(),
            events: Channel::new(),
            unannounced: AtomicUsize::new(0),
            deferred: Signal::new(),
            flush_request: Signal::new(),
            dropped_events: AtomicU32::new(0),
        }
    }

    /// Receive ring capacity in bytes
    pub const fn rx_capacity(&self) -> usize {
        RX
    }

    /// Event queue depth
    pub const fn event_capacity(&self) -> usize {
        EV
    }

    /// Events lost because the queue was full
    pub fn dropped_events(&self) -> u32 {
        self.dropped_events.load(Ordering::Relaxed)
    }

    /// Interrupt-side handle
    pub fn producer(&self) -> RxProducer<'_, M, RX, EV> {
        RxProducer { queues: self }
    }

    /// Dispatch-side port transmitting through `tx`
    pub fn port<T: Write>(&self, tx: T) -> QueuedPort<'_, M, RX, EV, T> {
        QueuedPort {
            queues: self,
            tx,
            owed: 0,
            stale: 0,
        }
    }

    fn take_unannounced(&self) -> Option<usize> {
        match self.unannounced.swap(0, Ordering::AcqRel) {
            0 => None,
            n => Some(n),
        }
    }

    fn record_drop(&self) {
        self.dropped_events.fetch_add(1, Ordering::Relaxed);
    }
}

impl<M: RawMutex, const RX: usize, const EV: usize> Default for RxQueues<M, RX, EV> {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer side, fed by whatever drains the hardware FIFO
pub struct RxProducer<'a, M: RawMutex, const RX: usize, const EV: usize> {
    queues: &'a RxQueues<M, RX, EV>,
}

impl<'a, M: RawMutex, const RX: usize, const EV: usize> RxProducer<'a, M, RX, EV> {
    /// Store received bytes and announce them
    ///
    /// Bytes that do not fit in the ring are dropped and a
    /// [`UartEvent::BufferFull`] is posted. When the event queue is full
    /// the count is carried over and handed to the consumer as soon as it
    /// asks for its next event. Returns the number of bytes stored.
    pub fn push_bytes(&self, bytes: &[u8]) -> usize {
        if bytes.is_empty() {
            return 0;
        }

        let written = self.queues.ring.try_write(bytes).unwrap_or(0);
        if written > 0 {
            self.announce(written);
        }

        if written < bytes.len() {
            self.post(UartEvent::BufferFull);
        }

        written
    }

    /// Queue a non-data event, returning false if the queue was full
    pub fn post(&self, event: UartEvent) -> bool {
        let queued = self.queues.events.try_send(event).is_ok();
        if !queued {
            self.queues.record_drop();
        }
        queued
    }

    /// Whether the consumer asked for a flush since the last check
    pub fn take_flush_request(&self) -> bool {
        self.queues.flush_request.try_take().is_some()
    }

    /// Wait until the consumer asks for a flush
    pub async fn flush_requested(&self) {
        self.queues.flush_request.wait().await
    }

    fn announce(&self, written: usize) {
        let queues = self.queues;
        let pending = queues.unannounced.swap(0, Ordering::AcqRel) + written;
        if queues
            .events
            .try_send(UartEvent::DataAvailable(pending))
            .is_err()
        {
            queues.unannounced.fetch_add(pending, Ordering::AcqRel);
            queues.record_drop();
            queues.deferred.signal(());
        }
    }
}

/// Consumer side: events and bytes from [`RxQueues`], echo through `T`
///
/// Announced counts are settled against flushes here, so a data event
/// handed out never claims more bytes than the ring holds.
pub struct QueuedPort<'a, M: RawMutex, const RX: usize, const EV: usize, T> {
    queues: &'a RxQueues<M, RX, EV>,
    tx: T,
    /// Bytes handed out in data events and not read yet
    owed: usize,
    /// Flushed bytes whose announcement has not come through yet
    stale: usize,
}

impl<'a, M: RawMutex, const RX: usize, const EV: usize, T> QueuedPort<'a, M, RX, EV, T> {
    /// Give back the transmitter
    pub fn release(self) -> T {
        self.tx
    }

    /// Drop the part of an announcement that a flush already discarded
    fn settle(&mut self, announced: usize) -> usize {
        let skip = announced.min(self.stale);
        self.stale -= skip;
        let live = announced - skip;
        self.owed += live;
        live
    }

    /// Next raw event: queued ones first, then any carried-over count
    async fn raw_event(&mut self) -> UartEvent {
        loop {
            if let Ok(event) = self.queues.events.try_receive() {
                return event;
            }
            if let Some(n) = self.queues.take_unannounced() {
                return UartEvent::DataAvailable(n);
            }
            let woke = select(self.queues.events.receive(), self.queues.deferred.wait()).await;
            if let Either::First(event) = woke {
                return event;
            }
        }
    }
}

impl<'a, M: RawMutex, const RX: usize, const EV: usize, T: Write> UartPort
    for QueuedPort<'a, M, RX, EV, T>
{
    type Error = T::Error;

    async fn next_event(&mut self) -> UartEvent {
        loop {
            match self.raw_event().await {
                UartEvent::DataAvailable(announced) => {
                    let live = self.settle(announced);
                    if live > 0 {
                        return UartEvent::DataAvailable(live);
                    }
                }
                event => return event,
            }
        }
    }

    async fn read_bytes(&mut self, buf: &mut [u8], timeout_ms: u32) -> usize {
        if buf.is_empty() {
            return 0;
        }
        let n = match self.queues.ring.try_read(buf) {
            Ok(n) => n,
            Err(_) => with_timeout(
                Duration::from_millis(timeout_ms.into()),
                self.queues.ring.read(buf),
            )
            .await
            .unwrap_or(0),
        };
        self.owed = self.owed.saturating_sub(n);
        n
    }

    async fn write_bytes(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        self.tx.write(data).await
    }

    /// Empty the ring and ask the producer side to drop what it holds
    fn flush_rx(&mut self) -> usize {
        let mut scratch = [0u8; 32];
        let mut discarded = 0;
        while let Ok(n) = self.queues.ring.try_read(&mut scratch) {
            discarded += n;
        }

        // Bytes not yet handed out will still be announced once
        self.stale += discarded.saturating_sub(self.owed);
        self.owed = 0;
        self.queues.flush_request.signal(());
        discarded
    }

    fn buffered_len(&self) -> usize {
        self.queues.ring.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::task::Poll;
    use embassy_futures::{block_on, poll_once};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    #[test]
    fn test_bytes_precede_their_event() {
        let queues: RxQueues<NoopRawMutex, 16, 4> = RxQueues::new();
        let producer = queues.producer();

        assert_eq!(producer.push_bytes(b"np"), 2);
        assert_eq!(queues.ring.len(), 2);
        assert_eq!(
            queues.events.try_receive().ok(),
            Some(UartEvent::DataAvailable(2))
        );
    }

    #[test]
    fn test_overfull_ring_posts_buffer_full() {
        let queues: RxQueues<NoopRawMutex, 4, 4> = RxQueues::new();
        let producer = queues.producer();

        assert_eq!(producer.push_bytes(b"abcdef"), 4);
        assert_eq!(
            queues.events.try_receive().ok(),
            Some(UartEvent::DataAvailable(4))
        );
        assert_eq!(queues.events.try_receive().ok(), Some(UartEvent::BufferFull));

        // Completely full ring: no data event, only the overflow
        assert_eq!(producer.push_bytes(b"g"), 0);
        assert_eq!(queues.events.try_receive().ok(), Some(UartEvent::BufferFull));
        assert!(queues.events.try_receive().is_err());
    }

    #[test]
    fn test_unannounced_bytes_carry_over() {
        let queues: RxQueues<NoopRawMutex, 16, 1> = RxQueues::new();
        let producer = queues.producer();

        producer.push_bytes(b"ab");
        // Queue full: second announcement is deferred
        producer.push_bytes(b"cd");
        assert_eq!(queues.dropped_events(), 1);

        assert_eq!(
            queues.events.try_receive().ok(),
            Some(UartEvent::DataAvailable(2))
        );
        producer.push_bytes(b"e");
        assert_eq!(
            queues.events.try_receive().ok(),
            Some(UartEvent::DataAvailable(3))
        );
    }

    #[test]
    fn test_post_counts_drops() {
        let queues: RxQueues<NoopRawMutex, 8, 1> = RxQueues::new();
        let producer = queues.producer();

        assert!(producer.post(UartEvent::LineBreak));
        assert!(!producer.post(UartEvent::FrameError));
        assert_eq!(queues.dropped_events(), 1);
    }

    #[test]
    fn test_capacities() {
        let queues: RxQueues<NoopRawMutex, 32, 3> = RxQueues::default();
        assert_eq!(queues.rx_capacity(), 32);
        assert_eq!(queues.event_capacity(), 3);
    }

    /// Transmitter that accepts at most `limit` bytes per call
    struct Sink {
        data: heapless::Vec<u8, 64>,
        limit: usize,
    }

    impl embedded_io_async::ErrorType for Sink {
        type Error = core::convert::Infallible;
    }

    impl Write for Sink {
        async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            let n = buf.len().min(self.limit);
            let _ = self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        async fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn test_port_reads_what_was_pushed() {
        let queues: RxQueues<NoopRawMutex, 16, 4> = RxQueues::new();
        queues.producer().push_bytes(b"hello");

        let mut port = queues.port(Sink {
            data: heapless::Vec::new(),
            limit: 64,
        });

        block_on(async {
            assert_eq!(port.next_event().await, UartEvent::DataAvailable(5));
            assert_eq!(port.buffered_len(), 5);

            let mut buf = [0u8; 3];
            assert_eq!(port.read_bytes(&mut buf, 10).await, 3);
            assert_eq!(&buf, b"hel");
            assert_eq!(port.read_bytes(&mut buf, 10).await, 2);
            assert_eq!(&buf[..2], b"lo");
        });
    }

    #[test]
    fn test_read_times_out_when_empty() {
        let queues: RxQueues<NoopRawMutex, 16, 4> = RxQueues::new();
        let mut port = queues.port(Sink {
            data: heapless::Vec::new(),
            limit: 64,
        });

        let mut buf = [0u8; 8];
        assert_eq!(block_on(port.read_bytes(&mut buf, 5)), 0);
        assert_eq!(block_on(port.read_bytes(&mut [], 5)), 0);
    }

    #[test]
    fn test_flush_discards_ring() {
        let queues: RxQueues<NoopRawMutex, 16, 4> = RxQueues::new();
        queues.producer().push_bytes(b"stale");

        let mut port = queues.port(Sink {
            data: heapless::Vec::new(),
            limit: 64,
        });
        assert_eq!(port.flush_rx(), 5);
        assert_eq!(port.buffered_len(), 0);
        // The announcement for the flushed bytes is swallowed
        assert_eq!(poll_once(port.next_event()), Poll::Pending);
    }

    fn sink() -> Sink {
        Sink {
            data: heapless::Vec::new(),
            limit: 64,
        }
    }

    #[test]
    fn test_deferred_count_reaches_consumer() {
        let queues: RxQueues<NoopRawMutex, 16, 1> = RxQueues::new();
        let producer = queues.producer();
        producer.push_bytes(b"ab");
        producer.push_bytes(b"n");

        let mut port = queues.port(sink());
        let mut buf = [0u8; 8];

        assert_eq!(
            poll_once(port.next_event()),
            Poll::Ready(UartEvent::DataAvailable(2))
        );
        assert_eq!(block_on(port.read_bytes(&mut buf, 10)), 2);

        // No further byte arrives, the carried count still comes through
        assert_eq!(
            poll_once(port.next_event()),
            Poll::Ready(UartEvent::DataAvailable(1))
        );
        assert_eq!(block_on(port.read_bytes(&mut buf, 10)), 1);
        assert_eq!(buf[0], b'n');
        assert_eq!(poll_once(port.next_event()), Poll::Pending);
    }

    #[test]
    fn test_flush_drops_carried_count() {
        let queues: RxQueues<NoopRawMutex, 16, 1> = RxQueues::new();
        let producer = queues.producer();
        producer.push_bytes(b"ab");
        producer.push_bytes(b"cd");

        let mut port = queues.port(sink());
        assert_eq!(
            poll_once(port.next_event()),
            Poll::Ready(UartEvent::DataAvailable(2))
        );
        assert_eq!(port.flush_rx(), 4);

        producer.push_bytes(b"x");
        assert_eq!(port.buffered_len(), 1);
        assert_eq!(
            poll_once(port.next_event()),
            Poll::Ready(UartEvent::DataAvailable(1))
        );
        assert_eq!(poll_once(port.next_event()), Poll::Pending);
    }

    #[test]
    fn test_flush_after_queued_announcement() {
        let queues: RxQueues<NoopRawMutex, 16, 4> = RxQueues::new();
        let producer = queues.producer();
        producer.push_bytes(b"abc");
        producer.post(UartEvent::BufferFull);
        producer.push_bytes(b"de");

        let mut port = queues.port(sink());
        // "de" is still announced in the queue when the flush drops it
        assert_eq!(
            poll_once(port.next_event()),
            Poll::Ready(UartEvent::DataAvailable(3))
        );
        let mut buf = [0u8; 8];
        assert_eq!(block_on(port.read_bytes(&mut buf, 10)), 3);
        assert_eq!(
            poll_once(port.next_event()),
            Poll::Ready(UartEvent::BufferFull)
        );
        assert_eq!(port.flush_rx(), 2);

        producer.push_bytes(b"f");
        assert_eq!(
            poll_once(port.next_event()),
            Poll::Ready(UartEvent::DataAvailable(1))
        );
    }

    #[test]
    fn test_flush_is_forwarded_to_producer() {
        let queues: RxQueues<NoopRawMutex, 16, 4> = RxQueues::new();
        let producer = queues.producer();
        assert!(!producer.take_flush_request());

        let mut port = queues.port(sink());
        port.flush_rx();
        assert!(producer.take_flush_request());
        assert!(!producer.take_flush_request());
    }

    #[test]
    fn test_short_writes_go_through_write_fully() {
        let queues: RxQueues<NoopRawMutex, 16, 4> = RxQueues::new();
        let mut port = queues.port(Sink {
            data: heapless::Vec::new(),
            limit: 2,
        });

        block_on(async {
            assert_eq!(port.write_bytes(b"abcde").await, Ok(2));
            crate::dispatch::write_fully(&mut port, b"fghij").await.unwrap();
        });

        assert_eq!(port.release().data.as_slice(), b"abfghij");
    }
}
