//! Fixed-capacity character queues with overwrite-oldest overrun policy
//!
//! Built on a `heapless::spsc::Queue`: independent read and write cursors
//! over `SLOTS` slots, where equal cursors mean empty, so `SLOTS - 1`
//! items fit. When full, a new item evicts the oldest unread one and the
//! overrun counter goes up. Nothing ever blocks or allocates.

use heapless::spsc::Queue;

use crate::config::relay::QUEUE_SLOTS;

/// Bounded FIFO that overwrites its oldest entry when full
///
/// `SLOTS` must be at least 2.
pub struct CircularQueue<T, const SLOTS: usize> {
    inner: Queue<T, SLOTS>,
    overruns: u32,
}

impl<T, const SLOTS: usize> CircularQueue<T, SLOTS> {
    pub const fn new() -> Self {
        Self {
            inner: Queue::new(),
            overruns: 0,
        }
    }

    /// Append `item`. Returns the entry it displaced if the queue was full.
    pub fn enqueue(&mut self, item: T) -> Option<T> {
        match self.inner.enqueue(item) {
            Ok(()) => None,
            Err(item) => {
                let displaced = self.inner.dequeue();
                let _ = self.inner.enqueue(item);
                self.overruns = self.overruns.wrapping_add(1);
                displaced
            }
        }
    }

    /// Oldest entry, `None` when empty
    pub fn dequeue(&mut self) -> Option<T> {
        self.inner.dequeue()
    }

    pub fn peek(&self) -> Option<&T> {
        self.inner.peek()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Items the queue holds before it starts overwriting
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Entries lost to overwrites since creation
    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /// Drop every queued entry; the overrun count is kept
    pub fn clear(&mut self) {
        while self.inner.dequeue().is_some() {}
    }
}

impl<T, const SLOTS: usize> Default for CircularQueue<T, SLOTS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Queue of relayed characters
pub type RelayQueue = CircularQueue<char, QUEUE_SLOTS>;

/// Direction a character travels through the relay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Decoded locally, waiting to be published
    Outbound,
    /// Received from a peer, waiting for playback
    Inbound,
}

/// The pair of queues shared by the network and playback paths
#[derive(Default)]
pub struct RelayQueues {
    outbound: RelayQueue,
    inbound: RelayQueue,
}

impl RelayQueues {
    pub const fn new() -> Self {
        Self {
            outbound: RelayQueue::new(),
            inbound: RelayQueue::new(),
        }
    }

    pub fn enqueue_outbound(&mut self, ch: char) {
        Self::enqueue(&mut self.outbound, ch, Direction::Outbound);
    }

    pub fn dequeue_outbound(&mut self) -> Option<char> {
        self.outbound.dequeue()
    }

    pub fn enqueue_inbound(&mut self, ch: char) {
        Self::enqueue(&mut self.inbound, ch, Direction::Inbound);
    }

    pub fn dequeue_inbound(&mut self) -> Option<char> {
        self.inbound.dequeue()
    }

    pub fn queue(&self, direction: Direction) -> &RelayQueue {
        match direction {
            Direction::Outbound => &self.outbound,
            Direction::Inbound => &self.inbound,
        }
    }

    /// Drop everything waiting for playback
    pub fn clear_inbound(&mut self) {
        self.inbound.clear();
    }

    /// Empty both directions
    pub fn clear(&mut self) {
        self.outbound.clear();
        self.inbound.clear();
    }

    fn enqueue(queue: &mut RelayQueue, ch: char, direction: Direction) {
        if let Some(lost) = queue.enqueue(ch) {
            log::debug!("relay: {:?} queue full, overwrote {:?}", direction, lost);
        }
    }
}
