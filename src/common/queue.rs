// src/common/queue.rs

use core::cell::RefCell;
use critical_section::Mutex;
use heapless::Deque;

/// Bounded FIFO of bytes waiting for the transmit bit clock.
///
/// Every operation takes `&self` and runs inside a short critical section,
/// so a `TxQueue` can live in a `static` and be filled from any context
/// while the TX clock drains it. No operation blocks or allocates.
pub struct TxQueue<const N: usize> {
    inner: Mutex<RefCell<Deque<u8, N>>>,
}

impl<const N: usize> TxQueue<N> {
    pub const fn new() -> Self {
        TxQueue {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Appends as many bytes from the front of `bytes` as fit.
    ///
    /// Returns the number accepted. A short count is the backpressure
    /// signal; the caller retries the remainder once `room()` allows.
    pub fn enqueue(&self, bytes: &[u8]) -> usize {
        critical_section::with(|cs| {
            let mut queue = self.inner.borrow_ref_mut(cs);
            let mut accepted = 0;
            for &byte in bytes {
                if queue.push_back(byte).is_err() {
                    break;
                }
                accepted += 1;
            }
            accepted
        })
    }

    /// Removes and returns the oldest byte.
    pub fn dequeue(&self) -> Option<u8> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    /// Free capacity.
    pub fn room(&self) -> usize {
        N - self.size()
    }

    /// Bytes currently queued.
    pub fn size(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Discards everything queued.
    pub fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).clear())
    }
}

impl<const N: usize> Default for TxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> core::fmt::Debug for TxQueue<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TxQueue")
            .field("size", &self.size())
            .field("capacity", &N)
            .finish()
    }
}
