// src/uart/sink.rs

use heapless::Deque;

/// Consumer of successfully decoded bytes.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DeliverySink {
    /// Buffer bytes in the UART's own line buffer, read with `read_byte`.
    #[default]
    LineBuffer,
    /// Hand every byte to a function, called from the receive timer context.
    /// It must not block.
    Callback(fn(u8)),
}

impl DeliverySink {
    /// Hands `byte` to the sink. Returns `false` if the line buffer was full
    /// and the byte was dropped.
    pub(crate) fn deliver<const N: usize>(&self, byte: u8, line_buffer: &mut Deque<u8, N>) -> bool {
        match self {
            DeliverySink::Callback(callback) => {
                callback(byte);
                true
            }
            DeliverySink::LineBuffer => line_buffer.push_back(byte).is_ok(),
        }
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicU8, Ordering};

    static LAST: AtomicU8 = AtomicU8::new(0);

    fn record(byte: u8) {
        LAST.store(byte, Ordering::SeqCst);
    }

    #[test]
    fn test_line_buffer_fills_then_drops() {
        let mut buffer: Deque<u8, 2> = Deque::new();
        let sink = DeliverySink::default();
        assert!(sink.deliver(1, &mut buffer));
        assert!(sink.deliver(2, &mut buffer));
        assert!(!sink.deliver(3, &mut buffer));
        assert_eq!(buffer.pop_front(), Some(1));
        assert_eq!(buffer.pop_front(), Some(2));
    }

    #[test]
    fn test_callback_bypasses_buffer() {
        let mut buffer: Deque<u8, 2> = Deque::new();
        let sink = DeliverySink::Callback(record);
        assert!(sink.deliver(0x7E, &mut buffer));
        assert_eq!(LAST.load(Ordering::SeqCst), 0x7E);
        assert!(buffer.is_empty());
    }
}
