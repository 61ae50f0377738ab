// src/engine/receiver.rs

use crate::common::{
    frame::{FrameFormat, FrameLayout, DATA_BITS, START_BIT_INDEX},
    hal_traits::Level,
};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum RxState {
    /// Waiting for a start edge.
    Idle,
    /// Start edge seen, first callback pending half a bit period later.
    Armed,
    /// Sampling the bit at `bit_index` on the next callback.
    Receiving { bit_index: i8 },
}

/// Result of one receive clock callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RxStep {
    /// Frame in progress; fire again one bit period later.
    Continue,
    /// Final stop bit reached and the byte passed the parity policy.
    Deliver(u8),
    /// Final stop bit reached, parity mismatch, byte dropped.
    Discard(u8),
    /// Nothing was armed; stop the clock.
    Idle,
}

/// Receive bit clock state machine together with the start-bit detector.
///
/// The detector only moves `Idle -> Armed`; every other transition happens
/// inside [`Receiver::tick`]. Both sites run under the caller's exclusive
/// borrow, which orders "armed" before the first sample.
#[derive(Debug, Clone)]
pub struct Receiver {
    state: RxState,
    /// 9-bit shift register; samples enter at bit 8 and move right.
    assembled: u16,
    parity: u8,
    parity_ok: bool,
    frames_received: u32,
    parity_errors: u32,
    ignored_edges: u32,
}

impl Receiver {
    pub const fn new() -> Self {
        Receiver {
            state: RxState::Idle,
            assembled: 0,
            parity: 0,
            parity_ok: true,
            frames_received: 0,
            parity_errors: 0,
            ignored_edges: 0,
        }
    }

    /// Start-bit detector. Call on every falling edge of the RX line.
    ///
    /// Returns `true` when the edge begins a new reception: the caller must
    /// then arm the receive clock to fire after half a bit period. Edges
    /// while a reception is armed or running are ignored.
    pub fn on_start_edge(&mut self) -> bool {
        if self.state == RxState::Idle {
            self.state = RxState::Armed;
            true
        } else {
            self.ignored_edges = self.ignored_edges.wrapping_add(1);
            false
        }
    }

    /// `-1` while idle or armed, else the index of the next bit to sample.
    pub fn bit_index(&self) -> i8 {
        match self.state {
            RxState::Receiving { bit_index } => bit_index,
            RxState::Idle | RxState::Armed => START_BIT_INDEX,
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state == RxState::Idle
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.state == RxState::Armed
    }

    /// Parity verdict of the frame in progress.
    #[inline]
    pub fn parity_ok(&self) -> bool {
        self.parity_ok
    }

    #[inline]
    pub fn frames_received(&self) -> u32 {
        self.frames_received
    }

    #[inline]
    pub fn parity_errors(&self) -> u32 {
        self.parity_errors
    }

    #[inline]
    pub fn ignored_edges(&self) -> u32 {
        self.ignored_edges
    }

    /// Drops any partial frame and returns to waiting for a start edge.
    pub fn reset(&mut self) {
        self.state = RxState::Idle;
        self.assembled = 0;
        self.parity = 0;
        self.parity_ok = true;
    }

    /// Runs one receive clock callback with the RX line sampled at `level`.
    ///
    /// The first callback after the start edge only sets up the session;
    /// each later one consumes one bit. The clock is never re-armed after
    /// the final stop bit; the next start edge restarts it.
    pub fn tick(&mut self, level: Level, format: &FrameFormat, layout: &FrameLayout) -> RxStep {
        let bit_index = match self.state {
            RxState::Idle => return RxStep::Idle,
            RxState::Armed => {
                self.assembled = 0;
                self.parity = format.parity_seed();
                self.parity_ok = true;
                self.state = RxState::Receiving { bit_index: 0 };
                return RxStep::Continue;
            }
            RxState::Receiving { bit_index } => bit_index,
        };

        let bit = level.bit();

        if (0..DATA_BITS as i8).contains(&bit_index) {
            if bit == 0 {
                self.assembled &= !0x0100;
            } else {
                self.assembled |= 0x0100;
            }
            self.assembled >>= 1;
            self.parity ^= bit;
            self.state = RxState::Receiving { bit_index: bit_index + 1 };
            return RxStep::Continue;
        }

        if layout.is_parity_index(bit_index) {
            if bit != self.parity {
                self.parity_ok = false;
            }
            self.state = RxState::Receiving { bit_index: bit_index + 1 };
            return RxStep::Continue;
        }

        if bit_index < layout.final_stop_bit_index {
            // Extra stop bit, content ignored.
            self.state = RxState::Receiving { bit_index: bit_index + 1 };
            return RxStep::Continue;
        }

        if bit_index > layout.final_stop_bit_index {
            // Layout shrank under a running frame.
            self.reset();
            return RxStep::Idle;
        }

        let byte = self.assembled as u8;
        let parity_ok = self.parity_ok;
        self.reset();
        if !parity_ok {
            self.parity_errors = self.parity_errors.wrapping_add(1);
        }
        if parity_ok || format.ignore_parity_errors {
            self.frames_received = self.frames_received.wrapping_add(1);
            RxStep::Deliver(byte)
        } else {
            RxStep::Discard(byte)
        }
    }
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}
