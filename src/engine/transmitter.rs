// src/engine/transmitter.rs

use super::ClockAction;
use crate::common::{
    frame::{FrameFormat, FrameLayout, DATA_BITS, START_BIT_INDEX},
    hal_traits::{Level, UartLines},
    queue::TxQueue,
};

/// Transmit bit clock state machine.
///
/// One call to [`Transmitter::tick`] per bit period drives exactly one bit
/// of the current frame onto the TX line.
#[derive(Debug, Clone)]
pub struct Transmitter {
    current_byte: u8,
    bit_index: i8,
    parity: u8,
    frames_sent: u32,
}

impl Transmitter {
    pub const fn new() -> Self {
        Transmitter {
            current_byte: 0,
            bit_index: START_BIT_INDEX,
            parity: 0,
            frames_sent: 0,
        }
    }

    /// `-1` while idle (next tick sends a start bit), else the bit about to be driven.
    #[inline]
    pub fn bit_index(&self) -> i8 {
        self.bit_index
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.bit_index == START_BIT_INDEX
    }

    #[inline]
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Drops any frame in progress. The frame counter is kept.
    pub fn reset(&mut self) {
        self.current_byte = 0;
        self.bit_index = START_BIT_INDEX;
        self.parity = 0;
    }

    /// Runs one bit period.
    ///
    /// Returns whether the clock must fire again one bit period later. After
    /// the final stop bit it only re-arms when more bytes are queued, so
    /// back-to-back bytes go out without an idle gap.
    pub fn tick<L, const N: usize>(
        &mut self,
        line: &mut L,
        queue: &TxQueue<N>,
        format: &FrameFormat,
        layout: &FrameLayout,
    ) -> Result<ClockAction, L::Error>
    where
        L: UartLines,
    {
        let index = self.bit_index;

        if index == START_BIT_INDEX {
            let Some(byte) = queue.dequeue() else {
                return Ok(ClockAction::Stop);
            };
            self.current_byte = byte;
            self.parity = format.parity_seed();
            self.bit_index = 0;
            line.set_tx(Level::Low)?;
            return Ok(ClockAction::Restart);
        }

        if (0..DATA_BITS as i8).contains(&index) {
            let bit = (self.current_byte >> index) & 1;
            self.parity ^= bit;
            self.bit_index += 1;
            line.set_tx(Level::from_bit(bit))?;
            return Ok(ClockAction::Restart);
        }

        if layout.is_parity_index(index) {
            self.bit_index += 1;
            line.set_tx(Level::from_bit(self.parity))?;
            return Ok(ClockAction::Restart);
        }

        if index <= layout.final_stop_bit_index {
            line.set_tx(Level::High)?;
            if index == layout.final_stop_bit_index {
                self.reset();
                self.frames_sent = self.frames_sent.wrapping_add(1);
                return Ok(if queue.is_empty() {
                    ClockAction::Stop
                } else {
                    ClockAction::Restart
                });
            }
            self.bit_index += 1;
            return Ok(ClockAction::Restart);
        }

        // Layout shrank under a running frame.
        self.reset();
        Ok(ClockAction::Stop)
    }
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}
