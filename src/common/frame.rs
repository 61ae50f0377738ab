// src/common/frame.rs

use super::error::SoftUartError;
use super::hal_traits::Level;
use arrayvec::ArrayVec;
use core::convert::TryFrom;

/// Number of data bits per frame. Not configurable.
pub const DATA_BITS: u8 = 8;

/// Longest possible frame: start + 8 data + parity + 2 stop.
pub const MAX_FRAME_BITS: usize = 12;

/// Bit index of the start bit / idle state.
pub const START_BIT_INDEX: i8 = -1;

/// Parity mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

/// Number of stop bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    #[inline]
    pub const fn count(self) -> i8 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

impl TryFrom<u8> for StopBits {
    type Error = SoftUartError<()>;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(StopBits::One),
            2 => Ok(StopBits::Two),
            other => Err(SoftUartError::InvalidStopBits(other)),
        }
    }
}

/// Frame shape shared by the transmitter and the receiver.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameFormat {
    pub stop_bits: StopBits,
    pub parity: Parity,
    /// Deliver received bytes even when their parity bit is wrong.
    pub ignore_parity_errors: bool,
}

impl FrameFormat {
    /// Builds a frame format from raw settings.
    ///
    /// `parity_is_odd` is only meaningful when `parity_enabled` is set.
    pub fn new(
        stop_bits: u8,
        parity_enabled: bool,
        parity_is_odd: bool,
        ignore_parity_errors: bool,
    ) -> Result<Self, SoftUartError<()>> {
        let parity = match (parity_enabled, parity_is_odd) {
            (false, _) => Parity::None,
            (true, false) => Parity::Even,
            (true, true) => Parity::Odd,
        };
        Ok(FrameFormat {
            stop_bits: StopBits::try_from(stop_bits)?,
            parity,
            ignore_parity_errors,
        })
    }

    #[inline]
    pub const fn parity_enabled(&self) -> bool {
        !matches!(self.parity, Parity::None)
    }

    /// Initial value of the running parity accumulator: 1 for odd, 0 otherwise.
    ///
    /// XOR-ing the eight data bits into this seed gives the bit that makes
    /// the total count of ones odd (odd parity) or even (even parity).
    #[inline]
    pub const fn parity_seed(&self) -> u8 {
        match self.parity {
            Parity::Odd => 1,
            Parity::None | Parity::Even => 0,
        }
    }

    /// Bit positions of this format.
    #[inline]
    pub const fn layout(&self) -> FrameLayout {
        FrameLayout::resolve(self.stop_bits, self.parity_enabled())
    }

    /// Total bits on the line for one frame, start and stop bits included.
    pub const fn bits_per_frame(&self) -> u32 {
        (self.layout().final_stop_bit_index + 2) as u32
    }
}

/// Derived bit positions, relative to a bit index that is 0 for the first
/// data bit and [`START_BIT_INDEX`] for the start bit / idle state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameLayout {
    pub parity_index: Option<i8>,
    pub final_stop_bit_index: i8,
}

impl FrameLayout {
    /// Resolves the parity and final stop bit positions.
    pub const fn resolve(stop_bits: StopBits, parity_enabled: bool) -> Self {
        if parity_enabled {
            FrameLayout {
                parity_index: Some(DATA_BITS as i8),
                final_stop_bit_index: DATA_BITS as i8 + stop_bits.count(),
            }
        } else {
            FrameLayout {
                parity_index: None,
                final_stop_bit_index: DATA_BITS as i8 - 1 + stop_bits.count(),
            }
        }
    }

    #[inline]
    pub fn is_parity_index(&self, bit_index: i8) -> bool {
        self.parity_index == Some(bit_index)
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        FrameFormat::default().layout()
    }
}

/// The line levels of one complete frame carrying `byte`, in transmission order.
pub fn frame_bits(byte: u8, format: &FrameFormat) -> ArrayVec<Level, MAX_FRAME_BITS> {
    let mut bits = ArrayVec::new();
    bits.push(Level::Low);

    let mut parity = format.parity_seed();
    for i in 0..DATA_BITS {
        let bit = (byte >> i) & 1;
        parity ^= bit;
        bits.push(Level::from_bit(bit));
    }
    if format.parity_enabled() {
        bits.push(Level::from_bit(parity));
    }
    for _ in 0..format.stop_bits.count() {
        bits.push(Level::High);
    }
    bits
}
