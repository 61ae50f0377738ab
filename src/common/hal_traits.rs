// src/common/hal_traits.rs

use core::fmt::Debug;
use core::ops::{Add, Sub};
use core::time::Duration;

/// Logic level of a UART line. Both lines idle `High`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The level as a single bit (`Low` = 0, `High` = 1).
    #[inline]
    pub const fn bit(self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    /// Level for the least significant bit of `bit`.
    #[inline]
    pub const fn from_bit(bit: u8) -> Self {
        if bit & 1 == 1 {
            Level::High
        } else {
            Level::Low
        }
    }

    #[inline]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for embedded_hal::digital::PinState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => embedded_hal::digital::PinState::Low,
            Level::High => embedded_hal::digital::PinState::High,
        }
    }
}

/// Point in time on the platform's monotonic clock.
///
/// Deadlines are computed as `previous_deadline + bit_period`, so the
/// instant type must support adding a `Duration` and measuring the distance
/// between two instants.
pub trait ClockInstant:
    Copy + Ord + Debug + Add<Duration, Output = Self> + Sub<Self, Output = Duration>
{
}

impl<T> ClockInstant for T where
    T: Copy + Ord + Debug + Add<Duration, Output = T> + Sub<T, Output = Duration>
{
}

/// Identifies one of the two independent bit clocks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockChannel {
    /// Transmit bit clock.
    Tx,
    /// Receive bit clock.
    Rx,
}

/// Minimal line capability: drive the TX line, sample the RX line.
pub trait UartLines {
    /// Associated error type for line access.
    type Error: Debug;

    /// Drives the TX line to `level`.
    fn set_tx(&mut self, level: Level) -> Result<(), Self::Error>;

    /// Samples the current level of the RX line.
    fn rx_level(&mut self) -> Result<Level, Self::Error>;

    /// Configures input debouncing on the RX line, if the platform has it.
    ///
    /// Called on session open with [`crate::common::BitTiming::debounce`],
    /// which is zero at common baud rates. A debounce approaching half a bit
    /// would delay the start edge and push every sample toward the end of
    /// its bit cell.
    fn set_debounce(&mut self, _debounce: Duration) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Platform timer and interrupt facility driving the bit clocks.
///
/// Each channel is a one-shot timer. When a scheduled deadline expires the
/// platform calls `SoftUart::on_tx_timer` / `SoftUart::on_rx_timer` from
/// its timer context. A falling edge on RX, while the edge interrupt is
/// enabled, must be reported through `SoftUart::on_rx_falling_edge`.
///
/// None of these methods may block.
pub trait BitClock {
    type Instant: ClockInstant;

    /// Current time on the monotonic clock.
    fn now(&self) -> Self::Instant;

    /// Arms `channel` to fire once at `deadline`, replacing any pending deadline.
    fn schedule(&mut self, channel: ClockChannel, deadline: Self::Instant);

    /// Cancels any pending deadline on `channel`.
    fn cancel(&mut self, channel: ClockChannel);

    /// Unmasks or masks the falling-edge interrupt on the RX line.
    fn set_edge_interrupt(&mut self, enabled: bool);
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bits() {
        assert_eq!(Level::Low.bit(), 0);
        assert_eq!(Level::High.bit(), 1);
        assert_eq!(Level::from_bit(0b10), Level::Low);
        assert_eq!(Level::from_bit(0b11), Level::High);
        assert_eq!(Level::from(true), Level::High);
        assert!(!Level::Low.is_high());
    }

    #[test]
    fn test_level_into_pin_state() {
        use embedded_hal::digital::PinState;
        assert_eq!(PinState::from(Level::High), PinState::High);
        assert_eq!(PinState::from(Level::Low), PinState::Low);
    }
}
