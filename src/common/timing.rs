// src/common/timing.rs

use super::error::SoftUartError;
use super::frame::FrameFormat;
use super::hal_traits::ClockInstant;
use core::time::Duration;

const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Highest baud rate that still yields a non-zero half bit period (2 ns bit).
pub const MAX_BAUD_RATE: u32 = NANOS_PER_SECOND / 2;

/// Bit timing derived from a baud rate.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BitTiming {
    baud_rate: u32,
    bit_period: Duration,
    half_period: Duration,
}

impl BitTiming {
    /// Derives `bit_period = 1 / baud` and `half_period = bit_period / 2`,
    /// both truncated to whole nanoseconds.
    pub fn from_baud<E>(baud_rate: u32) -> Result<Self, SoftUartError<E>>
    where
        E: core::fmt::Debug,
    {
        if baud_rate == 0 || baud_rate > MAX_BAUD_RATE {
            return Err(SoftUartError::InvalidBaudRate(baud_rate));
        }
        let period_ns = NANOS_PER_SECOND / baud_rate;
        Ok(BitTiming {
            baud_rate,
            bit_period: Duration::from_nanos(period_ns as u64),
            half_period: Duration::from_nanos((period_ns / 2) as u64),
        })
    }

    #[inline]
    pub const fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    #[inline]
    pub const fn bit_period(&self) -> Duration {
        self.bit_period
    }

    /// Delay from the start edge to the first receive callback.
    #[inline]
    pub const fn half_period(&self) -> Duration {
        self.half_period
    }

    /// RX input debounce applied on session open.
    ///
    /// Whole microseconds of `500 / baud`: zero above 500 baud and always far
    /// below half a bit, so a debounced start edge is not reported late
    /// enough to move the first sample off the middle of the bit.
    #[inline]
    pub const fn debounce(&self) -> Duration {
        Duration::from_micros((1000 / self.baud_rate / 2) as u64)
    }

    /// Time on the line for one whole frame of `format`.
    pub fn frame_duration(&self, format: &FrameFormat) -> Duration {
        self.bit_period * format.bits_per_frame()
    }
}

impl Default for BitTiming {
    /// 9600 baud.
    fn default() -> Self {
        BitTiming {
            baud_rate: 9600,
            bit_period: Duration::from_nanos(104_166),
            half_period: Duration::from_nanos(52_083),
        }
    }
}

/// Drift-corrected deadline tracking for one bit clock.
///
/// Every deadline after the first is computed from the previous deadline,
/// never from the time the callback actually ran, so callback latency does
/// not accumulate across a frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct BitScheduler<I> {
    deadline: Option<I>,
}

impl<I: ClockInstant> BitScheduler<I> {
    pub const fn new() -> Self {
        BitScheduler { deadline: None }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Deadline of the pending (or currently firing) tick.
    #[inline]
    pub fn deadline(&self) -> Option<I> {
        self.deadline
    }

    /// Arms the first tick at `now + delay`.
    pub fn start(&mut self, now: I, delay: Duration) -> I {
        let deadline = now + delay;
        self.deadline = Some(deadline);
        deadline
    }

    /// Advances the deadline by one `period` from the previous deadline.
    ///
    /// If that is not after `now` the callback ran more than a period late;
    /// whole periods are skipped until the deadline lies in the future and
    /// the number skipped is returned alongside the new deadline. A stopped
    /// scheduler restarts at `now + period`.
    pub fn forward(&mut self, now: I, period: Duration) -> (I, u32) {
        let Some(previous) = self.deadline else {
            return (self.start(now, period), 0);
        };

        let mut next = previous + period;
        let mut overruns = 0;
        if next <= now && !period.is_zero() {
            let behind = now - next;
            let skipped = (behind.as_nanos() / period.as_nanos()) as u32 + 1;
            next = next + period * skipped;
            overruns = skipped;
        }
        self.deadline = Some(next);
        (next, overruns)
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }
}

impl<I: ClockInstant> Default for BitScheduler<I> {
    fn default() -> Self {
        Self::new()
    }
}
