// src/sim.rs

//! Simulated platform for host tests: a nanosecond clock, two one-shot
//! timers, a TX line that can be looped back to RX or an RX line that
//! follows a scripted waveform, and falling-edge detection.

use crate::common::hal_traits::{BitClock, ClockChannel, Level, UartLines};
use crate::SoftUart;
use core::ops::{Add, Sub};
use core::time::Duration;

/// Nanoseconds since simulation start.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(pub u64);

impl Add<Duration> for SimInstant {
    type Output = Self;
    fn add(self, rhs: Duration) -> Self {
        SimInstant(self.0 + rhs.as_nanos() as u64)
    }
}

impl Sub<SimInstant> for SimInstant {
    type Output = Duration;
    fn sub(self, rhs: SimInstant) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(rhs.0))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SimLineError;

#[derive(Debug, Default)]
pub struct SimPlatform {
    pub now: u64,
    pub tx_deadline: Option<u64>,
    pub rx_deadline: Option<u64>,
    pub tx_schedules: usize,
    /// Every `set_tx` call, with its time.
    pub tx_log: Vec<(u64, Level)>,
    pub tx_level: Option<Level>,
    pub fail_tx: bool,
    pub loopback: bool,
    /// RX level changes, sorted by time. RX idles high before the first.
    pub rx_script: Vec<(u64, Level)>,
    /// Falling edges on RX not yet dispatched, sorted by time.
    pub pending_edges: Vec<u64>,
    pub edge_enabled: bool,
    pub debounce: Option<Duration>,
}

impl SimPlatform {
    /// RX is wired to TX.
    pub fn loopback() -> Self {
        SimPlatform {
            loopback: true,
            ..Default::default()
        }
    }

    /// RX follows waveforms added with [`SimPlatform::script_bits`].
    pub fn scripted() -> Self {
        Self::default()
    }

    /// Appends `bits` to the RX waveform, one per `period_ns`, from `start`.
    /// The line returns high after the last bit.
    pub fn script_bits(&mut self, start: u64, bits: &[Level], period_ns: u64) {
        for (i, level) in bits.iter().enumerate() {
            self.push_rx(start + i as u64 * period_ns, *level);
        }
        self.push_rx(start + bits.len() as u64 * period_ns, Level::High);
    }

    fn push_rx(&mut self, at: u64, level: Level) {
        let previous = self.script_level_at(at);
        if previous.is_high() && !level.is_high() {
            self.push_edge(at);
        }
        let pos = self.rx_script.partition_point(|(t, _)| *t <= at);
        self.rx_script.insert(pos, (at, level));
    }

    fn push_edge(&mut self, at: u64) {
        let pos = self.pending_edges.partition_point(|t| *t <= at);
        self.pending_edges.insert(pos, at);
    }

    fn script_level_at(&self, at: u64) -> Level {
        self.rx_script
            .iter()
            .rev()
            .find(|(t, _)| *t <= at)
            .map(|(_, level)| *level)
            .unwrap_or(Level::High)
    }

    /// Times of every `set_tx` call after `since`.
    pub fn tx_times_after(&self, since: u64) -> Vec<u64> {
        self.tx_log.iter().filter(|(t, _)| *t > since).map(|(t, _)| *t).collect()
    }

    /// Levels of every `set_tx` call after `since`.
    pub fn tx_levels_after(&self, since: u64) -> Vec<Level> {
        self.tx_log.iter().filter(|(t, _)| *t > since).map(|(_, l)| *l).collect()
    }
}

impl UartLines for SimPlatform {
    type Error = SimLineError;

    fn set_tx(&mut self, level: Level) -> Result<(), Self::Error> {
        if self.fail_tx {
            return Err(SimLineError);
        }
        let previous = self.tx_level.unwrap_or(Level::High);
        if self.loopback && previous.is_high() && !level.is_high() {
            let now = self.now;
            self.push_edge(now);
        }
        self.tx_level = Some(level);
        self.tx_log.push((self.now, level));
        Ok(())
    }

    fn rx_level(&mut self) -> Result<Level, Self::Error> {
        if self.loopback {
            Ok(self.tx_level.unwrap_or(Level::High))
        } else {
            Ok(self.script_level_at(self.now))
        }
    }

    fn set_debounce(&mut self, debounce: Duration) -> Result<(), Self::Error> {
        self.debounce = Some(debounce);
        Ok(())
    }
}

impl BitClock for SimPlatform {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.now)
    }

    fn schedule(&mut self, channel: ClockChannel, deadline: SimInstant) {
        match channel {
            ClockChannel::Tx => {
                self.tx_deadline = Some(deadline.0);
                self.tx_schedules += 1;
            }
            ClockChannel::Rx => self.rx_deadline = Some(deadline.0),
        }
    }

    fn cancel(&mut self, channel: ClockChannel) {
        match channel {
            ClockChannel::Tx => self.tx_deadline = None,
            ClockChannel::Rx => self.rx_deadline = None,
        }
    }

    fn set_edge_interrupt(&mut self, enabled: bool) {
        self.edge_enabled = enabled;
    }
}

pub type SimUart<'q, const N: usize, const RX_N: usize = 64> = SoftUart<'q, SimPlatform, N, RX_N>;

#[derive(Clone, Copy)]
enum Event {
    Edge,
    Tx,
    Rx,
}

/// Dispatches edges and timer deadlines in time order up to and including
/// `end`, then leaves the clock at `end`. At equal times edges go first,
/// then TX, then RX.
pub fn run_until<const N: usize, const RX_N: usize>(uart: &mut SimUart<'_, N, RX_N>, end: u64) {
    loop {
        let platform = uart.interface();
        let candidates = [
            (platform.pending_edges.first().copied(), Event::Edge),
            (platform.tx_deadline, Event::Tx),
            (platform.rx_deadline, Event::Rx),
        ];
        let mut next: Option<(u64, Event)> = None;
        for (time, event) in candidates {
            if let Some(time) = time {
                if next.map_or(true, |(best, _)| time < best) {
                    next = Some((time, event));
                }
            }
        }

        let Some((time, event)) = next.filter(|(time, _)| *time <= end) else {
            let platform = uart.interface_mut();
            platform.now = platform.now.max(end);
            return;
        };

        let platform = uart.interface_mut();
        platform.now = time;
        match event {
            Event::Edge => {
                platform.pending_edges.remove(0);
                if platform.edge_enabled {
                    uart.on_rx_falling_edge();
                }
            }
            Event::Tx => {
                platform.tx_deadline = None;
                uart.on_tx_timer().unwrap();
            }
            Event::Rx => {
                platform.rx_deadline = None;
                uart.on_rx_timer().unwrap();
            }
        }
    }
}

/// Runs for `duration` from the current simulated time.
pub fn run_for<const N: usize, const RX_N: usize>(uart: &mut SimUart<'_, N, RX_N>, duration: Duration) {
    let end = uart.interface().now + duration.as_nanos() as u64;
    run_until(uart, end);
}
