// src/uart/bitbang.rs

use crate::common::hal_traits::{BitClock, ClockChannel, Level, UartLines};
use core::fmt::Debug;
use embedded_hal::digital::{InputPin, OutputPin};

/// Binds two `embedded-hal` GPIO pins and a platform bit clock into the
/// interface a [`crate::SoftUart`] drives.
///
/// The TX pin must already be configured as an output and the RX pin as an
/// input with a falling-edge interrupt routed to
/// [`crate::SoftUart::on_rx_falling_edge`].
#[derive(Debug)]
pub struct Bitbang<TX, RX, CLK> {
    tx: TX,
    rx: RX,
    clock: CLK,
}

impl<TX, RX, CLK> Bitbang<TX, RX, CLK> {
    pub fn new(tx: TX, rx: RX, clock: CLK) -> Self {
        Bitbang { tx, rx, clock }
    }

    pub fn clock(&self) -> &CLK {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut CLK {
        &mut self.clock
    }

    /// Releases the pins and the clock.
    pub fn free(self) -> (TX, RX, CLK) {
        (self.tx, self.rx, self.clock)
    }
}

impl<TX, RX, CLK, E> UartLines for Bitbang<TX, RX, CLK>
where
    TX: OutputPin<Error = E>,
    RX: InputPin<Error = E>,
    E: Debug,
{
    type Error = E;

    fn set_tx(&mut self, level: Level) -> Result<(), Self::Error> {
        self.tx.set_state(level.into())
    }

    fn rx_level(&mut self) -> Result<Level, Self::Error> {
        self.rx.is_high().map(Level::from)
    }
}

impl<TX, RX, CLK> BitClock for Bitbang<TX, RX, CLK>
where
    CLK: BitClock,
{
    type Instant = CLK::Instant;

    fn now(&self) -> Self::Instant {
        self.clock.now()
    }

    fn schedule(&mut self, channel: ClockChannel, deadline: Self::Instant) {
        self.clock.schedule(channel, deadline)
    }

    fn cancel(&mut self, channel: ClockChannel) {
        self.clock.cancel(channel)
    }

    fn set_edge_interrupt(&mut self, enabled: bool) {
        self.clock.set_edge_interrupt(enabled)
    }
}
