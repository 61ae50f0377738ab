// src/uart/mod.rs

pub mod bitbang;
pub mod sink;

pub use bitbang::Bitbang;
pub use sink::DeliverySink;

use crate::common::{
    config::SoftUartConfig,
    error::SoftUartError,
    frame::{FrameFormat, FrameLayout},
    hal_traits::{BitClock, ClockChannel, Level, UartLines},
    queue::TxQueue,
    stats::Stats,
    timing::BitScheduler,
};
use crate::engine::{ClockAction, Receiver, RxStep, Transmitter};
use core::convert::Infallible;
use heapless::Deque;

type Error<IF> = SoftUartError<<IF as UartLines>::Error>;

/// Software UART session over one TX and one RX line.
///
/// The platform calls [`SoftUart::on_tx_timer`] and
/// [`SoftUart::on_rx_timer`] when the deadlines passed to
/// [`BitClock::schedule`] expire, and [`SoftUart::on_rx_falling_edge`] on
/// each falling edge of RX. When those run in interrupt context the
/// `SoftUart` is typically kept in a `critical_section::Mutex<RefCell<_>>`.
///
/// The transmit queue is borrowed so that it can live in a `static` and be
/// filled by producers that do not hold the `SoftUart`; see
/// [`SoftUart::kick`].
pub struct SoftUart<'q, IF, const N: usize, const RX_N: usize = 64>
where
    IF: UartLines + BitClock,
{
    interface: IF,
    config: SoftUartConfig,
    layout: FrameLayout,
    queue: &'q TxQueue<N>,
    transmitter: Transmitter,
    receiver: Receiver,
    tx_clock: BitScheduler<IF::Instant>,
    rx_clock: BitScheduler<IF::Instant>,
    /// End of the last stop bit driven before the TX clock stopped.
    tx_drain_until: Option<IF::Instant>,
    open: bool,
    sink: DeliverySink,
    line_buffer: Deque<u8, RX_N>,
    timer_overruns: u32,
    line_buffer_overflows: u32,
}

impl<'q, IF, const N: usize, const RX_N: usize> SoftUart<'q, IF, N, RX_N>
where
    IF: UartLines + BitClock,
{
    /// Creates a closed soft UART. Does not touch the lines.
    pub fn new(interface: IF, queue: &'q TxQueue<N>, config: SoftUartConfig) -> Self {
        SoftUart {
            interface,
            layout: config.layout(),
            config,
            queue,
            transmitter: Transmitter::new(),
            receiver: Receiver::new(),
            tx_clock: BitScheduler::new(),
            rx_clock: BitScheduler::new(),
            tx_drain_until: None,
            open: false,
            sink: DeliverySink::LineBuffer,
            line_buffer: Deque::new(),
            timer_overruns: 0,
            line_buffer_overflows: 0,
        }
    }

    // --- Configuration ---

    /// Replaces timing and frame format together. Only while closed.
    pub fn configure(&mut self, config: SoftUartConfig) -> Result<(), Error<IF>> {
        if self.open {
            return Err(SoftUartError::SessionOpen);
        }
        self.layout = config.layout();
        self.config = config;
        Ok(())
    }

    /// Sets the baud rate. Only while closed.
    pub fn configure_timing(&mut self, baud_rate: u32) -> Result<(), Error<IF>> {
        let config = self.config.with_baud_rate::<IF::Error>(baud_rate)?;
        self.configure(config)
    }

    /// Sets stop bits, parity and the parity error policy. Only while closed.
    pub fn configure_frame(&mut self, frame: FrameFormat) -> Result<(), Error<IF>> {
        let config = self.config.with_frame(frame);
        self.configure(config)
    }

    pub fn config(&self) -> &SoftUartConfig {
        &self.config
    }

    // --- Session lifecycle ---

    /// Opens a session: TX idles high and the start-bit detector listens.
    pub fn open_session(&mut self) -> Result<(), Error<IF>> {
        if self.open {
            return Err(SoftUartError::SessionOpen);
        }
        self.transmitter.reset();
        self.receiver.reset();
        self.tx_clock.stop();
        self.rx_clock.stop();
        self.tx_drain_until = None;
        self.queue.clear();
        self.line_buffer.clear();

        self.interface.set_tx(Level::High).map_err(SoftUartError::Io)?;
        self.interface
            .set_debounce(self.config.timing.debounce())
            .map_err(SoftUartError::Io)?;

        self.open = true;
        self.interface.set_edge_interrupt(true);

        #[cfg(feature = "log")]
        log::debug!("soft uart open at {} baud", self.config.timing.baud_rate());
        #[cfg(feature = "defmt")]
        defmt::debug!("soft uart open at {} baud", self.config.timing.baud_rate());
        Ok(())
    }

    /// Closes the session.
    ///
    /// Stops both bit clocks at once, discards queued TX bytes and any
    /// partially received frame, detaches the delivery sink and returns TX
    /// to idle. Bytes already in the line buffer stay readable until the
    /// next open.
    pub fn close_session(&mut self) -> Result<(), Error<IF>> {
        self.interface.set_edge_interrupt(false);
        self.interface.cancel(ClockChannel::Tx);
        self.interface.cancel(ClockChannel::Rx);
        self.tx_clock.stop();
        self.rx_clock.stop();
        self.tx_drain_until = None;

        self.queue.clear();
        self.transmitter.reset();
        self.receiver.reset();
        self.sink = DeliverySink::LineBuffer;
        self.open = false;

        #[cfg(feature = "log")]
        log::debug!("soft uart closed");
        #[cfg(feature = "defmt")]
        defmt::debug!("soft uart closed");

        self.interface.set_tx(Level::High).map_err(SoftUartError::Io)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Installs the consumer of decoded bytes for the current session.
    pub fn register_sink(&mut self, sink: DeliverySink) {
        self.sink = sink;
    }

    // --- Transmit side ---

    /// Queues as many of `bytes` as fit and starts the TX clock if stopped.
    ///
    /// Returns the number accepted, counted from the front of `bytes`. With
    /// no session open nothing is accepted.
    pub fn send(&mut self, bytes: &[u8]) -> usize {
        if !self.open {
            return 0;
        }
        let accepted = self.queue.enqueue(bytes);
        self.kick();
        accepted
    }

    /// Starts the TX clock if it is stopped and bytes are waiting.
    ///
    /// Needed after producers enqueue directly on the shared [`TxQueue`].
    /// Never starts a second clock while one is running.
    pub fn kick(&mut self) {
        if !self.open || self.tx_clock.is_running() || self.queue.is_empty() {
            return;
        }
        let now = self.interface.now();
        let deadline = self.tx_clock.start(now, self.config.timing.bit_period());
        self.interface.schedule(ClockChannel::Tx, deadline);
    }

    pub fn queue_room(&self) -> usize {
        self.queue.room()
    }

    pub fn queue_size(&self) -> usize {
        self.queue.size()
    }

    /// TX bit clock callback.
    ///
    /// A line error drops the frame in progress and stops the TX clock.
    pub fn on_tx_timer(&mut self) -> Result<(), Error<IF>> {
        if !self.tx_clock.is_running() {
            return Ok(());
        }
        let step = self.transmitter.tick(
            &mut self.interface,
            self.queue,
            &self.config.frame,
            &self.layout,
        );
        match step {
            Ok(ClockAction::Restart) => {
                self.rearm(ClockChannel::Tx);
                Ok(())
            }
            Ok(ClockAction::Stop) => {
                let period = self.config.timing.bit_period();
                self.tx_drain_until = self.tx_clock.deadline().map(|deadline| deadline + period);
                self.tx_clock.stop();
                Ok(())
            }
            Err(e) => {
                self.transmitter.reset();
                self.tx_clock.stop();
                Err(SoftUartError::Io(e))
            }
        }
    }

    // --- Receive side ---

    /// Start-bit detector callback for a falling edge on RX.
    ///
    /// Arms the RX clock half a bit period out when no reception is in
    /// progress; otherwise the edge is ignored.
    pub fn on_rx_falling_edge(&mut self) {
        if !self.open || !self.receiver.on_start_edge() {
            return;
        }
        let now = self.interface.now();
        let deadline = self.rx_clock.start(now, self.config.timing.half_period());
        self.interface.schedule(ClockChannel::Rx, deadline);
    }

    /// RX bit clock callback.
    ///
    /// A line error drops the frame in progress and stops the RX clock.
    pub fn on_rx_timer(&mut self) -> Result<(), Error<IF>> {
        if !self.rx_clock.is_running() {
            return Ok(());
        }
        let level = match self.interface.rx_level() {
            Ok(level) => level,
            Err(e) => {
                self.receiver.reset();
                self.rx_clock.stop();
                return Err(SoftUartError::Io(e));
            }
        };

        match self.receiver.tick(level, &self.config.frame, &self.layout) {
            RxStep::Continue => self.rearm(ClockChannel::Rx),
            RxStep::Deliver(byte) => {
                self.rx_clock.stop();
                self.deliver(byte);
            }
            RxStep::Discard(_byte) => {
                self.rx_clock.stop();
                #[cfg(feature = "log")]
                log::warn!("parity mismatch, dropped {:#04x}", _byte);
                #[cfg(feature = "defmt")]
                defmt::warn!("parity mismatch, dropped {=u8:#x}", _byte);
            }
            RxStep::Idle => self.rx_clock.stop(),
        }
        Ok(())
    }

    fn deliver(&mut self, byte: u8) {
        if !self.sink.deliver(byte, &mut self.line_buffer) {
            self.line_buffer_overflows = self.line_buffer_overflows.wrapping_add(1);
            #[cfg(feature = "log")]
            log::warn!("line buffer full, dropped {:#04x}", byte);
            #[cfg(feature = "defmt")]
            defmt::warn!("line buffer full, dropped {=u8:#x}", byte);
        }
    }

    /// Re-arms `channel` one bit period after its previous deadline.
    fn rearm(&mut self, channel: ClockChannel) {
        let now = self.interface.now();
        let period = self.config.timing.bit_period();
        let clock = match channel {
            ClockChannel::Tx => &mut self.tx_clock,
            ClockChannel::Rx => &mut self.rx_clock,
        };
        let (deadline, overruns) = clock.forward(now, period);
        if overruns > 0 {
            self.timer_overruns = self.timer_overruns.wrapping_add(overruns);
            #[cfg(feature = "log")]
            log::warn!("{:?} bit clock late, skipped {} periods", channel, overruns);
            #[cfg(feature = "defmt")]
            defmt::warn!("{} bit clock late, skipped {} periods", channel, overruns);
        }
        self.interface.schedule(channel, deadline);
    }

    // --- Byte-level non-blocking access ---

    /// Reads one byte from the line buffer.
    pub fn read_byte(&mut self) -> nb::Result<u8, Infallible> {
        self.line_buffer.pop_front().ok_or(nb::Error::WouldBlock)
    }

    /// Queues one byte, `WouldBlock` while the queue is full.
    pub fn write_byte(&mut self, byte: u8) -> nb::Result<(), Error<IF>> {
        if !self.open {
            return Err(nb::Error::Other(SoftUartError::SessionClosed));
        }
        if self.send(&[byte]) == 1 {
            Ok(())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }

    /// `WouldBlock` until every queued byte is on the line, including the
    /// full bit period of the last stop bit.
    pub fn flush(&mut self) -> nb::Result<(), Infallible> {
        self.kick();
        if self.tx_clock.is_running() || !self.queue.is_empty() {
            return Err(nb::Error::WouldBlock);
        }
        if let Some(until) = self.tx_drain_until {
            if self.interface.now() < until {
                return Err(nb::Error::WouldBlock);
            }
            self.tx_drain_until = None;
        }
        Ok(())
    }

    // --- Inspection ---

    pub fn stats(&self) -> Stats {
        Stats {
            frames_sent: self.transmitter.frames_sent(),
            frames_received: self.receiver.frames_received(),
            parity_errors: self.receiver.parity_errors(),
            ignored_edges: self.receiver.ignored_edges(),
            timer_overruns: self.timer_overruns,
            line_buffer_overflows: self.line_buffer_overflows,
        }
    }

    pub fn transmitter(&self) -> &Transmitter {
        &self.transmitter
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn interface(&self) -> &IF {
        &self.interface
    }

    /// Mutable access to the platform interface. Driving the lines or
    /// timers through it while a session is open desynchronizes the clocks.
    pub fn interface_mut(&mut self) -> &mut IF {
        &mut self.interface
    }

    /// Releases the interface without touching the lines. Close first.
    pub fn free(self) -> IF {
        self.interface
    }
}
