// src/engine/mod.rs

// Bit-level framing engine: the two timer-driven state machines.
pub mod receiver;
pub mod transmitter;

pub use receiver::{Receiver, RxStep};
pub use transmitter::Transmitter;

/// What the platform timer should do after a bit clock callback.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockAction {
    /// Fire again one bit period after the current deadline.
    Restart,
    /// Stop until explicitly restarted.
    Stop,
}
