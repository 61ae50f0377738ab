// src/lib.rs

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod common;
pub mod engine;
pub mod uart;

#[cfg(test)]
mod sim;

// Re-export key types for convenience
pub use common::{FrameFormat, Level, SoftUartConfig, SoftUartError, Stats, TxQueue};
pub use common::{BitClock, ClockChannel, UartLines};
pub use uart::{Bitbang, DeliverySink, SoftUart};
