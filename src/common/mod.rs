// src/common/mod.rs

// --- Declare all public modules within common ---
pub mod config;
pub mod error;
pub mod frame;
pub mod hal_traits;
pub mod queue;
pub mod stats;
pub mod timing;

// --- Re-export key types/traits for easier access ---

// From config.rs
pub use config::SoftUartConfig;

// From error.rs
pub use error::SoftUartError;

// From frame.rs
pub use frame::{frame_bits, FrameFormat, FrameLayout, Parity, StopBits};

// From hal_traits.rs
pub use hal_traits::{BitClock, ClockChannel, ClockInstant, Level, UartLines};

// From queue.rs
pub use queue::TxQueue;

// From stats.rs
pub use stats::Stats;

// From timing.rs (MAX_BAUD_RATE stays at common::timing::MAX_BAUD_RATE)
pub use timing::{BitScheduler, BitTiming};
