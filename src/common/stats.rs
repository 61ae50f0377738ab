// src/common/stats.rs

/// Running counters for one soft UART instance.
///
/// Counters wrap on overflow and survive session close.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stats {
    /// Frames whose final stop bit was driven.
    pub frames_sent: u32,
    /// Frames delivered to the sink (parity errors included when ignored).
    pub frames_received: u32,
    /// Frames whose parity bit did not match.
    pub parity_errors: u32,
    /// Falling edges seen while a reception was already armed or running.
    pub ignored_edges: u32,
    /// Bit periods skipped because a timer callback ran too late.
    pub timer_overruns: u32,
    /// Received bytes dropped because the line buffer was full.
    pub line_buffer_overflows: u32,
}
