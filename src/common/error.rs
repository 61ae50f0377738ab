// src/common/error.rs

/// Errors reported by the soft UART.
///
/// Generic over the platform line error `E`. Parity mismatches and a full
/// transmit queue are not errors: the first is a per-frame drop policy, the
/// second is reported through `send`'s short count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SoftUartError<E = ()>
where
    E: core::fmt::Debug, // Still need Debug for the generic Io error
{
    /// Underlying line error from the platform while driving or sampling.
    #[error("I/O error: {0:?}")]
    Io(E),

    /// A session is already open. Also returned when reconfiguring while open.
    #[error("Session already open")]
    SessionOpen,

    /// No session is open.
    #[error("Session closed")]
    SessionClosed,

    /// Baud rate is zero or too high to give a non-zero half bit period.
    #[error("Invalid baud rate: {0}")]
    InvalidBaudRate(u32),

    /// Stop-bit count outside {1, 2}.
    #[error("Invalid stop bit count: {0}")]
    InvalidStopBits(u8),
}
