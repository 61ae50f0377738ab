// src/common/config.rs

use super::error::SoftUartError;
use super::frame::{FrameFormat, FrameLayout};
use super::timing::BitTiming;

/// Complete soft UART configuration: bit timing plus frame shape.
///
/// Swapped as a whole between sessions, so both bit clocks always see a
/// timing and a frame layout that belong together.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct SoftUartConfig {
    pub timing: BitTiming,
    pub frame: FrameFormat,
}

impl SoftUartConfig {
    pub fn new<E>(baud_rate: u32, frame: FrameFormat) -> Result<Self, SoftUartError<E>>
    where
        E: core::fmt::Debug,
    {
        Ok(SoftUartConfig {
            timing: BitTiming::from_baud(baud_rate)?,
            frame,
        })
    }

    /// Same frame shape, different baud rate.
    pub fn with_baud_rate<E>(self, baud_rate: u32) -> Result<Self, SoftUartError<E>>
    where
        E: core::fmt::Debug,
    {
        Self::new(baud_rate, self.frame)
    }

    /// Same timing, different frame shape.
    pub fn with_frame(self, frame: FrameFormat) -> Self {
        SoftUartConfig { frame, ..self }
    }

    #[inline]
    pub fn layout(&self) -> FrameLayout {
        self.frame.layout()
    }
}
