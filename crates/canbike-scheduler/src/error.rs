//! Error types for the scheduler crate.

use thiserror::Error;

/// Timing configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Frame rate of zero
    #[error("frame rate must be at least 1 Hz")]
    InvalidRate,
    /// Zero-length blink interval
    #[error("blink interval must be non-zero")]
    InvalidInterval,
}

pub type SchedulerResult<T = ()> = Result<T, SchedulerError>;
