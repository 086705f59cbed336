//! Error types for anchor-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Missing timezone: a naive datetime cannot be anchored without a timezone")]
    MissingTimezone,

    #[error("Invalid datetime input: {0}")]
    InvalidDatetimeInput(String),

    #[error("Invalid shift unit: {0}")]
    InvalidShiftUnit(String),

    #[error("Invalid shift direction: {0}")]
    InvalidShiftDirection(String),

    #[error("Invalid shift count: {0}")]
    InvalidShiftCount(String),

    #[error("Invalid truncation level: {0}")]
    InvalidTruncationLevel(String),

    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    #[error("Datetime out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, AnchorError>;
