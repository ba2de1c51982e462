//! Minimal error set for core-domain validation & parsing.
//!
//! Kept as a hand-written `Display` impl (no `thiserror`) because this crate is
//! `no_std`-capable and `std::error::Error` is only available when `std` is enabled.

use core::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreError {
    InvalidHexId,
    InvalidRollout,
    InvalidVersion,
    InvalidToken,
    EmptyChoiceSet,
    AxisTypeConflict,
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidHexId => write!(f, "invalid hex id"),
            CoreError::InvalidRollout => write!(f, "ramp-up must be within [0, 100]"),
            CoreError::InvalidVersion => write!(f, "invalid version (expected M.m.p, non-negative)"),
            CoreError::InvalidToken => write!(f, "invalid token"),
            CoreError::EmptyChoiceSet => write!(f, "empty choice set"),
            CoreError::AxisTypeConflict => write!(f, "axis registered twice with conflicting value types"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CoreError {}
