//! `RampUp`: a percentage in `[0, 100]` gating a rule after targeting matches.

use crate::errors::CoreError;
use core::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A percentage in `[0.0, 100.0]`. Defaults to `100` (everyone who matches
/// targeting is included).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct RampUp(f64);

impl RampUp {
    pub const FULL: RampUp = RampUp(100.0);
    pub const NONE: RampUp = RampUp(0.0);

    pub fn new(pct: f64) -> Result<Self, CoreError> {
        if !(0.0..=100.0).contains(&pct) || pct.is_nan() {
            return Err(CoreError::InvalidRollout);
        }
        Ok(RampUp(pct))
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.0 >= 100.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 <= 0.0
    }

    /// `round(value * 100)` half-up, clamped to `[0, 10000]`.
    pub fn threshold_basis_points(&self) -> u32 {
        let bp = (self.0 * 100.0 + 0.5).floor();
        bp.clamp(0.0, 10_000.0) as u32
    }
}

impl Default for RampUp {
    fn default() -> Self {
        RampUp::FULL
    }
}

impl Eq for RampUp {}

impl PartialOrd for RampUp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl Ord for RampUp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

impl TryFrom<f64> for RampUp {
    type Error = CoreError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        RampUp::new(value)
    }
}

impl From<RampUp> for f64 {
    fn from(r: RampUp) -> f64 {
        r.0
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn threshold_basis_points_always_in_range(pct in 0.0..=100.0f64) {
            let r = RampUp::new(pct).unwrap();
            prop_assert!(r.threshold_basis_points() <= 10_000);
        }

        #[test]
        fn valid_percentages_never_error(pct in 0.0..=100.0f64) {
            prop_assert!(RampUp::new(pct).is_ok());
        }
    }
}
