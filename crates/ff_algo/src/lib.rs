//! ff_algo — deterministic bucketing and rule selection.
//!
//! Depends only on `ff_core`; no snapshot I/O, no registry state.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod bucketing;
pub mod selection;

pub use bucketing::{is_in_rampup, ramp_up_threshold_basis_points, stable_bucket, BUCKET_SPACE, SENTINEL_BUCKET};
pub use selection::{select_rule, Candidate, SelectionOutcome};
