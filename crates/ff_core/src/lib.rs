//! ff_core — identity/primitives, context, targeting tree, and the flag/configuration
//! data model for the feature-flag evaluation engine.
//!
//! This crate is **I/O-free**: it defines the stable types and pure logic shared by
//! `ff_algo`, `ff_io`, and `ff_registry`. No JSON, no hashing, no threads.
//!
//! Serialization derives are gated behind the `serde` feature so the predicate tree
//! and bucketing inputs can be exercised in a `no_std` host without pulling in serde.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod axis;
pub mod context;
pub mod errors;
pub mod flagdef;
pub mod ids;
pub mod rampup;
pub mod targeting;
pub mod value;
pub mod version;

pub mod prelude {
    pub use crate::axis::{AxisCatalog, AxisId, AxisValueType};
    pub use crate::context::{Context, HasLocale, HasPlatform, HasStableId, HasVersion, LocaleId, PlatformId};
    pub use crate::errors::CoreError;
    pub use crate::flagdef::{ConfigurationView, FlagDefinition, Metadata};
    pub use crate::ids::{Feature, FeatureId, HexId, StableId};
    pub use crate::rampup::RampUp;
    pub use crate::targeting::{CustomPredicate, Rule, Targeting};
    pub use crate::value::{FlagType, Value};
    pub use crate::version::{Version, VersionRange};
}
