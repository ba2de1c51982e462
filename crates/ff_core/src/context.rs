//! The evaluation context: the caller-supplied facts a [`crate::targeting::Targeting`]
//! predicate is matched against.
//!
//! Built-in capabilities (locale, platform, version, stable id) are exposed
//! through small accessor traits rather than a single monolithic struct field
//! set, so a host can hand the evaluator a context with only the capabilities
//! it actually has — a rule referencing a capability the context lacks simply
//! does not match (see `targeting::Targeting::matches`), it never errors.

use crate::axis::AxisId;
use crate::ids::StableId;
use crate::value::Value;
use crate::version::Version;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LocaleId(String);

impl LocaleId {
    pub fn new(tag: impl Into<String>) -> Self {
        LocaleId(tag.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocaleId {
    fn from(s: &str) -> Self {
        LocaleId(s.to_string())
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PlatformId(String);

impl PlatformId {
    pub fn new(name: impl Into<String>) -> Self {
        PlatformId(name.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlatformId {
    fn from(s: &str) -> Self {
        PlatformId(s.to_string())
    }
}

pub trait HasLocale {
    fn locale(&self) -> Option<&LocaleId>;
}

pub trait HasPlatform {
    fn platform(&self) -> Option<&PlatformId>;
}

pub trait HasVersion {
    fn version(&self) -> Option<&Version>;
}

pub trait HasStableId {
    fn stable_id(&self) -> Option<&StableId>;
}

/// The default, general-purpose context implementation: optional built-in
/// capabilities plus an open-ended map of axis values.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Context {
    locale: Option<LocaleId>,
    platform: Option<PlatformId>,
    version: Option<Version>,
    stable_id: Option<StableId>,
    axes: BTreeMap<AxisId, Vec<Value>>,
}

impl Context {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// The set of tags a context carries for `id`, or `&[]` if the context
    /// never set a value on that axis — treated as non-match, not an error.
    pub fn axis_values(&self, id: &AxisId) -> &[Value] {
        self.axes.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl HasLocale for Context {
    fn locale(&self) -> Option<&LocaleId> {
        self.locale.as_ref()
    }
}

impl HasPlatform for Context {
    fn platform(&self) -> Option<&PlatformId> {
        self.platform.as_ref()
    }
}

impl HasVersion for Context {
    fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }
}

impl HasStableId for Context {
    fn stable_id(&self) -> Option<&StableId> {
        self.stable_id.as_ref()
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    inner: Context,
}

impl ContextBuilder {
    pub fn locale(mut self, locale: impl Into<LocaleId>) -> Self {
        self.inner.locale = Some(locale.into());
        self
    }

    pub fn platform(mut self, platform: impl Into<PlatformId>) -> Self {
        self.inner.platform = Some(platform.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.inner.version = Some(version);
        self
    }

    pub fn stable_id(mut self, id: StableId) -> Self {
        self.inner.stable_id = Some(id);
        self
    }

    pub fn axis(mut self, id: AxisId, value: Value) -> Self {
        self.inner.axes.insert(id, vec![value]);
        self
    }

    pub fn axis_values(mut self, id: AxisId, values: Vec<Value>) -> Self {
        self.inner.axes.insert(id, values);
        self
    }

    pub fn build(self) -> Context {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_roundtrips_capabilities() {
        let ctx = Context::builder()
            .locale("en-US")
            .platform("ios")
            .version(Version::new(1, 2, 3))
            .stable_id(StableId::from_raw("user-42").unwrap())
            .build();
        assert_eq!(ctx.locale().unwrap().as_str(), "en-US");
        assert_eq!(ctx.platform().unwrap().as_str(), "ios");
        assert_eq!(ctx.version().unwrap(), &Version::new(1, 2, 3));
        assert_eq!(ctx.stable_id().unwrap().raw(), "user-42");
    }

    #[test]
    fn absent_capabilities_are_none() {
        let ctx = Context::default();
        assert!(ctx.locale().is_none());
        assert!(ctx.platform().is_none());
        assert!(ctx.version().is_none());
        assert!(ctx.stable_id().is_none());
    }

    #[test]
    fn axis_values_are_keyed_by_axis_id() {
        let ctx = Context::builder().axis(AxisId::from("tenant_tier"), Value::Enum("gold".into())).build();
        assert_eq!(ctx.axis_values(&AxisId::from("tenant_tier")), &[Value::Enum("gold".to_string())]);
        assert_eq!(ctx.axis_values(&AxisId::from("other")), &[] as &[Value]);
    }
}
