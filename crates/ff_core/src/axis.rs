//! The axis catalog: host-declared custom targeting dimensions beyond the
//! built-in locale/platform/version capabilities.
//!
//! Axes are registered explicitly (no implicit creation from first use); the
//! same axis name may be registered more than once as long as the declared
//! value type agrees each time, otherwise registration fails with
//! [`CoreError::AxisTypeConflict`].

use crate::errors::CoreError;
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AxisId(String);

impl AxisId {
    pub fn new(name: impl Into<String>) -> Self {
        AxisId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AxisId {
    fn from(s: &str) -> Self {
        AxisId(s.to_string())
    }
}

/// The value type an axis carries. Mirrors [`crate::value::Value`]'s scalar
/// cases; axes never carry `Object`/`List` values.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisValueType {
    Bool,
    Int,
    Float,
    Str,
    Enum,
}

impl AxisValueType {
    pub fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (AxisValueType::Bool, Value::Bool(_))
                | (AxisValueType::Int, Value::Int(_))
                | (AxisValueType::Float, Value::Float(_))
                | (AxisValueType::Str, Value::Str(_))
                | (AxisValueType::Enum, Value::Enum(_))
        )
    }
}

/// Registry of declared axes, keyed by name. Registration is idempotent for a
/// matching type and a hard error on a type change — an axis cannot quietly
/// switch from, say, `Int` to `Str` under rules that already reference it.
#[derive(Clone, Debug, Default)]
pub struct AxisCatalog {
    axes: BTreeMap<AxisId, AxisValueType>,
}

impl AxisCatalog {
    pub fn new() -> Self {
        AxisCatalog { axes: BTreeMap::new() }
    }

    pub fn register(&mut self, id: AxisId, value_type: AxisValueType) -> Result<(), CoreError> {
        match self.axes.get(&id) {
            Some(existing) if *existing == value_type => Ok(()),
            Some(_) => Err(CoreError::AxisTypeConflict),
            None => {
                self.axes.insert(id, value_type);
                Ok(())
            }
        }
    }

    pub fn value_type(&self, id: &AxisId) -> Option<AxisValueType> {
        self.axes.get(id).copied()
    }

    pub fn is_registered(&self, id: &AxisId) -> bool {
        self.axes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_reregistration_is_idempotent() {
        let mut cat = AxisCatalog::new();
        cat.register(AxisId::from("tenant_tier"), AxisValueType::Enum).unwrap();
        cat.register(AxisId::from("tenant_tier"), AxisValueType::Enum).unwrap();
        assert_eq!(cat.len(), 1);
    }

    #[test]
    fn conflicting_type_reregistration_fails() {
        let mut cat = AxisCatalog::new();
        cat.register(AxisId::from("tenant_tier"), AxisValueType::Enum).unwrap();
        let err = cat.register(AxisId::from("tenant_tier"), AxisValueType::Int).unwrap_err();
        assert_eq!(err, CoreError::AxisTypeConflict);
    }

    #[test]
    fn unregistered_axis_has_no_type() {
        let cat = AxisCatalog::new();
        assert!(cat.value_type(&AxisId::from("nope")).is_none());
        assert!(!cat.is_registered(&AxisId::from("nope")));
    }
}
