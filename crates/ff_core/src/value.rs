//! The type-erased runtime value carried by rules, defaults, and overrides.
//!
//! A [`Feature<T>`](crate::ids::Feature) pins a flag's value type at compile time,
//! but the registry stores heterogeneous flags (bool features next to string
//! features) in one map, so the storage representation has to be closed and
//! dynamically typed. `Value` is that representation; [`FlagType`] is the bridge
//! back to a concrete Rust type at the point a host calls `evaluate::<T>`.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A typed flag value: primitive, enum-tag, or a recursive custom object.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A named enum variant (wire form: the declared variant name as a string).
    ///
    /// Declared ahead of `Str` so that `#[serde(untagged)]` resolves a bare
    /// JSON string to `Enum` first: the two variants are structurally
    /// identical wire shapes, so only one is reachable via this derive, and
    /// hosts that need the other should decode through `ff_io`'s explicit
    /// type-hinted codec instead of round-tripping `Value` directly.
    Enum(String),
    Str(String),
    /// A custom object value, decoded against a per-feature schema (see `ff_io`).
    Object(BTreeMap<String, Value>),
    List(Vec<Value>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Enum(_) => "enum",
            Value::Object(_) => "object",
            Value::List(_) => "list",
        }
    }
}

/// A feature's declared value type: how to round-trip between `T` and [`Value`].
///
/// Implemented for the primitive types out of the box; custom object types
/// implement it by hand (typically generated from the schema described in
/// `ff_io::value_codec`).
pub trait FlagType: Sized + Clone + PartialEq {
    fn to_value(&self) -> Value;
    fn from_value(v: &Value) -> Option<Self>;
    fn type_name() -> &'static str;
}

impl FlagType for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
    fn type_name() -> &'static str {
        "bool"
    }
}

impl FlagType for i64 {
    fn to_value(&self) -> Value {
        Value::Int(*self)
    }
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
    fn type_name() -> &'static str {
        "int"
    }
}

impl FlagType for f64 {
    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            _ => None,
        }
    }
    fn type_name() -> &'static str {
        "float"
    }
}

impl FlagType for String {
    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }
    fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
    fn type_name() -> &'static str {
        "string"
    }
}

/// Helper for simple string-backed enums: implement `variant_name`/`from_variant_name`
/// on the host enum, then derive the `FlagType` impl with [`impl_enum_flag`] rather
/// than hand-rolling `to_value`/`from_value`.
///
/// (A blanket `impl<E: EnumFlag> FlagType for E` would be more convenient, but it
/// would conflict with the primitive impls above under Rust's coherence rules — a
/// downstream type could in principle implement both traits. The macro sidesteps
/// that by generating a concrete, non-blanket impl per enum.)
pub trait EnumFlag: Sized + Clone + PartialEq {
    fn variant_name(&self) -> &str;
    fn from_variant_name(name: &str) -> Option<Self>;
}

/// Derives `FlagType` for a type that already implements [`EnumFlag`].
#[macro_export]
macro_rules! impl_enum_flag {
    ($ty:ty) => {
        impl $crate::value::FlagType for $ty {
            fn to_value(&self) -> $crate::value::Value {
                $crate::value::Value::Enum($crate::value::EnumFlag::variant_name(self).into())
            }
            fn from_value(v: &$crate::value::Value) -> Option<Self> {
                match v {
                    $crate::value::Value::Enum(name) => {
                        <$ty as $crate::value::EnumFlag>::from_variant_name(name)
                    }
                    _ => None,
                }
            }
            fn type_name() -> &'static str {
                "enum"
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_roundtrip() {
        assert_eq!(bool::from_value(&true.to_value()), Some(true));
        assert_eq!(i64::from_value(&42i64.to_value()), Some(42));
        assert_eq!(f64::from_value(&Value::Int(3)), Some(3.0));
        assert_eq!(String::from_value(&"x".to_string().to_value()), Some("x".to_string()));
    }

    #[test]
    fn cross_type_decode_fails() {
        assert_eq!(bool::from_value(&Value::Int(1)), None);
        assert_eq!(String::from_value(&Value::Bool(true)), None);
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Ranking {
        Control,
        Treatment,
    }

    impl EnumFlag for Ranking {
        fn variant_name(&self) -> &str {
            match self {
                Ranking::Control => "control",
                Ranking::Treatment => "treatment",
            }
        }
        fn from_variant_name(name: &str) -> Option<Self> {
            match name {
                "control" => Some(Ranking::Control),
                "treatment" => Some(Ranking::Treatment),
                _ => None,
            }
        }
    }

    crate::impl_enum_flag!(Ranking);

    #[test]
    fn enum_flag_roundtrip() {
        let v = Ranking::Treatment.to_value();
        assert_eq!(v, Value::Enum("treatment".to_string()));
        assert_eq!(Ranking::from_value(&v), Some(Ranking::Treatment));
        assert_eq!(Ranking::from_value(&Value::Bool(true)), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn untagged_json_string_decodes_to_enum_not_str() {
        let decoded: Value = serde_json::from_str("\"treatment\"").unwrap();
        assert_eq!(decoded, Value::Enum("treatment".to_string()));
    }
}
