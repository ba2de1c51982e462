//! The typed-value codec: primitives map directly, enums map to their
//! declared variant name, and custom object values are decoded against a
//! schema that enumerates properties and their types.

use crate::ParseError;
use ff_core::value::Value;
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// The declared type of one property in an [`ObjectSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    Bool,
    Int,
    Float,
    Str,
    Enum,
}

#[derive(Debug, Clone)]
pub struct PropertySchema {
    pub name: String,
    pub value_type: PropertyType,
    pub required: bool,
    pub default: Option<Value>,
}

/// A custom object type's shape: the set of properties a constructor expects,
/// matched against incoming JSON object keys by name.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub properties: Vec<PropertySchema>,
}

impl ObjectSchema {
    pub fn new(properties: Vec<PropertySchema>) -> Self {
        ObjectSchema { properties }
    }

    /// Decodes a JSON object against this schema: a constructor whose
    /// parameter names match the JSON object's keys. Missing optional
    /// properties fall back to their declared default; a missing required
    /// property fails `InvalidSnapshot`.
    pub fn decode(&self, json: &Json) -> Result<Value, ParseError> {
        let obj = json
            .as_object()
            .ok_or_else(|| ParseError::InvalidSnapshot("expected a JSON object for custom value".into()))?;

        let mut out = BTreeMap::new();
        for prop in &self.properties {
            match obj.get(&prop.name) {
                Some(Json::Null) => {
                    return Err(ParseError::InvalidSnapshot(format!(
                        "property '{}' is null but not declared nullable",
                        prop.name
                    )));
                }
                Some(json_value) => {
                    out.insert(prop.name.clone(), decode_scalar(&prop.name, prop.value_type, json_value)?);
                }
                None => {
                    if let Some(default) = &prop.default {
                        out.insert(prop.name.clone(), default.clone());
                    } else if prop.required {
                        return Err(ParseError::InvalidSnapshot(format!(
                            "missing required property '{}'",
                            prop.name
                        )));
                    }
                }
            }
        }
        Ok(Value::Object(out))
    }

    /// Encodes a previously-decoded `Value::Object` back to JSON, losslessly
    /// with respect to `decode` (defaulted-in properties are written out
    /// explicitly, satisfying the round-trip law).
    pub fn encode(&self, value: &Value) -> Result<Json, ParseError> {
        let Value::Object(map) = value else {
            return Err(ParseError::InvalidSnapshot("expected an object value to encode".into()));
        };
        let mut obj = serde_json::Map::new();
        for prop in &self.properties {
            if let Some(v) = map.get(&prop.name) {
                obj.insert(prop.name.clone(), encode_scalar(v));
            }
        }
        Ok(Json::Object(obj))
    }
}

fn decode_scalar(name: &str, ty: PropertyType, json: &Json) -> Result<Value, ParseError> {
    match (ty, json) {
        (PropertyType::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (PropertyType::Int, Json::Number(n)) => n
            .as_i64()
            .map(Value::Int)
            .ok_or_else(|| ParseError::InvalidSnapshot(format!("property '{name}' is not an integer"))),
        (PropertyType::Float, Json::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| ParseError::InvalidSnapshot(format!("property '{name}' is not a number"))),
        (PropertyType::Str, Json::String(s)) => Ok(Value::Str(s.clone())),
        (PropertyType::Enum, Json::String(s)) => Ok(Value::Enum(s.clone())),
        _ => Err(ParseError::InvalidSnapshot(format!("property '{name}' has the wrong JSON type"))),
    }
}

fn encode_scalar(v: &Value) -> Json {
    match v {
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(n) => Json::Number((*n).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null),
        Value::Str(s) => Json::String(s.clone()),
        Value::Enum(s) => Json::String(s.clone()),
        Value::Object(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map {
                obj.insert(k.clone(), encode_scalar(v));
            }
            Json::Object(obj)
        }
        Value::List(items) => Json::Array(items.iter().map(encode_scalar).collect()),
    }
}
