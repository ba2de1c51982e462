//! Canonical JSON encoding: sorted object keys, preserved array order, no
//! trailing newline. Used to compare snapshots structurally and to produce a
//! digest of a loaded configuration for `configVersion` stamping when the
//! wire snapshot did not supply an explicit `version`.

use serde_json::Value;

/// Serializes `value` with object keys sorted lexicographically at every
/// level. Arrays keep their original order — order is meaningful there (rule
/// declaration order, allowlist entries as authored).
pub fn to_canonical_json_bytes(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical_value(value, &mut out);
    out
}

pub fn to_canonical_json_string(value: &Value) -> String {
    String::from_utf8(to_canonical_json_bytes(value)).expect("serde_json::Value never produces invalid UTF-8")
}

fn write_canonical_value(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) => {
            out.extend_from_slice(value.to_string().as_bytes());
        }
        Value::String(s) => {
            out.extend_from_slice(serde_json::to_string(s).expect("string serialization cannot fail").as_bytes());
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical_value(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(serde_json::to_string(key).expect("string serialization cannot fail").as_bytes());
                out.push(b':');
                write_canonical_value(&map[*key], out);
            }
            out.push(b'}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted() {
        let v = json!({ "b": 1, "a": 2 });
        assert_eq!(to_canonical_json_string(&v), r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn array_order_is_preserved() {
        let v = json!([3, 1, 2]);
        assert_eq!(to_canonical_json_string(&v), "[3,1,2]");
    }

    #[test]
    fn nested_objects_sort_recursively() {
        let v = json!({ "z": { "y": 1, "x": 2 }, "a": 1 });
        assert_eq!(to_canonical_json_string(&v), r#"{"a":1,"z":{"x":2,"y":1}}"#);
    }
}
