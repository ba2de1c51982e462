//! Parses untrusted JSON into a validated [`ConfigurationView`] and
//! serializes one back losslessly.

use std::collections::{BTreeMap, BTreeSet};

use ff_core::flagdef::{ConfigurationView, FlagDefinition, Metadata};
use ff_core::ids::{FeatureId, HexId};
use ff_core::rampup::RampUp;
use ff_core::targeting::{Rule, Targeting};
use ff_core::value::Value;
use ff_core::version::{Version, VersionRange};
use serde::Deserialize;
use serde_json::Value as Json;

use crate::value_codec::ObjectSchema;
use crate::{ParseError, SnapshotWarning};

/// How to handle a wire feature key this namespace never declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFeatureKeyStrategy {
    /// Fail the whole load with `InvalidSnapshot` (default: strict).
    #[default]
    Fail,
    /// Drop the feature, record a [`SnapshotWarning`], and load the rest.
    Skip,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub unknown_feature_key_strategy: UnknownFeatureKeyStrategy,
}

/// What a feature's declared value is shaped like, used to decode its
/// `default` and every rule `value` against the right branch of [`Value`].
#[derive(Debug, Clone)]
pub enum FlagTypeHint {
    Bool,
    Int,
    Float,
    Str,
    Enum,
    Object(ObjectSchema),
}

/// The result of a successful `load_snapshot` call: the built view plus any
/// warnings accumulated under [`UnknownFeatureKeyStrategy::Skip`].
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub view: ConfigurationView,
    pub warnings: Vec<SnapshotWarning>,
}

pub fn load_snapshot(
    json_text: &str,
    namespace_id: &str,
    declared_features: &BTreeMap<String, FlagTypeHint>,
    options: LoadOptions,
) -> Result<Snapshot, ParseError> {
    let wire: SnapshotWire = serde_json::from_str(json_text)?;
    if wire.namespace_id != namespace_id {
        return Err(ParseError::InvalidSnapshot(format!(
            "namespace mismatch: snapshot is for '{}', loader is for '{namespace_id}'",
            wire.namespace_id
        )));
    }

    let mut flags = BTreeMap::new();
    let mut warnings = Vec::new();

    for flag_wire in wire.flags {
        let key = flag_wire.key.name.clone();
        let Some(hint) = declared_features.get(&key) else {
            match options.unknown_feature_key_strategy {
                UnknownFeatureKeyStrategy::Fail => {
                    return Err(ParseError::InvalidSnapshot(format!("unknown feature key '{key}'")));
                }
                UnknownFeatureKeyStrategy::Skip => {
                    tracing::warn!(feature = %key, namespace = %namespace_id, "unknown feature key in snapshot; dropped");
                    warnings.push(SnapshotWarning {
                        feature: key.clone(),
                        message: "feature is not declared in this namespace; dropped".into(),
                    });
                    continue;
                }
            }
        };

        let feature_id = FeatureId::new(flag_wire.key.namespace.clone(), key.clone());
        let default = decode_typed_value(hint, &flag_wire.default)?;
        let mut rules = Vec::with_capacity(flag_wire.rules.len());
        for rule_wire in flag_wire.rules {
            rules.push(decode_rule(hint, rule_wire)?);
        }

        let mut def = FlagDefinition::new(feature_id, default).with_rules(rules);
        def.is_active = flag_wire.is_active;
        flags.insert(def.feature.clone(), def);
    }

    let metadata = Metadata {
        version: wire.version,
        generated_at_millis: wire.generated_at_epoch_millis,
        source: wire.source,
    };

    Ok(Snapshot { view: ConfigurationView::new(flags, metadata), warnings })
}

fn decode_rule(hint: &FlagTypeHint, wire: RuleWire) -> Result<Rule<Value>, ParseError> {
    let value = decode_typed_value(hint, &wire.value)?;
    let ramp_up = RampUp::new(wire.ramp_up)?;

    let allowlist = wire
        .ramp_up_allowlist
        .iter()
        .map(|s| s.parse::<HexId>().map_err(|_| ParseError::InvalidHexId(s.clone())))
        .collect::<Result<BTreeSet<_>, _>>()?;

    let mut leaves = Vec::new();
    if !wire.locales.is_empty() {
        leaves.push(Targeting::Locale(wire.locales.iter().map(|s| s.as_str().into()).collect()));
    }
    if !wire.platforms.is_empty() {
        leaves.push(Targeting::Platform(wire.platforms.iter().map(|s| s.as_str().into()).collect()));
    }
    let range = decode_version_range(&wire.version_range)?;
    if !matches!(range, VersionRange::Unbounded) {
        leaves.push(Targeting::VersionInRange(range));
    }
    for (axis_id, tags) in &wire.axes {
        leaves.push(Targeting::Axis(axis_id.as_str().into(), tags.iter().cloned().collect()));
    }

    let mut rule = Rule::new(Targeting::All(leaves), value).with_ramp_up(ramp_up).with_allowlist(allowlist);
    if let Some(note) = wire.note {
        rule = rule.with_note(note);
    }
    Ok(rule)
}

fn decode_version_range(wire: &VersionRangeWire) -> Result<VersionRange, ParseError> {
    let parse = |s: &str| -> Result<Version, ParseError> {
        s.parse::<Version>().map_err(|_| ParseError::InvalidVersion(s.to_string()))
    };
    Ok(match wire {
        VersionRangeWire::Unbounded => VersionRange::Unbounded,
        VersionRangeWire::LeftBound { min } => VersionRange::LeftBound { min: parse(min)? },
        VersionRangeWire::RightBound { max } => VersionRange::RightBound { max: parse(max)? },
        VersionRangeWire::FullyBound { min, max } => {
            VersionRange::FullyBound { min: parse(min)?, max: parse(max)? }
        }
    })
}

fn decode_typed_value(hint: &FlagTypeHint, json: &Json) -> Result<Value, ParseError> {
    match (hint, json) {
        (FlagTypeHint::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
        (FlagTypeHint::Int, Json::Number(n)) => {
            n.as_i64().map(Value::Int).ok_or_else(|| ParseError::InvalidSnapshot("expected an integer".into()))
        }
        (FlagTypeHint::Float, Json::Number(n)) => {
            n.as_f64().map(Value::Float).ok_or_else(|| ParseError::InvalidSnapshot("expected a number".into()))
        }
        (FlagTypeHint::Str, Json::String(s)) => Ok(Value::Str(s.clone())),
        (FlagTypeHint::Enum, Json::String(s)) => Ok(Value::Enum(s.clone())),
        (FlagTypeHint::Object(schema), obj @ Json::Object(_)) => schema.decode(obj),
        _ => Err(ParseError::InvalidSnapshot("value does not match the feature's declared type".into())),
    }
}

/// Serializes a loaded view back to the wire shape. Only supports rules whose
/// targeting tree is the flat `All([...])` leaf shape `load_snapshot`
/// produces; a rule built in-process with `Any`/`Custom` targeting cannot
/// round-trip through the wire format and encoding it fails loudly.
pub fn to_snapshot_value(
    view: &ConfigurationView,
    namespace_id: &str,
    declared_features: &BTreeMap<String, FlagTypeHint>,
) -> Result<Json, ParseError> {
    let mut flags = Vec::with_capacity(view.flags.len());
    for def in view.flags.values() {
        let hint = declared_features
            .get(&def.feature.key)
            .ok_or_else(|| ParseError::FeatureNotFound(def.feature.key.clone()))?;
        flags.push(encode_flag(def, hint)?);
    }

    Ok(serde_json::json!({
        "namespaceId": namespace_id,
        "version": view.metadata.version,
        "generatedAtEpochMillis": view.metadata.generated_at_millis,
        "source": view.metadata.source,
        "flags": flags,
    }))
}

fn encode_flag(def: &FlagDefinition, hint: &FlagTypeHint) -> Result<Json, ParseError> {
    let mut rules = Vec::with_capacity(def.rules.len());
    for rule in &def.rules {
        rules.push(encode_rule(rule, hint)?);
    }
    Ok(serde_json::json!({
        "key": { "namespace": def.feature.namespace, "name": def.feature.key },
        "isActive": def.is_active,
        "default": encode_typed_value(hint, &def.default)?,
        "rules": rules,
    }))
}

fn encode_rule(rule: &Rule<Value>, hint: &FlagTypeHint) -> Result<Json, ParseError> {
    let Targeting::All(leaves) = &rule.targeting else {
        return Err(ParseError::InvalidSnapshot("only flat All(...) targeting round-trips to the wire format".into()));
    };

    let mut locales: Vec<String> = Vec::new();
    let mut platforms: Vec<String> = Vec::new();
    let mut version_range = VersionRangeWire::Unbounded;
    let mut axes: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for leaf in leaves {
        match leaf {
            Targeting::Locale(set) => locales.extend(set.iter().map(|l| l.as_str().to_string())),
            Targeting::Platform(set) => platforms.extend(set.iter().map(|p| p.as_str().to_string())),
            Targeting::VersionInRange(range) => version_range = encode_version_range(range),
            Targeting::Axis(id, tags) => {
                axes.insert(id.as_str().to_string(), tags.iter().cloned().collect());
            }
            Targeting::Custom(_) | Targeting::All(_) | Targeting::Any(_) => {
                return Err(ParseError::InvalidSnapshot(
                    "Custom/nested targeting has no wire representation".into(),
                ));
            }
        }
    }

    Ok(serde_json::json!({
        "value": encode_typed_value(hint, &rule.value)?,
        "rampUp": rule.ramp_up.value(),
        "rampUpAllowlist": rule.allowlist.iter().map(|h| h.as_str().to_string()).collect::<Vec<_>>(),
        "locales": locales,
        "platforms": platforms,
        "versionRange": version_range,
        "axes": axes,
        "note": rule.note,
    }))
}

fn encode_version_range(range: &VersionRange) -> VersionRangeWire {
    match range {
        VersionRange::Unbounded => VersionRangeWire::Unbounded,
        VersionRange::LeftBound { min } => VersionRangeWire::LeftBound { min: min.to_string() },
        VersionRange::RightBound { max } => VersionRangeWire::RightBound { max: max.to_string() },
        VersionRange::FullyBound { min, max } => {
            VersionRangeWire::FullyBound { min: min.to_string(), max: max.to_string() }
        }
    }
}

fn encode_typed_value(hint: &FlagTypeHint, value: &Value) -> Result<Json, ParseError> {
    Ok(match (hint, value) {
        (FlagTypeHint::Bool, Value::Bool(b)) => Json::Bool(*b),
        (FlagTypeHint::Int, Value::Int(n)) => Json::Number((*n).into()),
        (FlagTypeHint::Float, Value::Float(f)) => {
            serde_json::Number::from_f64(*f).map(Json::Number).unwrap_or(Json::Null)
        }
        (FlagTypeHint::Str, Value::Str(s)) => Json::String(s.clone()),
        (FlagTypeHint::Enum, Value::Enum(s)) => Json::String(s.clone()),
        (FlagTypeHint::Object(schema), obj @ Value::Object(_)) => schema.encode(obj)?,
        _ => return Err(ParseError::InvalidSnapshot("value does not match the feature's declared type".into())),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotWire {
    namespace_id: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    generated_at_epoch_millis: Option<u64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    flags: Vec<FlagWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlagWire {
    key: FeatureKeyWire,
    #[serde(default = "default_true")]
    is_active: bool,
    default: Json,
    #[serde(default)]
    rules: Vec<RuleWire>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct FeatureKeyWire {
    namespace: String,
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuleWire {
    value: Json,
    #[serde(default = "default_rampup")]
    ramp_up: f64,
    #[serde(default)]
    ramp_up_allowlist: Vec<String>,
    #[serde(default)]
    locales: Vec<String>,
    #[serde(default)]
    platforms: Vec<String>,
    #[serde(default)]
    version_range: VersionRangeWire,
    #[serde(default)]
    axes: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    note: Option<String>,
}

fn default_rampup() -> f64 {
    100.0
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
#[serde(tag = "type")]
enum VersionRangeWire {
    #[serde(rename = "UNBOUNDED")]
    Unbounded,
    #[serde(rename = "LEFT_BOUND")]
    LeftBound { min: String },
    #[serde(rename = "RIGHT_BOUND")]
    RightBound { max: String },
    #[serde(rename = "FULLY_BOUND")]
    FullyBound { min: String, max: String },
}

impl Default for VersionRangeWire {
    fn default() -> Self {
        VersionRangeWire::Unbounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;

    fn features() -> BTreeMap<String, FlagTypeHint> {
        BTreeMap::from([("new_ranking".to_string(), FlagTypeHint::Bool)])
    }

    #[test]
    fn loads_a_minimal_snapshot() {
        let json = r#"{
            "namespaceId": "search",
            "flags": [
                { "key": {"namespace":"search","name":"new_ranking"}, "isActive": true, "default": false, "rules": [] }
            ]
        }"#;
        let snapshot = load_snapshot(json, "search", &features(), LoadOptions::default()).unwrap();
        assert!(snapshot.warnings.is_empty());
        let def = snapshot.view.get(&FeatureId::new("search", "new_ranking")).unwrap();
        assert_eq!(def.default, Value::Bool(false));
        assert!(def.is_active);
    }

    #[test]
    fn namespace_mismatch_fails() {
        let json = r#"{ "namespaceId": "other", "flags": [] }"#;
        let err = load_snapshot(json, "search", &features(), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidSnapshot(_)));
    }

    #[test]
    fn unknown_feature_fails_by_default() {
        let json = r#"{
            "namespaceId": "search",
            "flags": [
                { "key": {"namespace":"search","name":"mystery"}, "isActive": true, "default": false, "rules": [] }
            ]
        }"#;
        let err = load_snapshot(json, "search", &features(), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidSnapshot(_)));
    }

    #[test]
    fn unknown_feature_is_skipped_with_warning_under_skip_strategy() {
        let json = r#"{
            "namespaceId": "search",
            "flags": [
                { "key": {"namespace":"search","name":"mystery"}, "isActive": true, "default": false, "rules": [] }
            ]
        }"#;
        let options = LoadOptions { unknown_feature_key_strategy: UnknownFeatureKeyStrategy::Skip };
        let snapshot = load_snapshot(json, "search", &features(), options).unwrap();
        assert_eq!(snapshot.warnings.len(), 1);
        assert!(snapshot.view.flags.is_empty());
    }

    #[test]
    fn rule_with_locale_and_rampup_decodes() {
        let json = r#"{
            "namespaceId": "search",
            "flags": [
                { "key": {"namespace":"search","name":"new_ranking"}, "isActive": true, "default": false,
                  "rules": [
                    { "value": true, "rampUp": 50.0, "rampUpAllowlist": [], "locales": ["en-US"], "platforms": [],
                      "versionRange": { "type": "UNBOUNDED" }, "axes": {}, "note": "ramping" }
                  ] }
            ]
        }"#;
        let snapshot = load_snapshot(json, "search", &features(), LoadOptions::default()).unwrap();
        let def = snapshot.view.get(&FeatureId::new("search", "new_ranking")).unwrap();
        assert_eq!(def.rules.len(), 1);
        assert_eq!(def.rules[0].value, Value::Bool(true));
        assert_eq!(def.rules[0].ramp_up.value(), 50.0);
        assert_eq!(def.rules[0].note.as_deref(), Some("ramping"));
    }

    #[test]
    fn roundtrips_through_encode_and_decode() {
        let json = r#"{
            "namespaceId": "search",
            "version": "v1",
            "flags": [
                { "key": {"namespace":"search","name":"new_ranking"}, "isActive": true, "default": false,
                  "rules": [
                    { "value": true, "rampUp": 100.0, "rampUpAllowlist": [], "locales": ["en-US"], "platforms": [],
                      "versionRange": { "type": "UNBOUNDED" }, "axes": {} }
                  ] }
            ]
        }"#;
        let snapshot = load_snapshot(json, "search", &features(), LoadOptions::default()).unwrap();
        let encoded = to_snapshot_value(&snapshot.view, "search", &features()).unwrap();
        let redecoded =
            load_snapshot(&encoded.to_string(), "search", &features(), LoadOptions::default()).unwrap();
        assert_eq!(snapshot.view, redecoded.view);

        let reencoded = to_snapshot_value(&redecoded.view, "search", &features()).unwrap();
        assert_json_eq!(encoded, reencoded);
    }

    #[test]
    fn wrong_type_value_fails() {
        let json = r#"{
            "namespaceId": "search",
            "flags": [
                { "key": {"namespace":"search","name":"new_ranking"}, "isActive": true, "default": "not-a-bool", "rules": [] }
            ]
        }"#;
        assert!(load_snapshot(json, "search", &features(), LoadOptions::default()).is_err());
    }
}
