//! Flag definitions and the immutable configuration snapshot the registry swaps
//! atomically.
//!
//! Stored type-erased (`Value`, not `T`): a single [`ConfigurationView`] holds
//! every namespace's flags side by side regardless of declared value type, and
//! the generic-to-concrete decode happens at `Evaluator::evaluate::<T>` via
//! [`crate::value::FlagType`].

use crate::ids::FeatureId;
use crate::targeting::Rule;
use crate::value::Value;
use alloc::collections::BTreeMap;
use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A declared flag: its default, its ordered rule list, and whether it is
/// serving at all.
///
/// Invariants (enforced by `ff_io` at load time, not re-checked here): every
/// rule's `value` and `default` share the feature's declared type; `rules` is
/// kept in declaration order, which is also the pre-tie-break evaluation
/// order.
#[derive(Clone, Debug, PartialEq)]
pub struct FlagDefinition {
    pub feature: FeatureId,
    pub default: Value,
    pub rules: alloc::vec::Vec<Rule<Value>>,
    pub is_active: bool,
    pub r#override: Option<Value>,
}

impl FlagDefinition {
    pub fn new(feature: FeatureId, default: Value) -> Self {
        FlagDefinition {
            feature,
            default,
            rules: alloc::vec::Vec::new(),
            is_active: true,
            r#override: None,
        }
    }

    pub fn with_rules(mut self, rules: alloc::vec::Vec<Rule<Value>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Provenance and versioning attached to a loaded snapshot. Every field is
/// optional: a snapshot built programmatically (vs. loaded from a file) may
/// carry none of them.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Metadata {
    pub version: Option<String>,
    pub generated_at_millis: Option<u64>,
    pub source: Option<String>,
}

/// An immutable configuration snapshot. Snapshots are never mutated in place;
/// the registry replaces one with another by atomic pointer swap and never
/// exposes a mutable reference to a live snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigurationView {
    pub flags: BTreeMap<FeatureId, FlagDefinition>,
    pub metadata: Metadata,
}

impl ConfigurationView {
    pub fn new(flags: BTreeMap<FeatureId, FlagDefinition>, metadata: Metadata) -> Self {
        ConfigurationView { flags, metadata }
    }

    pub fn get(&self, feature: &FeatureId) -> Option<&FlagDefinition> {
        self.flags.get(feature)
    }

    pub fn empty() -> Self {
        ConfigurationView::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rampup::RampUp;
    use crate::targeting::Targeting;
    use alloc::vec;

    #[test]
    fn flag_definition_defaults_active_with_no_rules() {
        let def = FlagDefinition::new(FeatureId::new("search", "new_ranking"), Value::Bool(false));
        assert!(def.is_active);
        assert!(def.rules.is_empty());
        assert!(def.r#override.is_none());
    }

    #[test]
    fn configuration_view_looks_up_by_feature_id() {
        let fid = FeatureId::new("search", "new_ranking");
        let def = FlagDefinition::new(fid.clone(), Value::Bool(false))
            .with_rules(vec![Rule::new(Targeting::All(vec![]), Value::Bool(true)).with_ramp_up(RampUp::FULL)]);
        let mut flags = BTreeMap::new();
        flags.insert(fid.clone(), def);
        let view = ConfigurationView::new(flags, Metadata::default());
        assert!(view.get(&fid).is_some());
        assert!(view.get(&FeatureId::new("search", "missing")).is_none());
    }

    #[test]
    fn empty_view_has_no_flags() {
        assert!(ConfigurationView::empty().flags.is_empty());
    }
}
