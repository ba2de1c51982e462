//! The evaluation hot path: produces an `EvaluationResult<T>` for a
//! `(feature, context)` pair against a registry's current view.

use std::time::Instant;

use ff_algo::{select_rule, stable_bucket, SelectionOutcome};
use ff_core::context::{Context, HasStableId};
use ff_core::ids::Feature;
use ff_core::value::FlagType;
use thiserror::Error;

use crate::hooks::{DecisionKind, Evaluation, EvaluationMode};
use crate::registry::NamespaceRegistry;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("flag not found: {0}")]
    FlagNotFound(ff_core::ids::FeatureId),
}

/// Which branch of evaluation produced the value, mirroring [`DecisionKind`]
/// plus the data each branch carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    RegistryDisabled,
    Inactive,
    Rule { synthetic_override: bool, specificity: Option<u32> },
    Default { skipped_by_rollout: bool },
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Decision::RegistryDisabled => DecisionKind::RegistryDisabled,
            Decision::Inactive => DecisionKind::Inactive,
            Decision::Rule { .. } => DecisionKind::Rule,
            Decision::Default { .. } => DecisionKind::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult<T> {
    pub value: T,
    pub decision: Decision,
    pub duration: std::time::Duration,
    pub config_version: Option<String>,
    pub bucket: Option<u32>,
    pub mode: EvaluationMode,
}

/// Evaluates `feature` against `ctx` using `registry`'s current view.
///
/// Never panics on a malformed rule value: a `Value` that fails to decode
/// against `T` (which `ff_io`'s load-time validation should have already
/// ruled out) falls back to the feature's declared default rather than
/// surfacing an error, consistent with "inside a successful evaluation, no
/// errors are produced."
pub fn evaluate<T: FlagType>(
    registry: &NamespaceRegistry,
    feature: &Feature<T>,
    ctx: &Context,
) -> Result<EvaluationResult<T>, EvaluationError> {
    evaluate_with_mode(registry, feature, ctx, EvaluationMode::Normal)
}

/// Evaluates `feature` against `ctx` in diagnostic mode: the returned
/// `EvaluationResult` and the recorded `Evaluation` metric both carry
/// `EvaluationMode::Explain` instead of `Normal`, so a host can distinguish
/// an operator's ad hoc "why did I get this value" lookup from ordinary
/// traffic in its metrics backend.
pub fn evaluate_explain<T: FlagType>(
    registry: &NamespaceRegistry,
    feature: &Feature<T>,
    ctx: &Context,
) -> Result<EvaluationResult<T>, EvaluationError> {
    evaluate_with_mode(registry, feature, ctx, EvaluationMode::Explain)
}

fn evaluate_with_mode<T: FlagType>(
    registry: &NamespaceRegistry,
    feature: &Feature<T>,
    ctx: &Context,
    mode: EvaluationMode,
) -> Result<EvaluationResult<T>, EvaluationError> {
    let start = Instant::now();

    if !registry.is_enabled() {
        let result = EvaluationResult {
            value: feature.default().clone(),
            decision: Decision::RegistryDisabled,
            duration: start.elapsed(),
            config_version: None,
            bucket: None,
            mode,
        };
        record(registry, feature, &mode, &result);
        return Ok(result);
    }

    let def = registry
        .find_flag(feature.id())
        .ok_or_else(|| EvaluationError::FlagNotFound(feature.id().clone()))?;
    let config_version = registry.current_view().metadata.version.clone();

    if let Some(overridden) = &def.r#override {
        let value = T::from_value(overridden).unwrap_or_else(|| feature.default().clone());
        let result = EvaluationResult {
            value,
            decision: Decision::Rule { synthetic_override: true, specificity: None },
            duration: start.elapsed(),
            config_version,
            bucket: None,
            mode,
        };
        record(registry, feature, &mode, &result);
        return Ok(result);
    }

    if !def.is_active {
        let result = EvaluationResult {
            value: feature.default().clone(),
            decision: Decision::Inactive,
            duration: start.elapsed(),
            config_version,
            bucket: None,
            mode,
        };
        record(registry, feature, &mode, &result);
        return Ok(result);
    }

    let feature_key = &feature.id().key;
    let stable_id = ctx.stable_id();
    let bucket = stable_bucket(feature_key, feature_key, stable_id);

    let outcome = select_rule(&def.rules, ctx, stable_id, feature_key, |index| {
        registry.with_hooks(|hooks| {
            hooks.logger.warn(
                &|| format!("Custom targeting predicate panicked for rule #{index} on '{feature_key}'"),
                Some("panicked during Targeting::Custom evaluation"),
            );
        });
    });

    let (value, decision) = match outcome {
        SelectionOutcome::Matched { rule, .. } => {
            let value = T::from_value(&rule.value).unwrap_or_else(|| feature.default().clone());
            (value, Decision::Rule { synthetic_override: false, specificity: Some(rule.total_specificity()) })
        }
        SelectionOutcome::SkippedByRollout { .. } => {
            (feature.default().clone(), Decision::Default { skipped_by_rollout: true })
        }
        SelectionOutcome::NoMatch => (feature.default().clone(), Decision::Default { skipped_by_rollout: false }),
    };

    let result =
        EvaluationResult { value, decision, duration: start.elapsed(), config_version, bucket: Some(bucket), mode };
    record(registry, feature, &mode, &result);
    Ok(result)
}

fn record<T>(registry: &NamespaceRegistry, feature: &Feature<T>, mode: &EvaluationMode, result: &EvaluationResult<T>)
where
    T: FlagType,
{
    registry.with_hooks(|hooks| {
        hooks.metrics.record_evaluation(&Evaluation {
            namespace_id: registry.namespace_id().to_string(),
            feature_key: feature.id().key.clone(),
            mode: *mode,
            duration: result.duration,
            decision_kind: result.decision.kind(),
            config_version: result.config_version.clone(),
            bucket: result.bucket,
            matched_rule_specificity: match &result.decision {
                Decision::Rule { specificity, .. } => *specificity,
                _ => None,
            },
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ff_core::flagdef::{ConfigurationView, FlagDefinition, Metadata};
    use ff_core::ids::FeatureId;
    use ff_core::rampup::RampUp;
    use ff_core::targeting::{Rule, Targeting};
    use ff_core::value::Value;
    use std::collections::BTreeMap;

    fn feature() -> Feature<bool> {
        Feature::new(FeatureId::new("search", "new_ranking"), false)
    }

    fn registry_with(def: FlagDefinition) -> NamespaceRegistry {
        let reg = NamespaceRegistry::new("search");
        reg.register_feature(def.feature.clone());
        let mut flags = BTreeMap::new();
        flags.insert(def.feature.clone(), def);
        reg.load(ConfigurationView::new(flags, Metadata::default())).unwrap();
        reg
    }

    #[test]
    fn disabled_registry_returns_default_with_registry_disabled_decision() {
        let reg = registry_with(FlagDefinition::new(feature().id().clone(), Value::Bool(false)));
        reg.disable_all();
        let result = evaluate(&reg, &feature(), &Context::default()).unwrap();
        assert_eq!(result.value, false);
        assert_eq!(result.decision, Decision::RegistryDisabled);
    }

    #[test]
    fn inactive_flag_returns_default_with_inactive_decision() {
        let def = FlagDefinition::new(feature().id().clone(), Value::Bool(false)).inactive();
        let reg = registry_with(def);
        let result = evaluate(&reg, &feature(), &Context::default()).unwrap();
        assert_eq!(result.decision, Decision::Inactive);
    }

    #[test]
    fn override_wins_with_synthetic_rule_decision() {
        let def = FlagDefinition::new(feature().id().clone(), Value::Bool(false));
        let reg = registry_with(def);
        reg.set_override(feature().id().clone(), Value::Bool(true));
        let result = evaluate(&reg, &feature(), &Context::default()).unwrap();
        assert_eq!(result.value, true);
        assert!(matches!(result.decision, Decision::Rule { synthetic_override: true, .. }));
    }

    #[test]
    fn matching_rule_wins_over_default() {
        let rule = Rule::new(Targeting::All(vec![]), Value::Bool(true)).with_ramp_up(RampUp::FULL);
        let def = FlagDefinition::new(feature().id().clone(), Value::Bool(false)).with_rules(vec![rule]);
        let reg = registry_with(def);
        let result = evaluate(&reg, &feature(), &Context::default()).unwrap();
        assert_eq!(result.value, true);
        assert!(matches!(result.decision, Decision::Rule { synthetic_override: false, .. }));
    }

    #[test]
    fn no_matching_rule_returns_default() {
        let rule = Rule::new(
            Targeting::Locale(std::collections::BTreeSet::from([ff_core::context::LocaleId::from("de-DE")])),
            Value::Bool(true),
        );
        let def = FlagDefinition::new(feature().id().clone(), Value::Bool(false)).with_rules(vec![rule]);
        let reg = registry_with(def);
        let result = evaluate(&reg, &feature(), &Context::default()).unwrap();
        assert_eq!(result.value, false);
        assert_eq!(result.decision, Decision::Default { skipped_by_rollout: false });
    }

    #[test]
    fn unknown_feature_surfaces_as_flag_not_found() {
        let reg = NamespaceRegistry::new("search");
        let err = evaluate(&reg, &feature(), &Context::default()).unwrap_err();
        assert_eq!(err, EvaluationError::FlagNotFound(feature().id().clone()));
    }

    #[test]
    fn evaluate_stamps_normal_mode_and_evaluate_explain_stamps_explain_mode() {
        let reg = registry_with(FlagDefinition::new(feature().id().clone(), Value::Bool(false)));
        let normal = evaluate(&reg, &feature(), &Context::default()).unwrap();
        assert_eq!(normal.mode, EvaluationMode::Normal);
        let explained = evaluate_explain(&reg, &feature(), &Context::default()).unwrap();
        assert_eq!(explained.mode, EvaluationMode::Explain);
    }
}
