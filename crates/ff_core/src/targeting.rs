//! The targeting predicate tree, specificity, and rules.

use crate::axis::AxisId;
use crate::context::{Context, HasLocale, HasPlatform, HasStableId, HasVersion, LocaleId, PlatformId};
use crate::ids::HexId;
use crate::value::Value;
use crate::version::VersionRange;
use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

/// A host-supplied predicate registered under a stable identifier, so decision
/// traces can name the predicate class without capturing the closure in the
/// snapshot itself.
///
/// `catch_unwind` isolation around invocation lives in `ff_algo`/`ff_registry`
/// (this crate is `no_std`-capable and `catch_unwind` requires `std`); here a
/// `Custom` predicate is just a named, weighted function pointer-or-closure.
#[derive(Clone)]
pub struct CustomPredicate {
    pub name: String,
    pub weight: u32,
    pub predicate: Arc<dyn Fn(&Context) -> bool + Send + Sync>,
}

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPredicate").field("name", &self.name).field("weight", &self.weight).finish()
    }
}

impl PartialEq for CustomPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.weight == other.weight && Arc::ptr_eq(&self.predicate, &other.predicate)
    }
}

/// The recursive predicate tree matched against a [`Context`].
#[derive(Clone, Debug, PartialEq)]
pub enum Targeting {
    Locale(BTreeSet<LocaleId>),
    Platform(BTreeSet<PlatformId>),
    VersionInRange(VersionRange),
    Axis(AxisId, BTreeSet<String>),
    Custom(CustomPredicate),
    All(Vec<Targeting>),
    Any(Vec<Targeting>),
}

impl Targeting {
    /// `matches` never errors: a leaf referencing a capability the context
    /// lacks simply does not match.
    pub fn matches(&self, ctx: &Context) -> bool {
        match self {
            Targeting::Locale(set) => ctx.locale().map(|l| set.contains(l)).unwrap_or(false),
            Targeting::Platform(set) => ctx.platform().map(|p| set.contains(p)).unwrap_or(false),
            Targeting::VersionInRange(range) => ctx.version().map(|v| range.contains(v)).unwrap_or(false),
            Targeting::Axis(axis_id, tags) => ctx
                .axis_values(axis_id)
                .iter()
                .any(|v| tags.iter().any(|tag| axis_tag_matches(v, tag))),
            Targeting::Custom(custom) => (custom.predicate)(ctx),
            Targeting::All(children) => children.iter().all(|c| c.matches(ctx)),
            Targeting::Any(children) => children.iter().any(|c| c.matches(ctx)),
        }
    }

    /// Leaves contribute `1` (or their declared weight for `Custom`); `All`
    /// sums children, `Any` takes the maximum.
    pub fn specificity(&self) -> u32 {
        match self {
            Targeting::Custom(custom) => custom.weight,
            Targeting::Locale(_) | Targeting::Platform(_) | Targeting::VersionInRange(_) | Targeting::Axis(_, _) => 1,
            Targeting::All(children) => children.iter().map(Targeting::specificity).sum(),
            Targeting::Any(children) => children.iter().map(Targeting::specificity).max().unwrap_or(0),
        }
    }
}

fn axis_tag_matches(value: &Value, tag: &str) -> bool {
    match value {
        Value::Str(s) => s == tag,
        Value::Enum(s) => s == tag,
        Value::Bool(b) => tag.parse::<bool>().map(|t| t == *b).unwrap_or(false),
        Value::Int(n) => tag.parse::<i64>().map(|t| t == *n).unwrap_or(false),
        Value::Float(f) => tag.parse::<f64>().map(|t| t == *f).unwrap_or(false),
        Value::Object(_) | Value::List(_) => false,
    }
}

/// A targeting tree plus ramp-up plus allowlist plus note, producing a single
/// typed value on match. The root targeting tree is always treated as a
/// conjunction: a bare list of leaves at rule-declaration time is implicitly
/// wrapped in `All`.
///
/// Not directly `serde`-derivable: `Custom` leaves carry a live closure.
/// `ff_io` defines its own wire representation and reconstructs `Targeting`
/// trees by looking `Custom` predicates up in a host-supplied registry.
#[derive(Clone, Debug, PartialEq)]
pub struct Rule<T> {
    pub ramp_up: crate::rampup::RampUp,
    pub allowlist: BTreeSet<HexId>,
    pub note: Option<String>,
    pub targeting: Targeting,
    pub value: T,
}

impl<T> Rule<T> {
    pub fn new(targeting: Targeting, value: T) -> Self {
        Rule {
            ramp_up: crate::rampup::RampUp::default(),
            allowlist: BTreeSet::new(),
            note: None,
            targeting,
            value,
        }
    }

    pub fn with_ramp_up(mut self, ramp_up: crate::rampup::RampUp) -> Self {
        self.ramp_up = ramp_up;
        self
    }

    pub fn with_allowlist(mut self, allowlist: BTreeSet<HexId>) -> Self {
        self.allowlist = allowlist;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Total specificity: targeting specificity + 1 if ramp-up isn't `100%` +
    /// 1 if the allowlist is non-empty.
    pub fn total_specificity(&self) -> u32 {
        self.targeting.specificity()
            + if self.ramp_up.is_full() { 0 } else { 1 }
            + if self.allowlist.is_empty() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rampup::RampUp;
    use crate::version::Version;
    use alloc::string::ToString;
    use alloc::vec;

    fn ctx_with_locale(locale: &str) -> Context {
        Context::builder().locale(locale).build()
    }

    #[test]
    fn locale_matches_membership() {
        let t = Targeting::Locale(BTreeSet::from([LocaleId::from("en-US"), LocaleId::from("fr-FR")]));
        assert!(t.matches(&ctx_with_locale("en-US")));
        assert!(!t.matches(&ctx_with_locale("de-DE")));
    }

    #[test]
    fn absent_capability_does_not_match() {
        let t = Targeting::Locale(BTreeSet::from([LocaleId::from("en-US")]));
        assert!(!t.matches(&Context::default()));
    }

    #[test]
    fn all_is_conjunction_any_is_disjunction() {
        let ctx = Context::builder().locale("en-US").platform("ios").build();
        let all = Targeting::All(vec![
            Targeting::Locale(BTreeSet::from([LocaleId::from("en-US")])),
            Targeting::Platform(BTreeSet::from([PlatformId::from("ios")])),
        ]);
        assert!(all.matches(&ctx));

        let any = Targeting::Any(vec![
            Targeting::Locale(BTreeSet::from([LocaleId::from("de-DE")])),
            Targeting::Platform(BTreeSet::from([PlatformId::from("ios")])),
        ]);
        assert!(any.matches(&ctx));
    }

    #[test]
    fn specificity_sums_for_all_and_maxes_for_any() {
        let all = Targeting::All(vec![
            Targeting::Locale(BTreeSet::new()),
            Targeting::Platform(BTreeSet::new()),
        ]);
        assert_eq!(all.specificity(), 2);

        let any = Targeting::Any(vec![
            Targeting::Locale(BTreeSet::new()),
            Targeting::Custom(CustomPredicate { name: "x".into(), weight: 5, predicate: Arc::new(|_| true) }),
        ]);
        assert_eq!(any.specificity(), 5);
    }

    #[test]
    fn version_range_leaf_uses_contains() {
        let t = Targeting::VersionInRange(VersionRange::LeftBound { min: Version::new(2, 0, 0) });
        let ctx = Context::builder().version(Version::new(2, 0, 0)).build();
        assert!(t.matches(&ctx));
        let old = Context::builder().version(Version::new(1, 9, 9)).build();
        assert!(!t.matches(&old));
    }

    #[test]
    fn rule_total_specificity_adds_rampup_and_allowlist_contributions() {
        let rule = Rule::new(Targeting::Locale(BTreeSet::from([LocaleId::from("en-US")])), true.to_string())
            .with_ramp_up(RampUp::new(50.0).unwrap())
            .with_allowlist(BTreeSet::from(["deadbeef".parse::<HexId>().unwrap()]));
        assert_eq!(rule.total_specificity(), 1 + 1 + 1);
    }

    #[test]
    fn full_rampup_and_empty_allowlist_contribute_nothing() {
        let rule = Rule::new(Targeting::All(Vec::new()), 1i64);
        assert_eq!(rule.total_specificity(), 0);
    }
}
