//! Rule selection: filter by targeting match, order by specificity, then
//! resolve each candidate's allowlist/ramp-up gate in order until one wins.

use ff_core::ids::StableId;
use ff_core::rampup::RampUp;
use ff_core::targeting::{Rule, Targeting};

use crate::bucketing::{is_in_rampup, stable_bucket};

/// A rule plus its declaration index, as handed to [`select_rule`].
pub struct Candidate<'a, T> {
    pub index: usize,
    pub rule: &'a Rule<T>,
}

pub enum SelectionOutcome<'a, T> {
    /// A rule matched, passed its allowlist/ramp-up gate, and won the tie-break.
    Matched { rule: &'a Rule<T>, index: usize },
    /// At least one rule's targeting matched, but every one was excluded by
    /// its ramp-up gate. Carries the last such rule's index.
    SkippedByRollout { last_index: usize },
    /// No rule's targeting matched at all.
    NoMatch,
}

/// A `Targeting::Custom` predicate that panics is treated as a non-match for
/// that rule, not a fatal evaluation error — matches the "errors are values,
/// not exceptions" propagation policy for everything *inside* evaluation.
///
/// Returns `None` (meaning: panicked, and the caller should log it) instead of
/// `Some(bool)` on unwind so the evaluator layer can attach its own context to
/// the warning.
#[cfg(feature = "std")]
pub fn matches_isolating_panics(targeting: &Targeting, ctx: &ff_core::context::Context) -> Option<bool> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| targeting.matches(ctx))).ok()
}

#[cfg(not(feature = "std"))]
pub fn matches_isolating_panics(targeting: &Targeting, ctx: &ff_core::context::Context) -> Option<bool> {
    Some(targeting.matches(ctx))
}

/// Runs the full rule-selection algorithm:
/// 1. Filter to rules whose targeting matches `ctx` (panicking `Custom`
///    predicates count as non-matches, reported via `on_panic`).
/// 2. Sort matches by total specificity descending, ties by declaration index
///    ascending.
/// 3. Walk candidates in that order; the first whose allowlist/ramp-up gate
///    passes wins. A gated-out candidate is remembered and evaluation moves
///    to the next one.
/// 4. If every matched candidate is gated out, report the last one as
///    `SkippedByRollout`.
pub fn select_rule<'a, T>(
    rules: &'a [Rule<T>],
    ctx: &ff_core::context::Context,
    stable_id: Option<&StableId>,
    feature_key: &str,
    mut on_panic: impl FnMut(usize),
) -> SelectionOutcome<'a, T> {
    let mut candidates: alloc_vec::Vec<Candidate<'a, T>> = alloc_vec::Vec::new();
    for (index, rule) in rules.iter().enumerate() {
        match matches_isolating_panics(&rule.targeting, ctx) {
            Some(true) => candidates.push(Candidate { index, rule }),
            Some(false) => {}
            None => on_panic(index),
        }
    }

    if candidates.is_empty() {
        return SelectionOutcome::NoMatch;
    }

    candidates.sort_by(|a, b| {
        b.rule
            .total_specificity()
            .cmp(&a.rule.total_specificity())
            .then(a.index.cmp(&b.index))
    });

    let mut last_skipped: Option<usize> = None;
    for candidate in &candidates {
        let allowlisted = stable_id.is_some_and(|id| candidate.rule.allowlist.contains(id.hex()));
        if allowlisted {
            return SelectionOutcome::Matched { rule: candidate.rule, index: candidate.index };
        }
        let bucket = stable_bucket(feature_key, feature_key, stable_id);
        if is_in_rampup(candidate.rule.ramp_up, bucket) {
            return SelectionOutcome::Matched { rule: candidate.rule, index: candidate.index };
        }
        last_skipped = Some(candidate.index);
    }

    SelectionOutcome::SkippedByRollout { last_index: last_skipped.expect("candidates is non-empty") }
}

/// Re-export point so this module works identically whether `ff_algo` is
/// built with `std` or as `no_std` + `alloc`.
#[cfg(feature = "std")]
mod alloc_vec {
    pub use std::vec::Vec;
}
#[cfg(not(feature = "std"))]
mod alloc_vec {
    extern crate alloc;
    pub use alloc::vec::Vec;
}
