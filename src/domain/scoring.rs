//! Scoring engine: weighted rule evaluation and signal gating.

use crate::domain::profile::{MAX_TOTAL_WEIGHT, ScoringProfile, SignalGate};
use crate::domain::rule::RuleContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    pub score: u32,
    /// Names of the rules that contributed, in profile order.
    pub matched: Vec<String>,
    pub signal: bool,
}

/// Sum the weights of every rule that holds and apply the profile's gate.
pub fn evaluate(profile: &ScoringProfile, ctx: &RuleContext<'_>) -> ScoreCard {
    let mut score = 0u32;
    let mut matched = Vec::new();

    for rule in &profile.rules {
        if rule.predicate.evaluate(ctx) {
            score = score.saturating_add(rule.weight);
            matched.push(rule.name.clone());
        }
    }
    let score = score.min(MAX_TOTAL_WEIGHT);

    let signal = match &profile.gate {
        SignalGate::AllOf(predicates) => predicates.iter().all(|p| p.evaluate(ctx)),
        SignalGate::ScoreAbove { threshold, confirm } => {
            score > *threshold && confirm.evaluate(ctx)
        }
    };

    ScoreCard {
        score,
        matched,
        signal,
    }
}
