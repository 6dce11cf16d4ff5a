//! Decision policy: metrics in, one of APPROVE / REJECT / ESCALATE out.
//!
//! Rules are applied in order and the first match wins:
//!
//! 1. Quality below the flow's bar → REJECT
//! 2. Over budget, or too expensive per quality point → REJECT
//! 3. Risk-adjusted approval ratio and confidence clear their bars (and
//!    no adversarial veto) → APPROVE
//! 4. Ratio at or below the rejection bar, or adversarial veto → REJECT
//! 5. Otherwise → ESCALATE

use crate::config::ConsensusConfiguration;
use crate::metrics::BaseMetrics;
use crate::types::{Decision, DiversityMetrics, EconomicsMetrics, RiskFactors, SubmissionFlow};

/// Adversarial scores above this veto approval outright.
pub const ADVERSARIAL_VETO: f64 = 0.7;

/// Penalty per unit of adversarial score in the approval ratio.
const ADVERSARIAL_PENALTY: f64 = 0.3;

/// Floor for the confidence reported on any non-degenerate result.
const MIN_REPORTED_CONFIDENCE: f64 = 0.1;

/// Which rule produced the decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecisionTrigger {
    QualityBelowThreshold { quality: f64, threshold: f64 },
    BudgetExceeded { total_cost: f64, budget: f64 },
    CostPerQualityExceeded { cost_per_quality: f64, limit: f64 },
    Approved { final_ratio: f64 },
    AdversarialVeto { adversarial: f64 },
    RatioBelowRejection { final_ratio: f64, threshold: f64 },
    Borderline { final_ratio: f64 },
}

/// The policy's verdict plus the intermediate values behind it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyOutcome {
    pub decision: Decision,
    pub confidence: f64,
    pub trigger: DecisionTrigger,
    pub final_approval_ratio: f64,
    pub risk_penalty: f64,
}

/// Stateless three-way classifier.
pub struct DecisionPolicy;

impl DecisionPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(
        &self,
        metrics: &BaseMetrics,
        diversity: &DiversityMetrics,
        risk: &RiskFactors,
        economics: &EconomicsMetrics,
        flow: SubmissionFlow,
        config: &ConsensusConfiguration,
    ) -> PolicyOutcome {
        let adjusted_ratio =
            metrics.weighted_approval_ratio + diversity.score * config.diversity_weight;
        let risk_penalty = risk.uncertainty * config.uncertainty_penalty
            + risk.novelty * config.novelty_penalty
            + risk.adversarial * ADVERSARIAL_PENALTY;
        let final_ratio = (adjusted_ratio - risk_penalty).max(0.0);

        let (decision, trigger) = Self::classify(metrics, risk, economics, flow, config, final_ratio);

        PolicyOutcome {
            decision,
            confidence: Self::reported_confidence(metrics.confidence, risk),
            trigger,
            final_approval_ratio: final_ratio,
            risk_penalty,
        }
    }

    fn classify(
        metrics: &BaseMetrics,
        risk: &RiskFactors,
        economics: &EconomicsMetrics,
        flow: SubmissionFlow,
        config: &ConsensusConfiguration,
        final_ratio: f64,
    ) -> (Decision, DecisionTrigger) {
        let quality_threshold = config.quality_threshold(flow);
        if metrics.quality_score < quality_threshold {
            return (
                Decision::Reject,
                DecisionTrigger::QualityBelowThreshold {
                    quality: metrics.quality_score,
                    threshold: quality_threshold,
                },
            );
        }

        if economics.total_cost > config.budget_constraint {
            return (
                Decision::Reject,
                DecisionTrigger::BudgetExceeded {
                    total_cost: economics.total_cost,
                    budget: config.budget_constraint,
                },
            );
        }

        if economics.cost_per_quality > config.cost_quality_ratio {
            return (
                Decision::Reject,
                DecisionTrigger::CostPerQualityExceeded {
                    cost_per_quality: economics.cost_per_quality,
                    limit: config.cost_quality_ratio,
                },
            );
        }

        let vetoed = risk.adversarial > ADVERSARIAL_VETO;

        if !vetoed
            && final_ratio >= config.approval_threshold
            && metrics.confidence >= config.confidence_threshold
        {
            return (Decision::Approve, DecisionTrigger::Approved { final_ratio });
        }

        if vetoed {
            return (
                Decision::Reject,
                DecisionTrigger::AdversarialVeto {
                    adversarial: risk.adversarial,
                },
            );
        }

        if final_ratio <= config.rejection_threshold {
            return (
                Decision::Reject,
                DecisionTrigger::RatioBelowRejection {
                    final_ratio,
                    threshold: config.rejection_threshold,
                },
            );
        }

        (Decision::Escalate, DecisionTrigger::Borderline { final_ratio })
    }

    /// Mean confidence discounted by risk, floored at 0.1.
    fn reported_confidence(confidence: f64, risk: &RiskFactors) -> f64 {
        let discount = risk.uncertainty * 0.3 + risk.adversarial * 0.4 + risk.novelty * 0.1;
        (confidence - discount).clamp(MIN_REPORTED_CONFIDENCE, 1.0)
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new()
    }
}
