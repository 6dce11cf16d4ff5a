//! Deterministic rationale and follow-up generation.
//!
//! Text depends only on the evaluation's numbers and votes; vote quotes are
//! picked by weight (then agent id), never sampled.

use std::cmp::Ordering;

use crate::config::ConsensusConfiguration;
use crate::metrics::BaseMetrics;
use crate::policy::{DecisionTrigger, PolicyOutcome};
use crate::types::{
    Decision, EconomicsMetrics, Reasoning, Recommendations, RiskFactors, SubmissionFlow,
    VoteDecision, WeightedVote,
};

const MAX_SUPPORTING: usize = 2;
const MAX_DISSENTING: usize = 1;
const MAX_QUOTE_CHARS: usize = 200;

// Signal levels that are worth a human's attention on escalation.
const UNCERTAINTY_ALERT: f64 = 0.3;
const NOVELTY_ALERT: f64 = 0.5;
const SENSITIVITY_ALERT: f64 = 0.5;
const ADVERSARIAL_ALERT: f64 = 0.3;
const BUDGET_ALERT_SHARE: f64 = 0.8;

/// Everything the generator reads.
pub struct ReasoningContext<'a> {
    pub votes: &'a [WeightedVote],
    pub outcome: &'a PolicyOutcome,
    pub metrics: &'a BaseMetrics,
    pub risk: &'a RiskFactors,
    pub economics: &'a EconomicsMetrics,
    pub flow: SubmissionFlow,
    pub config: &'a ConsensusConfiguration,
}

/// Builds the human-readable parts of a result.
pub struct ReasoningGenerator;

impl ReasoningGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(&self, ctx: &ReasoningContext<'_>) -> (Reasoning, Recommendations) {
        let reasoning = Reasoning {
            primary: self.build_primary(ctx),
            supporting: self.quotes(ctx, true, MAX_SUPPORTING),
            dissenting: self.quotes(ctx, false, MAX_DISSENTING),
        };

        let recommendations = match ctx.outcome.decision {
            Decision::Approve => Recommendations {
                next_actions: self.approve_actions(ctx.flow),
                improvements: Vec::new(),
                escalation_reasons: Vec::new(),
            },
            Decision::Reject => Recommendations {
                next_actions: self.reject_actions(),
                improvements: self.improvements(ctx),
                escalation_reasons: Vec::new(),
            },
            Decision::Escalate => Recommendations {
                next_actions: self.escalate_actions(ctx.flow),
                improvements: Vec::new(),
                escalation_reasons: self.escalation_reasons(ctx),
            },
        };

        (reasoning, recommendations)
    }

    /// Rationale for an evaluation with no usable votes.
    pub fn degenerate(&self) -> (Reasoning, Recommendations) {
        (
            Reasoning {
                primary: "Rejected: no usable agent responses were available for consensus."
                    .to_string(),
                supporting: Vec::new(),
                dissenting: Vec::new(),
            },
            Recommendations {
                next_actions: vec![
                    "Log consensus failure for operator review".to_string(),
                    "Retry evaluation once agents are available".to_string(),
                ],
                improvements: Vec::new(),
                escalation_reasons: vec![
                    "System condition: no successful agent responses with a known capability"
                        .to_string(),
                ],
            },
        )
    }

    fn build_primary(&self, ctx: &ReasoningContext<'_>) -> String {
        let approvals = ctx.votes.iter().filter(|v| v.decision.is_approve()).count();
        let total = ctx.votes.len();

        match ctx.outcome.trigger {
            DecisionTrigger::Approved { final_ratio } => format!(
                "Approved by weighted consensus: {}/{} agents in favour, risk-adjusted approval ratio {:.2}.",
                approvals, total, final_ratio
            ),
            DecisionTrigger::QualityBelowThreshold { quality, threshold } => format!(
                "Rejected: consensus quality {:.2} is below the {} threshold of {:.2}.",
                quality, ctx.flow, threshold
            ),
            DecisionTrigger::BudgetExceeded { total_cost, budget } => format!(
                "Rejected: evaluation cost ${:.4} exceeds the ${:.4} budget.",
                total_cost, budget
            ),
            DecisionTrigger::CostPerQualityExceeded {
                cost_per_quality,
                limit,
            } => format!(
                "Rejected: cost per quality point ${:.4} exceeds the ${:.4} limit.",
                cost_per_quality, limit
            ),
            DecisionTrigger::AdversarialVeto { adversarial } => format!(
                "Rejected: adversarial risk {:.2} vetoes automatic approval ({}/{} agents in favour).",
                adversarial, approvals, total
            ),
            DecisionTrigger::RatioBelowRejection {
                final_ratio,
                threshold,
            } => format!(
                "Rejected by weighted consensus: risk-adjusted approval ratio {:.2} is at or below {:.2} ({}/{} agents in favour).",
                final_ratio, threshold, approvals, total
            ),
            DecisionTrigger::Borderline { final_ratio } => format!(
                "Escalated for human review: risk-adjusted approval ratio {:.2} is inconclusive ({}/{} agents in favour).",
                final_ratio, approvals, total
            ),
        }
    }

    /// The side of the panel holding more weight; ties go to approval.
    fn majority_side(&self, ctx: &ReasoningContext<'_>) -> VoteDecision {
        let reject_weight = ctx.metrics.total_weight - ctx.metrics.approval_weight;
        VoteDecision::from(ctx.metrics.approval_weight >= reject_weight)
    }

    fn quotes(&self, ctx: &ReasoningContext<'_>, majority: bool, limit: usize) -> Vec<String> {
        let side = self.majority_side(ctx);

        let mut group: Vec<&WeightedVote> = ctx
            .votes
            .iter()
            .filter(|v| (v.decision == side) == majority)
            .collect();
        group.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.agent_id.cmp(&b.agent_id))
        });

        group.into_iter().take(limit).map(quote).collect()
    }

    fn approve_actions(&self, flow: SubmissionFlow) -> Vec<String> {
        match flow {
            SubmissionFlow::ProtocolTracked => vec![
                "Settle agent costs on-protocol".to_string(),
                "Distribute reward tokens to the submitter".to_string(),
                "Schedule congressional delivery".to_string(),
            ],
            SubmissionFlow::DirectDelivery => vec![
                "Queue message for delivery".to_string(),
                "Update delivery metrics".to_string(),
            ],
        }
    }

    fn reject_actions(&self) -> Vec<String> {
        vec![
            "Send rejection feedback to the submitter".to_string(),
            "Process refund for the submission".to_string(),
            "Log rejection for audit".to_string(),
        ]
    }

    fn escalate_actions(&self, flow: SubmissionFlow) -> Vec<String> {
        let mut actions = vec![
            "Queue for human moderation".to_string(),
            "Notify moderators of escalation reasons".to_string(),
        ];
        if flow == SubmissionFlow::ProtocolTracked {
            actions.push("Hold reward settlement until review completes".to_string());
        }
        actions
    }

    fn improvements(&self, ctx: &ReasoningContext<'_>) -> Vec<String> {
        let mut improvements = Vec::new();

        match ctx.outcome.trigger {
            DecisionTrigger::QualityBelowThreshold { .. } => improvements
                .push("Clarify the message's request so reviewers can reach agreement".to_string()),
            DecisionTrigger::BudgetExceeded { .. }
            | DecisionTrigger::CostPerQualityExceeded { .. } => improvements.push(
                "Review agent selection: evaluation cost exceeded the configured limits"
                    .to_string(),
            ),
            _ => {}
        }

        if ctx.risk.adversarial > ADVERSARIAL_ALERT {
            improvements.push("Remove instructions addressed to automated reviewers".to_string());
        }
        if ctx.risk.sensitivity > SENSITIVITY_ALERT {
            improvements.push("Use more neutral, less inflammatory language".to_string());
        }
        if ctx.risk.novelty > NOVELTY_ALERT {
            improvements.push("Simplify formatting and remove unusual characters".to_string());
        }

        if improvements.is_empty() {
            improvements.push("Revise the content to address reviewer concerns".to_string());
        }
        improvements
    }

    fn escalation_reasons(&self, ctx: &ReasoningContext<'_>) -> Vec<String> {
        let mut reasons = Vec::new();

        let ratio = ctx.outcome.final_approval_ratio;
        if ratio > ctx.config.rejection_threshold && ratio < ctx.config.approval_threshold {
            reasons.push(format!(
                "Risk-adjusted approval ratio {:.2} lies between the rejection ({:.2}) and approval ({:.2}) thresholds",
                ratio, ctx.config.rejection_threshold, ctx.config.approval_threshold
            ));
        }

        if ctx.metrics.confidence < ctx.config.confidence_threshold {
            reasons.push(format!(
                "Mean agent confidence {:.2} is below the {:.2} threshold",
                ctx.metrics.confidence, ctx.config.confidence_threshold
            ));
        }
        if ctx.risk.uncertainty > UNCERTAINTY_ALERT {
            reasons.push(format!(
                "Agents disagree on confidence (uncertainty {:.2})",
                ctx.risk.uncertainty
            ));
        }
        if ctx.risk.novelty > NOVELTY_ALERT {
            reasons.push(format!(
                "Content has unusual characteristics (novelty {:.2})",
                ctx.risk.novelty
            ));
        }
        if ctx.risk.sensitivity > SENSITIVITY_ALERT {
            reasons.push(format!(
                "Content is politically or topically sensitive (sensitivity {:.2})",
                ctx.risk.sensitivity
            ));
        }
        if ctx.risk.adversarial > ADVERSARIAL_ALERT {
            reasons.push(format!(
                "Possible adversarial content (adversarial {:.2})",
                ctx.risk.adversarial
            ));
        }
        if ctx.economics.total_cost > ctx.config.budget_constraint * BUDGET_ALERT_SHARE {
            reasons.push(format!(
                "Evaluation cost ${:.4} is close to the ${:.4} budget",
                ctx.economics.total_cost, ctx.config.budget_constraint
            ));
        }

        reasons
    }
}

impl Default for ReasoningGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn quote(vote: &WeightedVote) -> String {
    let body = if vote.reasoning.trim().is_empty() {
        let verdict = match vote.decision {
            VoteDecision::Approve => "approve",
            VoteDecision::Reject => "reject",
        };
        format!("voted {} with confidence {:.2}", verdict, vote.confidence)
    } else {
        truncate(vote.reasoning.trim(), MAX_QUOTE_CHARS)
    };
    format!("{} ({}): {}", vote.agent_id, vote.provider, body)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
