//! Base consensus metrics over a set of weighted votes.

use crate::types::WeightedVote;

/// Aggregate statistics feeding the decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BaseMetrics {
    pub total_weight: f64,
    pub approval_weight: f64,
    /// Share of total weight that approves
    pub weighted_approval_ratio: f64,
    /// Share of votes that approve, ignoring weight
    pub approval_ratio: f64,
    /// Mean vote confidence
    pub confidence: f64,
    /// Distance from a 50/50 split, scaled to [0, 1]
    pub consensus_strength: f64,
    pub quality_score: f64,
}

/// Aggregates votes into [`BaseMetrics`].
pub struct BaseMetricsAggregator;

impl BaseMetricsAggregator {
    pub fn new() -> Self {
        Self
    }

    pub fn aggregate(&self, votes: &[WeightedVote]) -> BaseMetrics {
        let total_weight: f64 = votes.iter().map(|v| v.weight).sum();
        let approval_weight: f64 = votes
            .iter()
            .filter(|v| v.decision.is_approve())
            .map(|v| v.weight)
            .sum();

        let weighted_approval_ratio = if total_weight > 0.0 {
            approval_weight / total_weight
        } else {
            0.0
        };

        let (approval_ratio, confidence) = if votes.is_empty() {
            (0.0, 0.0)
        } else {
            let n = votes.len() as f64;
            let approvals = votes.iter().filter(|v| v.decision.is_approve()).count() as f64;
            let confidence_sum: f64 = votes.iter().map(|v| v.confidence).sum();
            (approvals / n, confidence_sum / n)
        };

        let consensus_strength = (weighted_approval_ratio - 0.5).abs() * 2.0;
        let quality_score = 0.6 * consensus_strength + 0.4 * confidence;

        BaseMetrics {
            total_weight,
            approval_weight,
            weighted_approval_ratio,
            approval_ratio,
            confidence,
            consensus_strength,
            quality_score,
        }
    }
}

impl Default for BaseMetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}
