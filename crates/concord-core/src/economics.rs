//! Cost accounting for an evaluation.

use crate::types::{AgentResponse, EconomicsMetrics};

/// Computes spend, cost per quality point and efficiency.
pub struct EconomicsCalculator;

impl EconomicsCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Only successful responses are billed; their capability does not need
    /// to resolve.
    pub fn calculate(&self, responses: &[AgentResponse], quality_score: f64) -> EconomicsMetrics {
        let total_cost: f64 = responses
            .iter()
            .filter(|r| r.success)
            .map(AgentResponse::billable_cost)
            .sum();

        let cost_per_quality = if quality_score > 0.0 {
            total_cost / quality_score
        } else {
            f64::INFINITY
        };

        let efficiency = if total_cost > 0.0 {
            quality_score / total_cost
        } else {
            0.0
        };

        EconomicsMetrics {
            total_cost,
            cost_per_quality,
            efficiency,
        }
    }
}

impl Default for EconomicsCalculator {
    fn default() -> Self {
        Self::new()
    }
}
