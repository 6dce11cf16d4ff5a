//! Vote weighting.
//!
//! An agent's influence grows with its reliability, its fit for the task
//! and domain, and its own confidence; fast and cached responses get a
//! small bonus. The result is always clamped to [`MIN_WEIGHT`, `MAX_WEIGHT`].

use crate::registry::AgentCapability;
use crate::types::{AgentResponse, ExpertiseMetrics, SubmissionFlow, WeightedVote};

pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 2.0;

/// Responses faster than this get the latency bonus.
const FAST_RESPONSE_MS: u64 = 3000;
const FAST_RESPONSE_BONUS: f64 = 1.1;
const CACHE_HIT_BONUS: f64 = 1.05;

const PROTOCOL_DOMAINS: [&str; 2] = ["legislative-analysis", "political-communication"];
const DIRECT_DOMAINS: [&str; 2] = ["content-enhancement", "corporate-communication"];

/// Computes per-agent influence weights.
pub struct WeightCalculator {
    expertise_weight: f64,
}

impl WeightCalculator {
    pub fn new(expertise_weight: f64) -> Self {
        Self { expertise_weight }
    }

    /// Estimate how well an agent fits the submission.
    ///
    /// Task match only checks that the agent declares some capability;
    /// historical accuracy is proxied by reliability.
    pub fn resolve_expertise(
        &self,
        capability: &AgentCapability,
        flow: SubmissionFlow,
    ) -> ExpertiseMetrics {
        let task_match = if capability.capabilities.is_empty() { 0.5 } else { 0.8 };

        let domain_expertise = match flow {
            SubmissionFlow::ProtocolTracked => {
                if PROTOCOL_DOMAINS.iter().any(|d| capability.has_expertise(d)) {
                    0.9
                } else {
                    0.5
                }
            }
            SubmissionFlow::DirectDelivery => {
                if DIRECT_DOMAINS.iter().any(|d| capability.has_expertise(d)) {
                    0.8
                } else {
                    0.5
                }
            }
        };

        ExpertiseMetrics {
            task_match,
            domain_expertise,
            historical_accuracy: capability.effective_reliability(),
        }
    }

    /// Influence weight for one response.
    pub fn calculate(
        &self,
        capability: &AgentCapability,
        expertise: &ExpertiseMetrics,
        response: &AgentResponse,
    ) -> f64 {
        let expertise_score = 0.3 * expertise.task_match
            + 0.4 * expertise.domain_expertise
            + 0.3 * expertise.historical_accuracy;
        let confidence = response.confidence.clamp(0.0, 1.0);

        let mut weight = capability.effective_reliability()
            * (1.0 + self.expertise_weight * expertise_score)
            * (0.5 + 0.5 * confidence);

        if response.processing_time_ms < FAST_RESPONSE_MS {
            weight *= FAST_RESPONSE_BONUS;
        }
        if response.cache_hit {
            weight *= CACHE_HIT_BONUS;
        }

        if weight.is_nan() {
            return MIN_WEIGHT;
        }
        weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    }

    /// Turn a usable response into a weighted vote.
    ///
    /// Returns `None` for responses that failed or carry no verdict.
    pub fn weigh(
        &self,
        response: &AgentResponse,
        capability: &AgentCapability,
        flow: SubmissionFlow,
    ) -> Option<WeightedVote> {
        if !response.is_usable() {
            return None;
        }
        let verdict = response.verdict.as_ref()?;

        let expertise = self.resolve_expertise(capability, flow);
        let weight = self.calculate(capability, &expertise, response);

        Some(WeightedVote {
            agent_id: response.agent_id.clone(),
            provider: capability.provider.clone(),
            decision: verdict.decision(),
            confidence: response.confidence.clamp(0.0, 1.0),
            reasoning: response.reasoning.clone(),
            weight,
            expertise,
        })
    }
}

impl Default for WeightCalculator {
    fn default() -> Self {
        Self::new(0.25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgentVerdict, VoteDecision};

    fn approve(confidence: f64) -> AgentResponse {
        AgentResponse::new(
            "agent",
            AgentVerdict::Reasoning {
                recommendation: VoteDecision::Approve,
            },
            confidence,
        )
    }

    #[test]
    fn test_expertise_protocol_tracked() {
        let calc = WeightCalculator::default();
        let capability = AgentCapability::new("a", "openai", 0.9)
            .with_capabilities(["screening"])
            .with_expertise(["legislative-analysis"]);

        let expertise = calc.resolve_expertise(&capability, SubmissionFlow::ProtocolTracked);
        assert_eq!(expertise.task_match, 0.8);
        assert_eq!(expertise.domain_expertise, 0.9);
        assert_eq!(expertise.historical_accuracy, 0.9);

        // Legislative expertise does not count for direct delivery
        let expertise = calc.resolve_expertise(&capability, SubmissionFlow::DirectDelivery);
        assert_eq!(expertise.domain_expertise, 0.5);
    }

    #[test]
    fn test_expertise_direct_delivery() {
        let calc = WeightCalculator::default();
        let capability =
            AgentCapability::new("a", "openai", 0.7).with_expertise(["corporate-communication"]);

        let expertise = calc.resolve_expertise(&capability, SubmissionFlow::DirectDelivery);
        assert_eq!(expertise.task_match, 0.5);
        assert_eq!(expertise.domain_expertise, 0.8);
    }

    #[test]
    fn test_weight_formula() {
        let calc = WeightCalculator::new(0.25);
        let capability = AgentCapability::new("a", "openai", 1.0);
        let expertise = ExpertiseMetrics {
            task_match: 0.5,
            domain_expertise: 0.5,
            historical_accuracy: 1.0,
        };
        // Slow, uncached response: no bonuses
        let response = approve(1.0).with_processing_time(5000);

        // 1.0 * (1 + 0.25 * (0.15 + 0.2 + 0.3)) * 1.0
        let weight = calc.calculate(&capability, &expertise, &response);
        assert!((weight - 1.1625).abs() < 1e-9);
    }

    #[test]
    fn test_latency_and_cache_bonuses() {
        let calc = WeightCalculator::new(0.0);
        let capability = AgentCapability::new("a", "openai", 1.0);
        let expertise = calc.resolve_expertise(&capability, SubmissionFlow::DirectDelivery);

        let slow = approve(1.0).with_processing_time(3000);
        let fast_cached = approve(1.0).with_processing_time(10).with_cache_hit(true);

        assert!((calc.calculate(&capability, &expertise, &slow) - 1.0).abs() < 1e-9);
        assert!((calc.calculate(&capability, &expertise, &fast_cached) - 1.155).abs() < 1e-9);
    }

    #[test]
    fn test_weight_is_clamped() {
        let calc = WeightCalculator::new(10.0);
        let strong = AgentCapability::new("a", "openai", 1.0).with_capabilities(["x"]);
        let weak = AgentCapability::new("b", "openai", 0.0);

        let expertise = calc.resolve_expertise(&strong, SubmissionFlow::DirectDelivery);
        assert_eq!(calc.calculate(&strong, &expertise, &approve(1.0)), MAX_WEIGHT);

        let expertise = calc.resolve_expertise(&weak, SubmissionFlow::DirectDelivery);
        assert_eq!(calc.calculate(&weak, &expertise, &approve(1.0)), MIN_WEIGHT);
    }

    #[test]
    fn test_out_of_range_reliability_is_clamped() {
        let calc = WeightCalculator::new(0.0);

        let inflated = AgentCapability::new("a", "openai", 1.5);
        let vote = calc
            .weigh(&approve(1.0).with_processing_time(5000), &inflated, SubmissionFlow::DirectDelivery)
            .unwrap();
        assert_eq!(vote.expertise.historical_accuracy, 1.0);
        assert!((vote.weight - 1.0).abs() < 1e-9);

        let unknown = AgentCapability::new("b", "openai", f64::NAN);
        let vote = calc
            .weigh(&approve(1.0), &unknown, SubmissionFlow::DirectDelivery)
            .unwrap();
        assert_eq!(vote.expertise.historical_accuracy, 0.0);
        assert_eq!(vote.weight, MIN_WEIGHT);
    }

    #[test]
    fn test_weigh_skips_failed_response() {
        let calc = WeightCalculator::default();
        let capability = AgentCapability::new("agent", "openai", 0.9);

        assert!(calc
            .weigh(&AgentResponse::failed("agent"), &capability, SubmissionFlow::DirectDelivery)
            .is_none());

        let vote = calc
            .weigh(&approve(1.4), &capability, SubmissionFlow::DirectDelivery)
            .unwrap();
        assert_eq!(vote.provider, "openai");
        assert_eq!(vote.decision, VoteDecision::Approve);
        assert_eq!(vote.confidence, 1.0);
    }
}
