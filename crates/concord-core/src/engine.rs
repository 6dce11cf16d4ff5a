//! The consensus engine.
//!
//! Pipeline:
//! 1. Weigh usable responses whose capability resolves (others are dropped)
//! 2. Aggregate base metrics
//! 3. Score diversity, assess risk, account costs (independent of each other)
//! 4. Apply the decision policy
//! 5. Generate reasoning and recommendations
//!
//! The engine never fails: an evaluation with no usable votes yields a
//! fixed REJECT result.

use std::sync::Arc;

use crate::config::{ConsensusConfiguration, SharedConfiguration};
use crate::diversity::DiversityScorer;
use crate::economics::EconomicsCalculator;
use crate::metrics::BaseMetricsAggregator;
use crate::policy::DecisionPolicy;
use crate::reasoning::{ReasoningContext, ReasoningGenerator};
use crate::registry::{CapabilityDirectory, CapabilityRegistry};
use crate::risk::{AdversarialDetector, NoveltyDetector, RiskAssessor, SensitivityDetector};
use crate::types::{
    ConsensusInput, ConsensusResult, Decision, DiversityMetrics, RiskFactors, WeightedVote,
};
use crate::weights::WeightCalculator;

/// Evaluates agent responses into a single auditable decision.
pub struct ConsensusEngine {
    config: SharedConfiguration,
    directory: Arc<dyn CapabilityDirectory>,
    risk: RiskAssessor,
    aggregator: BaseMetricsAggregator,
    diversity: DiversityScorer,
    economics: EconomicsCalculator,
    policy: DecisionPolicy,
    reasoning: ReasoningGenerator,
}

impl ConsensusEngine {
    /// Engine with default configuration and heuristic detectors.
    pub fn new(directory: Arc<dyn CapabilityDirectory>) -> Self {
        ConsensusEngineBuilder::new().directory(directory).build()
    }

    pub fn builder() -> ConsensusEngineBuilder {
        ConsensusEngineBuilder::new()
    }

    /// Snapshot of the configuration in effect.
    pub fn configuration(&self) -> Arc<ConsensusConfiguration> {
        self.config.snapshot()
    }

    /// Handle to the shared configuration, for callers that update it from
    /// elsewhere.
    pub fn shared_configuration(&self) -> &SharedConfiguration {
        &self.config
    }

    /// Replace the configuration; in-flight evaluations keep their snapshot.
    pub fn replace_configuration(
        &self,
        config: ConsensusConfiguration,
    ) -> Arc<ConsensusConfiguration> {
        self.config.replace(config)
    }

    /// Derive and install a new configuration from the current one.
    pub fn update_configuration<F>(&self, f: F) -> Arc<ConsensusConfiguration>
    where
        F: FnOnce(&mut ConsensusConfiguration),
    {
        self.config.update(f)
    }

    /// Run a full evaluation.
    pub fn evaluate(&self, input: &ConsensusInput) -> ConsensusResult {
        let config = self.config.snapshot();
        let flow = input.submission_flow;

        let votes = self.collect_votes(input, &config);
        if votes.is_empty() {
            tracing::warn!(
                responses = input.agent_responses.len(),
                "No usable agent responses, rejecting"
            );
            return self.degenerate_result(input);
        }

        let metrics = self.aggregator.aggregate(&votes);
        tracing::debug!(
            votes = votes.len(),
            weighted_approval_ratio = metrics.weighted_approval_ratio,
            quality_score = metrics.quality_score,
            "Base metrics aggregated"
        );

        let diversity = self.diversity.score(&votes);
        let risk = self
            .risk
            .assess(input, &votes, config.adversarial_detection_enabled);
        let economics = self
            .economics
            .calculate(&input.agent_responses, metrics.quality_score);
        tracing::debug!(
            diversity = diversity.score,
            uncertainty = risk.uncertainty,
            novelty = risk.novelty,
            sensitivity = risk.sensitivity,
            adversarial = risk.adversarial,
            total_cost = economics.total_cost,
            "Risk and economics assessed"
        );

        let outcome = self
            .policy
            .decide(&metrics, &diversity, &risk, &economics, flow, &config);

        let (reasoning, recommendations) = self.reasoning.generate(&ReasoningContext {
            votes: &votes,
            outcome: &outcome,
            metrics: &metrics,
            risk: &risk,
            economics: &economics,
            flow,
            config: &config,
        });

        tracing::info!(
            decision = %outcome.decision,
            confidence = outcome.confidence,
            quality_score = metrics.quality_score,
            trigger = ?outcome.trigger,
            "Consensus reached"
        );

        ConsensusResult {
            decision: outcome.decision,
            confidence: outcome.confidence,
            quality_score: metrics.quality_score.clamp(0.0, 1.0),
            votes,
            reasoning,
            diversity,
            economics,
            risk_factors: risk,
            recommendations,
        }
    }

    /// Weigh every usable response with a known capability.
    fn collect_votes(
        &self,
        input: &ConsensusInput,
        config: &ConsensusConfiguration,
    ) -> Vec<WeightedVote> {
        let calculator = WeightCalculator::new(config.expertise_weight);

        input
            .agent_responses
            .iter()
            .filter(|response| {
                let usable = response.is_usable();
                if !usable {
                    tracing::debug!(agent_id = %response.agent_id, "Skipping unusable response");
                }
                usable
            })
            .filter_map(|response| match self.directory.lookup(&response.agent_id) {
                Some(capability) => calculator.weigh(response, capability, input.submission_flow),
                None => {
                    tracing::warn!(
                        agent_id = %response.agent_id,
                        "Unknown agent capability, vote dropped"
                    );
                    None
                }
            })
            .collect()
    }

    /// Fixed REJECT; successful calls are still billed.
    fn degenerate_result(&self, input: &ConsensusInput) -> ConsensusResult {
        let (reasoning, recommendations) = self.reasoning.degenerate();
        ConsensusResult {
            decision: Decision::Reject,
            confidence: 0.0,
            quality_score: 0.0,
            votes: Vec::new(),
            reasoning,
            diversity: DiversityMetrics::default(),
            economics: self.economics.calculate(&input.agent_responses, 0.0),
            risk_factors: RiskFactors::default(),
            recommendations,
        }
    }
}

/// Builder for [`ConsensusEngine`].
pub struct ConsensusEngineBuilder {
    config: SharedConfiguration,
    directory: Option<Arc<dyn CapabilityDirectory>>,
    risk: RiskAssessor,
}

impl ConsensusEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: SharedConfiguration::default(),
            directory: None,
            risk: RiskAssessor::default(),
        }
    }

    /// Set the capability directory. Defaults to an empty registry.
    pub fn directory(mut self, directory: Arc<dyn CapabilityDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: ConsensusConfiguration) -> Self {
        self.config = SharedConfiguration::new(config);
        self
    }

    /// Share a configuration handle with other engines or an admin surface.
    pub fn shared_config(mut self, config: SharedConfiguration) -> Self {
        self.config = config;
        self
    }

    pub fn novelty_detector(mut self, detector: Box<dyn NoveltyDetector>) -> Self {
        self.risk = self.risk.with_novelty(detector);
        self
    }

    pub fn sensitivity_detector(mut self, detector: Box<dyn SensitivityDetector>) -> Self {
        self.risk = self.risk.with_sensitivity(detector);
        self
    }

    pub fn adversarial_detector(mut self, detector: Box<dyn AdversarialDetector>) -> Self {
        self.risk = self.risk.with_adversarial(detector);
        self
    }

    pub fn build(self) -> ConsensusEngine {
        for warning in self.config.snapshot().warnings() {
            tracing::warn!(%warning, "Suspicious consensus configuration");
        }

        ConsensusEngine {
            config: self.config,
            directory: self
                .directory
                .unwrap_or_else(|| Arc::new(CapabilityRegistry::new())),
            risk: self.risk,
            aggregator: BaseMetricsAggregator::new(),
            diversity: DiversityScorer::new(),
            economics: EconomicsCalculator::new(),
            policy: DecisionPolicy::new(),
            reasoning: ReasoningGenerator::new(),
        }
    }
}

impl Default for ConsensusEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::AgentCapability;
    use crate::types::{AgentResponse, AgentVerdict, SubmissionFlow, VoteDecision};

    fn registry() -> Arc<CapabilityRegistry> {
        Arc::new(
            [
                AgentCapability::new("screener", "openai", 1.0),
                AgentCapability::new("writer", "anthropic", 1.0),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn approve(agent: &str, confidence: f64) -> AgentResponse {
        AgentResponse::new(
            agent,
            AgentVerdict::Reasoning {
                recommendation: VoteDecision::Approve,
            },
            confidence,
        )
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let engine = ConsensusEngine::new(registry());
        let input = ConsensusInput::new("Hello", SubmissionFlow::DirectDelivery);

        let result = engine.evaluate(&input);
        assert_eq!(result.decision, Decision::Reject);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.quality_score, 0.0);
        assert!(result.votes.is_empty());
        assert!(!result.recommendations.escalation_reasons.is_empty());
    }

    #[test]
    fn test_unknown_agent_is_dropped() {
        let engine = ConsensusEngine::new(registry());
        let input = ConsensusInput::new("Please fund the library.", SubmissionFlow::DirectDelivery)
            .with_responses(vec![approve("screener", 0.9), approve("ghost", 0.9)]);

        let result = engine.evaluate(&input);
        assert_eq!(result.votes.len(), 1);
        assert_eq!(result.votes[0].agent_id, "screener");
    }

    #[test]
    fn test_unknown_agent_cost_is_still_billed() {
        let engine = ConsensusEngine::new(registry());
        let input = ConsensusInput::new("Please fund the library.", SubmissionFlow::DirectDelivery)
            .with_responses(vec![
                approve("screener", 0.9).with_cost(0.001),
                approve("ghost", 0.9).with_cost(0.002),
            ]);

        let result = engine.evaluate(&input);
        assert!((result.economics.total_cost - 0.003).abs() < 1e-12);
    }

    #[test]
    fn test_replace_configuration_applies_to_next_evaluation() {
        let engine = ConsensusEngine::new(registry());
        let input = ConsensusInput::new("Please fund the library.", SubmissionFlow::DirectDelivery)
            .with_responses(vec![approve("screener", 0.9).with_cost(0.04)]);

        assert_eq!(engine.evaluate(&input).decision, Decision::Approve);

        let updated = engine.update_configuration(|c| c.budget_constraint = 0.01);
        assert_eq!(updated.budget_constraint, 0.01);
        assert_eq!(engine.evaluate(&input).decision, Decision::Reject);

        engine.replace_configuration(ConsensusConfiguration::default());
        assert_eq!(engine.configuration().budget_constraint, 0.10);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConsensusEngine>();
    }
}
