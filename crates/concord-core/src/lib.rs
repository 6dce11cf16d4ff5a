//! # concord-core
//!
//! Deterministic multi-agent consensus engine.
//!
//! Independent AI agents each judge a piece of civic content. This crate
//! folds their verdicts into one auditable action:
//! - Should this content be delivered automatically?
//! - Should it be refused?
//! - Does a human need to look at it?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input and configuration always produce the same result
//! 2. **No LLM calls**: Agents run upstream; this crate only aggregates
//! 3. **Never fails**: Degenerate input yields a REJECT result, not an error
//! 4. **Consistent configuration**: Each evaluation reads one configuration snapshot
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use concord_core::{CapabilityRegistry, ConsensusEngine, ConsensusInput, Decision};
//!
//! let registry = CapabilityRegistry::from_yaml_file("agents.yaml")?;
//! let engine = ConsensusEngine::new(Arc::new(registry));
//!
//! let input: ConsensusInput = serde_yaml::from_str(&std::fs::read_to_string("input.yaml")?)?;
//! let result = engine.evaluate(&input);
//!
//! match result.decision {
//!     Decision::Approve => println!("OK: {}", result.reasoning.primary),
//!     Decision::Escalate => println!("REVIEW: {:?}", result.recommendations.escalation_reasons),
//!     Decision::Reject => println!("REJECTED: {}", result.reasoning.primary),
//! }
//! ```

pub mod config;
pub mod diversity;
pub mod economics;
pub mod engine;
pub mod metrics;
pub mod policy;
pub mod reasoning;
pub mod registry;
pub mod risk;
pub mod types;
pub mod weights;

// Re-export main types at crate root
pub use config::{ConfigError, ConsensusConfiguration, SharedConfiguration};
pub use diversity::DiversityScorer;
pub use economics::EconomicsCalculator;
pub use engine::{ConsensusEngine, ConsensusEngineBuilder};
pub use metrics::{BaseMetrics, BaseMetricsAggregator};
pub use policy::{DecisionPolicy, DecisionTrigger, PolicyOutcome};
pub use reasoning::{ReasoningContext, ReasoningGenerator};
pub use registry::{AgentCapability, CapabilityDirectory, CapabilityRegistry, RegistryError};
pub use risk::{
    AdversarialDetector, HeuristicNoveltyDetector, KeywordSensitivityDetector, NoveltyDetector,
    PatternAdversarialDetector, RiskAssessor, SensitivityDetector,
};
pub use types::{
    AgentResponse, AgentVerdict, ConsensusInput, ConsensusResult, Decision, DiversityMetrics,
    EconomicsMetrics, ExpertiseMetrics, Reasoning, Recommendations, RiskFactors, SubmissionFlow,
    VoteDecision, WeightedVote,
};
pub use weights::WeightCalculator;

/// Evaluate agent responses with a default-configured engine.
///
/// # Arguments
///
/// * `directory` - Capability lookup for the responding agents
/// * `config` - Thresholds, weights and penalties to apply
/// * `input` - Agent responses and the content they judged
///
/// # Returns
///
/// A `ConsensusResult` containing:
/// - `decision`: APPROVE, REJECT, or ESCALATE
/// - `votes`: the weighted votes that were counted
/// - `reasoning` and `recommendations`: deterministic rationale and follow-ups
pub fn evaluate(
    directory: std::sync::Arc<dyn CapabilityDirectory>,
    config: &ConsensusConfiguration,
    input: &ConsensusInput,
) -> ConsensusResult {
    ConsensusEngine::builder()
        .directory(directory)
        .config(config.clone())
        .build()
        .evaluate(input)
}
