//! Core data types for consensus evaluation.
//!
//! Inputs (`AgentResponse`, `ConsensusInput`) arrive fully assembled from
//! upstream agents. Outputs (`ConsensusResult` and its parts) are immutable
//! value objects handed to the downstream action layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The binary verdict carried by a single agent vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDecision {
    Approve,
    Reject,
}

impl VoteDecision {
    pub fn is_approve(&self) -> bool {
        matches!(self, VoteDecision::Approve)
    }
}

impl From<bool> for VoteDecision {
    fn from(approved: bool) -> Self {
        if approved {
            VoteDecision::Approve
        } else {
            VoteDecision::Reject
        }
    }
}

/// The final three-state action produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Content may proceed automatically
    Approve,
    /// Content is refused
    Reject,
    /// Content is routed to human review
    Escalate,
}

impl Decision {
    pub fn is_approve(&self) -> bool {
        matches!(self, Decision::Approve)
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Decision::Reject)
    }

    pub fn is_escalate(&self) -> bool {
        matches!(self, Decision::Escalate)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approve => write!(f, "APPROVE"),
            Decision::Reject => write!(f, "REJECT"),
            Decision::Escalate => write!(f, "ESCALATE"),
        }
    }
}

/// Which product path produced the content under evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SubmissionFlow {
    /// Tracked on-protocol: higher quality bar, settlement and rewards
    ProtocolTracked,
    /// Delivered directly to the recipient
    #[default]
    DirectDelivery,
}

impl fmt::Display for SubmissionFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionFlow::ProtocolTracked => write!(f, "protocol-tracked"),
            SubmissionFlow::DirectDelivery => write!(f, "direct-delivery"),
        }
    }
}

/// Kind-specific payload returned by an agent.
///
/// Each agent kind reports its verdict differently; `decision()` is the
/// single projection the engine relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AgentVerdict {
    /// Safety / policy screening pass
    Screening {
        approved: bool,
        #[serde(default)]
        flags: Vec<String>,
    },

    /// Content enhancement pass, possibly proposing rewritten content
    Enhancement {
        approved: bool,
        #[serde(default)]
        enhanced_content: Option<String>,
    },

    /// Free-form reasoning pass with an explicit recommendation
    Reasoning { recommendation: VoteDecision },

    /// Tie-break or meta-consensus agent
    Consensus { decision: VoteDecision },
}

impl AgentVerdict {
    /// Project the payload onto a binary vote.
    pub fn decision(&self) -> VoteDecision {
        match self {
            AgentVerdict::Screening { approved, .. } => VoteDecision::from(*approved),
            AgentVerdict::Enhancement { approved, .. } => VoteDecision::from(*approved),
            AgentVerdict::Reasoning { recommendation } => *recommendation,
            AgentVerdict::Consensus { decision } => *decision,
        }
    }
}

/// A completed response from one upstream agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Identifier used to resolve the agent's capability
    pub agent_id: String,

    /// Whether the agent call completed successfully
    pub success: bool,

    /// The agent's verdict (absent on failure)
    #[serde(default)]
    pub verdict: Option<AgentVerdict>,

    /// Self-reported confidence (0.0 - 1.0)
    pub confidence: f64,

    /// Free-text justification
    #[serde(default)]
    pub reasoning: String,

    /// Cost of the call in USD
    #[serde(default)]
    pub cost: f64,

    /// Wall-clock processing time in milliseconds
    #[serde(default)]
    pub processing_time_ms: u64,

    /// Whether the result was served from a cache
    #[serde(default)]
    pub cache_hit: bool,
}

impl AgentResponse {
    /// A successful response with the given verdict and confidence.
    pub fn new(agent_id: impl Into<String>, verdict: AgentVerdict, confidence: f64) -> Self {
        Self {
            agent_id: agent_id.into(),
            success: true,
            verdict: Some(verdict),
            confidence,
            reasoning: String::new(),
            cost: 0.0,
            processing_time_ms: 0,
            cache_hit: false,
        }
    }

    /// A failed response (no verdict).
    pub fn failed(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            success: false,
            verdict: None,
            confidence: 0.0,
            reasoning: String::new(),
            cost: 0.0,
            processing_time_ms: 0,
            cache_hit: false,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_processing_time(mut self, ms: u64) -> Self {
        self.processing_time_ms = ms;
        self
    }

    pub fn with_cache_hit(mut self, cache_hit: bool) -> Self {
        self.cache_hit = cache_hit;
        self
    }

    /// Usable responses succeeded, carry a verdict and a finite confidence.
    pub fn is_usable(&self) -> bool {
        self.success && self.verdict.is_some() && self.confidence.is_finite()
    }

    /// Cost with negative or non-finite values treated as zero.
    pub fn billable_cost(&self) -> f64 {
        if self.cost.is_finite() && self.cost > 0.0 {
            self.cost
        } else {
            0.0
        }
    }
}

/// Everything the engine needs to evaluate one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusInput {
    /// Completed responses from upstream agents
    #[serde(default)]
    pub agent_responses: Vec<AgentResponse>,

    /// Content as submitted by the user
    pub original_content: String,

    /// Content after an enhancement pass, if any
    #[serde(default)]
    pub enhanced_content: Option<String>,

    /// Product path that produced this submission
    #[serde(default)]
    pub submission_flow: SubmissionFlow,

    /// Submitter reputation (carried for downstream consumers)
    #[serde(default)]
    pub user_reputation: Option<f64>,

    /// Upstream estimate of task complexity (carried for downstream consumers)
    #[serde(default)]
    pub task_complexity: Option<f64>,
}

impl ConsensusInput {
    pub fn new(original_content: impl Into<String>, submission_flow: SubmissionFlow) -> Self {
        Self {
            agent_responses: Vec::new(),
            original_content: original_content.into(),
            enhanced_content: None,
            submission_flow,
            user_reputation: None,
            task_complexity: None,
        }
    }

    pub fn with_responses(mut self, responses: Vec<AgentResponse>) -> Self {
        self.agent_responses = responses;
        self
    }

    pub fn with_enhanced_content(mut self, content: impl Into<String>) -> Self {
        self.enhanced_content = Some(content.into());
        self
    }
}

/// Expertise estimate used when weighting a vote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpertiseMetrics {
    pub task_match: f64,
    pub domain_expertise: f64,
    pub historical_accuracy: f64,
}

/// An agent verdict annotated with its computed influence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedVote {
    pub agent_id: String,
    pub provider: String,
    pub decision: VoteDecision,
    pub confidence: f64,
    pub reasoning: String,
    /// Influence weight, always within [0.1, 2.0]
    pub weight: f64,
    pub expertise: ExpertiseMetrics,
}

/// Rationale attached to a result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reasoning {
    pub primary: String,
    #[serde(default)]
    pub supporting: Vec<String>,
    #[serde(default)]
    pub dissenting: Vec<String>,
}

/// Provider and capability spread of the voting panel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DiversityMetrics {
    /// May exceed 1.0 by up to the 1.2x cross-provider bonus
    pub score: f64,
    pub provider_spread: f64,
    pub capability_spread: f64,
}

/// Cost accounting for an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EconomicsMetrics {
    /// Sum of successful response costs (USD)
    pub total_cost: f64,

    /// USD per quality point; +inf when quality is zero
    #[serde(with = "infinite_as_null")]
    pub cost_per_quality: f64,

    /// Quality points per USD; zero when nothing was spent
    pub efficiency: f64,
}

/// Risk signals, each within [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiskFactors {
    pub uncertainty: f64,
    pub novelty: f64,
    pub sensitivity: f64,
    pub adversarial: f64,
}

/// Follow-ups for the downstream action layer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendations {
    #[serde(default)]
    pub next_actions: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
    #[serde(default)]
    pub escalation_reasons: Vec<String>,
}

/// The auditable outcome of one consensus evaluation.
///
/// An evaluation with no usable votes is a fixed REJECT with zero
/// confidence and quality, but `economics.total_cost` still bills every
/// successful response, so it may be non-zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub decision: Decision,

    /// Risk-adjusted confidence (0.0 - 1.0)
    pub confidence: f64,

    /// Composite of consensus strength and mean confidence (0.0 - 1.0)
    pub quality_score: f64,

    pub votes: Vec<WeightedVote>,
    pub reasoning: Reasoning,
    pub diversity: DiversityMetrics,
    /// Spend on successful responses, including votes that were dropped
    pub economics: EconomicsMetrics,
    pub risk_factors: RiskFactors,
    pub recommendations: Recommendations,
}

/// JSON has no representation for infinity: write it as `null` and read
/// `null` back as +inf.
mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_projection() {
        let screening = AgentVerdict::Screening {
            approved: true,
            flags: vec![],
        };
        let enhancement = AgentVerdict::Enhancement {
            approved: false,
            enhanced_content: Some("Better text".to_string()),
        };
        let reasoning = AgentVerdict::Reasoning {
            recommendation: VoteDecision::Reject,
        };
        let consensus = AgentVerdict::Consensus {
            decision: VoteDecision::Approve,
        };

        assert_eq!(screening.decision(), VoteDecision::Approve);
        assert_eq!(enhancement.decision(), VoteDecision::Reject);
        assert_eq!(reasoning.decision(), VoteDecision::Reject);
        assert_eq!(consensus.decision(), VoteDecision::Approve);
    }

    #[test]
    fn test_verdict_tagged_yaml() {
        let yaml = r#"
kind: enhancement
approved: true
enhanced_content: "Dear Senator..."
"#;
        let verdict: AgentVerdict = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(
            verdict,
            AgentVerdict::Enhancement { approved: true, .. }
        ));
    }

    #[test]
    fn test_usable_response() {
        let ok = AgentResponse::new(
            "screener",
            AgentVerdict::Screening {
                approved: true,
                flags: vec![],
            },
            0.9,
        );
        assert!(ok.is_usable());

        assert!(!AgentResponse::failed("screener").is_usable());

        let mut nan = ok.clone();
        nan.confidence = f64::NAN;
        assert!(!nan.is_usable());
    }

    #[test]
    fn test_billable_cost_ignores_negative() {
        let response = AgentResponse::failed("a").with_cost(-1.0);
        assert_eq!(response.billable_cost(), 0.0);
        let response = AgentResponse::failed("a").with_cost(0.02);
        assert_eq!(response.billable_cost(), 0.02);
    }

    #[test]
    fn test_submission_flow_names() {
        let flow: SubmissionFlow = serde_json::from_str("\"protocol-tracked\"").unwrap();
        assert_eq!(flow, SubmissionFlow::ProtocolTracked);
        assert_eq!(SubmissionFlow::DirectDelivery.to_string(), "direct-delivery");
    }

    #[test]
    fn test_infinite_cost_per_quality_serializes_as_null() {
        let economics = EconomicsMetrics {
            total_cost: 0.01,
            cost_per_quality: f64::INFINITY,
            efficiency: 0.0,
        };
        let json = serde_json::to_value(economics).unwrap();
        assert!(json["cost_per_quality"].is_null());

        let back: EconomicsMetrics = serde_json::from_value(json).unwrap();
        assert!(back.cost_per_quality.is_infinite());
    }
}
