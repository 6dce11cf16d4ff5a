//! Consensus configuration: thresholds, weights and penalties.
//!
//! A configuration is a plain value. Engines hold it behind a
//! [`SharedConfiguration`], which hands each evaluation an immutable
//! snapshot and swaps whole values on update, so a concurrent update can
//! never be observed half-applied.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::types::SubmissionFlow;

/// Errors that can occur when loading a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Tunable decision policy parameters.
///
/// Every field may be omitted from a document; missing fields take their
/// default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfiguration {
    /// Final approval ratio needed to approve
    pub approval_threshold: f64,

    /// Final approval ratio at or below which content is rejected
    pub rejection_threshold: f64,

    /// Mean confidence needed to approve
    pub confidence_threshold: f64,

    /// Quality bar for direct-delivery submissions
    pub minimum_quality: f64,

    /// Quality bar for protocol-tracked submissions
    pub protocol_tracked_quality: f64,

    /// Contribution of diversity score to the approval ratio
    pub diversity_weight: f64,

    /// Contribution of expertise to vote weight
    pub expertise_weight: f64,

    /// Penalty per unit of uncertainty
    pub uncertainty_penalty: f64,

    /// Penalty per unit of novelty
    pub novelty_penalty: f64,

    /// Whether adversarial-pattern detection runs at all
    pub adversarial_detection_enabled: bool,

    /// Maximum USD per quality point
    pub cost_quality_ratio: f64,

    /// Maximum total USD per evaluation
    pub budget_constraint: f64,
}

impl Default for ConsensusConfiguration {
    fn default() -> Self {
        Self {
            approval_threshold: 0.7,
            rejection_threshold: 0.3,
            confidence_threshold: 0.6,
            minimum_quality: 0.5,
            protocol_tracked_quality: 0.8,
            diversity_weight: 0.15,
            expertise_weight: 0.25,
            uncertainty_penalty: 0.2,
            novelty_penalty: 0.1,
            adversarial_detection_enabled: true,
            cost_quality_ratio: 0.05,
            budget_constraint: 0.10,
        }
    }
}

impl ConsensusConfiguration {
    /// Parse a configuration from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a configuration from JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Quality bar that applies to a submission flow.
    pub fn quality_threshold(&self, flow: SubmissionFlow) -> f64 {
        match flow {
            SubmissionFlow::ProtocolTracked => self.protocol_tracked_quality,
            SubmissionFlow::DirectDelivery => self.minimum_quality,
        }
    }

    /// Notes on suspicious parameter combinations.
    ///
    /// These are diagnostics only. The policy formulas stay deterministic
    /// for any configuration, so nothing here is enforced.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.rejection_threshold >= self.approval_threshold {
            warnings.push(format!(
                "rejection_threshold ({}) is not below approval_threshold ({}); escalation is unreachable",
                self.rejection_threshold, self.approval_threshold
            ));
        }

        let unit_fields = [
            ("approval_threshold", self.approval_threshold),
            ("rejection_threshold", self.rejection_threshold),
            ("confidence_threshold", self.confidence_threshold),
            ("minimum_quality", self.minimum_quality),
            ("protocol_tracked_quality", self.protocol_tracked_quality),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                warnings.push(format!("{} ({}) is outside [0, 1]", name, value));
            }
        }

        let non_negative_fields = [
            ("diversity_weight", self.diversity_weight),
            ("expertise_weight", self.expertise_weight),
            ("uncertainty_penalty", self.uncertainty_penalty),
            ("novelty_penalty", self.novelty_penalty),
            ("cost_quality_ratio", self.cost_quality_ratio),
            ("budget_constraint", self.budget_constraint),
        ];
        for (name, value) in non_negative_fields {
            if value < 0.0 {
                warnings.push(format!("{} ({}) is negative", name, value));
            }
        }

        warnings
    }
}

/// A configuration shared between an engine and its callers.
///
/// Readers take an `Arc` snapshot; writers replace the whole value under the
/// write lock.
#[derive(Debug, Clone, Default)]
pub struct SharedConfiguration {
    inner: Arc<RwLock<Arc<ConsensusConfiguration>>>,
}

impl SharedConfiguration {
    pub fn new(config: ConsensusConfiguration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// The configuration in effect right now.
    pub fn snapshot(&self) -> Arc<ConsensusConfiguration> {
        let guard = self.inner.read();
        Arc::clone(&*guard)
    }

    /// Swap in a new configuration, returning the previous one.
    pub fn replace(&self, config: ConsensusConfiguration) -> Arc<ConsensusConfiguration> {
        log_warnings(&config);
        let mut guard = self.inner.write();
        std::mem::replace(&mut *guard, Arc::new(config))
    }

    /// Derive a new configuration from the current one and swap it in.
    ///
    /// The closure runs on a private copy while the write lock is held, so
    /// concurrent updates are serialized and never interleave.
    pub fn update<F>(&self, f: F) -> Arc<ConsensusConfiguration>
    where
        F: FnOnce(&mut ConsensusConfiguration),
    {
        let mut guard = self.inner.write();
        let mut next = ConsensusConfiguration::clone(&guard);
        f(&mut next);
        log_warnings(&next);
        let next = Arc::new(next);
        *guard = Arc::clone(&next);
        next
    }
}

impl From<ConsensusConfiguration> for SharedConfiguration {
    fn from(config: ConsensusConfiguration) -> Self {
        Self::new(config)
    }
}

fn log_warnings(config: &ConsensusConfiguration) {
    for warning in config.warnings() {
        tracing::warn!(%warning, "Suspicious consensus configuration");
    }
}
