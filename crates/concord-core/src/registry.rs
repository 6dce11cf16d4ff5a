//! Agent capability directory.
//!
//! The engine only ever reads capabilities. `CapabilityRegistry` is an
//! indexed implementation; callers with their own store implement
//! [`CapabilityDirectory`] directly.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur when loading a capability registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Failed to read registry file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// What an agent is and how much it can be trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentCapability {
    pub agent_id: String,

    /// Model provider backing the agent (e.g., "anthropic")
    pub provider: String,

    /// Historical reliability (0.0 - 1.0); out-of-range values are clamped
    /// when weighing votes
    pub reliability: f64,

    /// Declared capability tags
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Declared expertise-domain tags
    #[serde(default)]
    pub expertise: Vec<String>,
}

impl AgentCapability {
    pub fn new(agent_id: impl Into<String>, provider: impl Into<String>, reliability: f64) -> Self {
        Self {
            agent_id: agent_id.into(),
            provider: provider.into(),
            reliability,
            capabilities: Vec::new(),
            expertise: Vec::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expertise<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expertise = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_expertise(&self, tag: &str) -> bool {
        self.expertise.iter().any(|t| t == tag)
    }

    /// Reliability clamped to [0, 1]; NaN counts as 0.
    pub fn effective_reliability(&self) -> f64 {
        if self.reliability.is_nan() {
            0.0
        } else {
            self.reliability.clamp(0.0, 1.0)
        }
    }
}

/// Read-only lookup of agent capabilities.
pub trait CapabilityDirectory: Send + Sync {
    /// Resolve an agent id. `None` means the agent is unknown.
    fn lookup(&self, agent_id: &str) -> Option<&AgentCapability>;
}

/// Capability directory indexed by agent id.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    agents: HashMap<String, AgentCapability>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability.
    ///
    /// The first capability registered for an id wins; returns `false` when
    /// the id was already present.
    pub fn register(&mut self, capability: AgentCapability) -> bool {
        if self.agents.contains_key(&capability.agent_id) {
            tracing::debug!(agent_id = %capability.agent_id, "Duplicate capability ignored");
            return false;
        }
        if !(0.0..=1.0).contains(&capability.reliability) {
            tracing::warn!(
                agent_id = %capability.agent_id,
                reliability = capability.reliability,
                "Reliability outside [0, 1], clamping"
            );
        }
        self.agents.insert(capability.agent_id.clone(), capability);
        true
    }

    /// Parse a list of capabilities from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, RegistryError> {
        let list: Vec<AgentCapability> = serde_yaml::from_str(yaml)?;
        Ok(list.into_iter().collect())
    }

    /// Parse a list of capabilities from JSON string.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let list: Vec<AgentCapability> = serde_json::from_str(json)?;
        Ok(list.into_iter().collect())
    }

    /// Parse a list of capabilities from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a list of capabilities from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl CapabilityDirectory for CapabilityRegistry {
    fn lookup(&self, agent_id: &str) -> Option<&AgentCapability> {
        self.agents.get(agent_id)
    }
}

impl FromIterator<AgentCapability> for CapabilityRegistry {
    fn from_iter<T: IntoIterator<Item = AgentCapability>>(iter: T) -> Self {
        let mut registry = Self::new();
        for capability in iter {
            registry.register(capability);
        }
        registry
    }
}
