//! Panel diversity scoring.
//!
//! Agreement that spans independent providers is worth more than the same
//! agreement coming from a single dominant provider.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{DiversityMetrics, VoteDecision, WeightedVote};

/// Capability-category diversity is not measured; this constant stands in.
pub const CAPABILITY_SPREAD: f64 = 0.8;

/// Multiplier applied when every provider agrees with the overall majority.
pub const CROSS_PROVIDER_BONUS: f64 = 1.2;

/// Panels smaller than this are scored as if they had this many seats.
const MIN_PANEL_SIZE: usize = 3;

/// Scores provider and capability spread.
pub struct DiversityScorer;

impl DiversityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, votes: &[WeightedVote]) -> DiversityMetrics {
        if votes.is_empty() {
            return DiversityMetrics::default();
        }

        let providers: BTreeSet<&str> = votes.iter().map(|v| v.provider.as_str()).collect();
        let provider_spread = providers.len() as f64 / votes.len().max(MIN_PANEL_SIZE) as f64;
        let capability_spread = CAPABILITY_SPREAD;

        let mut score = 0.6 * provider_spread + 0.4 * capability_spread;
        if self.agreement_crosses_providers(votes) {
            score *= CROSS_PROVIDER_BONUS;
        }

        DiversityMetrics {
            score,
            provider_spread,
            capability_spread,
        }
    }

    /// True when every provider's internal majority matches the overall one.
    fn agreement_crosses_providers(&self, votes: &[WeightedVote]) -> bool {
        let Some(overall) = majority(votes.iter()) else {
            return false;
        };

        let mut by_provider: BTreeMap<&str, Vec<&WeightedVote>> = BTreeMap::new();
        for vote in votes {
            by_provider.entry(vote.provider.as_str()).or_default().push(vote);
        }

        by_provider
            .values()
            .all(|group| majority(group.iter().copied()) == Some(overall))
    }
}

impl Default for DiversityScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Unweighted majority decision; `None` on a tie.
fn majority<'a>(votes: impl Iterator<Item = &'a WeightedVote>) -> Option<VoteDecision> {
    let (approve, reject) = votes.fold((0usize, 0usize), |(a, r), v| {
        if v.decision.is_approve() {
            (a + 1, r)
        } else {
            (a, r + 1)
        }
    });

    match approve.cmp(&reject) {
        std::cmp::Ordering::Greater => Some(VoteDecision::Approve),
        std::cmp::Ordering::Less => Some(VoteDecision::Reject),
        std::cmp::Ordering::Equal => None,
    }
}
