use serde::{Deserialize, Serialize};

use crate::importance::ImportancePolicy;
use crate::selection::diversity::DistanceMetric;

/// Complete configuration for a summarization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowreelConfig {
    pub importance: ImportanceConfig,
    pub selection: SelectionConfig,
    pub diversity: DiversityConfig,
}

/// Importance-scoring configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceConfig {
    /// How to collapse a per-action q-value vector into one scalar
    /// (default: worst).
    pub policy: ImportancePolicy,
}

/// Gap-constrained selection configuration, shared by all three selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Maximum number of important states in the summary, excluding context
    /// (default: 15).
    pub budget: usize,
    /// Number of states shown on each side of a chosen state (default: 10).
    pub context_length: usize,
    /// Number of states to skip beyond the context window before the next
    /// chosen state is admissible (default: 10).
    pub minimum_gap: usize,
    /// Lower clip bound for context windows. Defaults to the smallest
    /// observed state index when unset.
    pub minimum_state: Option<usize>,
    /// Upper clip bound for context windows. Defaults to the largest
    /// observed state index when unset.
    pub maximum_state: Option<usize>,
    /// Seed for the random-selection baseline. Unset = nondeterministic.
    pub seed: Option<u64>,
}

/// Diversity-gate configuration (HIGHLIGHTS-DIV only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityConfig {
    /// Distance metric for comparing feature vectors (default: euclidean).
    pub metric: DistanceMetric,
    /// Percentile of the sampled pairwise-distance distribution used as the
    /// minimum allowed distance between summary states (default: 3.0).
    pub percentile_threshold: f64,
    /// Number of states sampled (without replacement) to estimate the
    /// distance distribution (default: 10).
    pub subset_threshold: usize,
    /// Seed for the threshold subset draw. Unset = nondeterministic.
    pub seed: Option<u64>,
}

impl Default for ShowreelConfig {
    fn default() -> Self {
        Self {
            importance: ImportanceConfig {
                policy: ImportancePolicy::Worst,
            },
            selection: SelectionConfig::default(),
            diversity: DiversityConfig::default(),
        }
    }
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            budget: 15,
            context_length: 10,
            minimum_gap: 10,
            minimum_state: None,
            maximum_state: None,
            seed: None,
        }
    }
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Euclidean,
            percentile_threshold: 3.0,
            subset_threshold: 10,
            seed: None,
        }
    }
}
