//! Core trajectory data types used throughout the summarization pipeline.
//!
//! A recorded episode is a sequence of integer state indices, each carrying a
//! per-action q-value vector and, for the diversity-aware selector, a feature
//! vector (e.g. the activations of the network's penultimate layer). The
//! [`TrajectoryStore`] validates these mappings once at construction so the
//! selectors can assume consistent input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Single state
// ---------------------------------------------------------------------------

/// A single scored state within a trajectory.
///
/// Constructed once per state when a selector ranks its candidates; the
/// selectors never reach back into the raw mappings for fields they already
/// carry here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    /// Zero-based index of this state within the recorded trajectory.
    pub state: usize,
    /// Scalar importance score (higher = more interesting).
    pub importance: f64,
    /// Per-action value estimates at this state.
    pub q_values: Vec<f64>,
    /// Feature vector for distance comparisons. `None` when the run does not
    /// use the diversity gate.
    pub features: Option<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// Trajectory store
// ---------------------------------------------------------------------------

/// Validated per-state data for one recorded trajectory.
///
/// Keys are state indices; iteration order is ascending state index, which is
/// also the tie-break order for equally important candidates. Both mappings
/// are immutable once the store is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrajectoryStore {
    q_values: BTreeMap<usize, Vec<f64>>,
    features: BTreeMap<usize, Vec<f64>>,
}

impl TrajectoryStore {
    /// Build a store from q-values alone (no diversity gate).
    ///
    /// Fails with [`Error::DataIntegrity`] if any state has an empty q-value
    /// vector.
    pub fn new(q_values: BTreeMap<usize, Vec<f64>>) -> Result<Self> {
        for (state, q) in &q_values {
            if q.is_empty() {
                return Err(Error::DataIntegrity(format!(
                    "state {state} has an empty q-value vector"
                )));
            }
        }
        Ok(Self {
            q_values,
            features: BTreeMap::new(),
        })
    }

    /// Build a store from q-values and feature vectors.
    ///
    /// Fails with [`Error::DataIntegrity`] if:
    /// - any state has an empty q-value vector,
    /// - the two mappings do not cover the same set of states,
    /// - the feature vectors do not all share one length.
    pub fn with_features(
        q_values: BTreeMap<usize, Vec<f64>>,
        features: BTreeMap<usize, Vec<f64>>,
    ) -> Result<Self> {
        let store = Self::new(q_values)?;
        let Self { q_values, .. } = store;

        for state in q_values.keys() {
            if !features.contains_key(state) {
                return Err(Error::DataIntegrity(format!(
                    "state {state} has q-values but no feature vector"
                )));
            }
        }
        for state in features.keys() {
            if !q_values.contains_key(state) {
                return Err(Error::DataIntegrity(format!(
                    "state {state} has a feature vector but no q-values"
                )));
            }
        }

        let mut expected_len: Option<usize> = None;
        for (state, f) in &features {
            match expected_len {
                None => expected_len = Some(f.len()),
                Some(len) if f.len() != len => {
                    return Err(Error::DataIntegrity(format!(
                        "feature vector of state {state} has length {}, expected {len}",
                        f.len()
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(Self { q_values, features })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Number of states in the store.
    pub fn len(&self) -> usize {
        self.q_values.len()
    }

    /// Whether the store holds no states.
    pub fn is_empty(&self) -> bool {
        self.q_values.is_empty()
    }

    /// The q-value mapping, keyed by state index.
    pub fn q_values(&self) -> &BTreeMap<usize, Vec<f64>> {
        &self.q_values
    }

    /// The feature mapping, keyed by state index. Empty when the store was
    /// built without features.
    pub fn features(&self) -> &BTreeMap<usize, Vec<f64>> {
        &self.features
    }

    /// Whether feature vectors are available for the diversity gate.
    pub fn has_features(&self) -> bool {
        !self.features.is_empty()
    }

    /// The feature vector of one state.
    ///
    /// Fails with [`Error::DataIntegrity`] when the state carries no feature
    /// vector; the diversity gate compares against context states, so every
    /// state inside the clip bounds must have one.
    pub fn feature_of(&self, state: usize) -> Result<&[f64]> {
        self.features
            .get(&state)
            .map(|f| f.as_slice())
            .ok_or_else(|| {
                Error::DataIntegrity(format!("state {state} has no feature vector"))
            })
    }

    /// Smallest and largest observed state index, or `None` for an empty
    /// store.
    pub fn bounds(&self) -> Option<(usize, usize)> {
        let min = *self.q_values.keys().next()?;
        let max = *self.q_values.keys().next_back()?;
        Some((min, max))
    }

    /// Join the store with an importance mapping into one [`StateRecord`] per
    /// state, ascending by state index.
    ///
    /// Fails with [`Error::DataIntegrity`] when a stored state has no
    /// importance score.
    pub fn records(&self, importance: &BTreeMap<usize, f64>) -> Result<Vec<StateRecord>> {
        let mut records = Vec::with_capacity(self.q_values.len());
        for (&state, q) in &self.q_values {
            let &score = importance.get(&state).ok_or_else(|| {
                Error::DataIntegrity(format!("state {state} has no importance score"))
            })?;
            records.push(StateRecord {
                state,
                importance: score,
                q_values: q.clone(),
                features: self.features.get(&state).cloned(),
            });
        }
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
