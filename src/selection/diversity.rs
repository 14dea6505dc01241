//! Feature-space diversity gate.
//!
//! The diversity-aware selector rejects candidates that look too similar to
//! states already in the summary. "Too similar" is calibrated from the data:
//! a random subset of states is drawn, all pairwise distances within the
//! subset are computed, and a low percentile of that distribution becomes the
//! minimum distance a new summary state must keep from every accepted one.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::trajectory::types::TrajectoryStore;

// ---------------------------------------------------------------------------
// Distance metrics
// ---------------------------------------------------------------------------

/// Distance metric for comparing state feature vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Straight-line distance. Sensitive to magnitude.
    Euclidean,
    /// One minus the cosine similarity. Sensitive to direction only.
    Cosine,
}

impl DistanceMetric {
    /// Distance between two feature vectors.
    ///
    /// Fails with [`Error::DataIntegrity`] on a length mismatch. For the
    /// cosine metric a zero vector has no direction, so its similarity to
    /// anything is taken as 0 (distance 1).
    pub fn distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(Error::DataIntegrity(format!(
                "feature length mismatch: {} vs {}",
                a.len(),
                b.len()
            )));
        }

        match self {
            DistanceMetric::Euclidean => {
                let sum_sq: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();
                Ok(sum_sq.sqrt())
            }
            DistanceMetric::Cosine => Ok(1.0 - cosine_similarity(a, b)),
        }
    }
}

/// Computes the cosine similarity between two vectors.
///
/// Returns 0.0 if either vector is the zero vector (to avoid division by
/// zero).
fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

// ---------------------------------------------------------------------------
// Nearest accepted state
// ---------------------------------------------------------------------------

/// Find the accepted state most similar to a candidate.
///
/// Linear scan over `comparison_states` (the context-expanded summary),
/// comparing each state's feature vector against `candidate_features`.
/// Returns the minimum-distance state and its distance, or `None` when the
/// comparison set is empty.
///
/// Every comparison state must carry a feature vector in `store`; a gap in
/// the trajectory's feature files surfaces here as
/// [`Error::DataIntegrity`].
pub fn nearest_in_summary(
    candidate_features: &[f64],
    comparison_states: &[usize],
    store: &TrajectoryStore,
    metric: DistanceMetric,
) -> Result<Option<(usize, f64)>> {
    let mut nearest: Option<(usize, f64)> = None;

    for &state in comparison_states {
        let features = store.feature_of(state)?;
        let distance = metric.distance(features, candidate_features)?;
        if nearest.map_or(true, |(_, best)| distance < best) {
            nearest = Some((state, distance));
        }
    }

    Ok(nearest)
}

// ---------------------------------------------------------------------------
// Threshold derivation
// ---------------------------------------------------------------------------

/// Derive the diversity threshold from the data.
///
/// Draws `subset_threshold` feature vectors without replacement, computes the
/// distance of every unordered pair within the subset, and returns the
/// `percentile`-th percentile (linear interpolation) of that distribution.
///
/// Fails with [`Error::InvalidConfiguration`] when `subset_threshold` is
/// below 2 (no pairs to measure) or exceeds the number of feature-bearing
/// states (cannot sample without replacement beyond the population).
pub fn derive_threshold(
    store: &TrajectoryStore,
    subset_threshold: usize,
    percentile: f64,
    metric: DistanceMetric,
    seed: Option<u64>,
) -> Result<f64> {
    let population: Vec<&Vec<f64>> = store.features().values().collect();

    if subset_threshold < 2 {
        return Err(Error::InvalidConfiguration(format!(
            "subset_threshold must be at least 2, got {subset_threshold}"
        )));
    }
    if subset_threshold > population.len() {
        return Err(Error::InvalidConfiguration(format!(
            "subset_threshold {subset_threshold} exceeds the {} feature-bearing states",
            population.len()
        )));
    }

    let mut rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let subset: Vec<&Vec<f64>> = population
        .choose_multiple(&mut rng, subset_threshold)
        .copied()
        .collect();

    // Pair ordering does not affect the percentile, so a plain nested loop
    // over unordered pairs is enough.
    let mut distances = Vec::with_capacity(subset.len() * (subset.len() - 1) / 2);
    for i in 0..subset.len() {
        for j in (i + 1)..subset.len() {
            distances.push(metric.distance(subset[i], subset[j])?);
        }
    }
    distances.sort_by(|a, b| a.total_cmp(b));

    let threshold = percentile_of_sorted(&distances, percentile);
    debug!(
        threshold,
        pairs = distances.len(),
        subset = subset_threshold,
        "derived diversity threshold"
    );
    Ok(threshold)
}

/// The `p`-th percentile (0..=100) of an ascending-sorted slice, using linear
/// interpolation between the two nearest ranks.
fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "percentile of empty distribution");
    if sorted.len() == 1 {
        return sorted[0];
    }

    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn store_with_features(features: &[(usize, &[f64])]) -> TrajectoryStore {
        let q: BTreeMap<usize, Vec<f64>> =
            features.iter().map(|(s, _)| (*s, vec![0.0, 1.0])).collect();
        let f: BTreeMap<usize, Vec<f64>> =
            features.iter().map(|(s, v)| (*s, v.to_vec())).collect();
        TrajectoryStore::with_features(q, f).unwrap()
    }

    // ------------------------------------------------------------------
    // Metrics
    // ------------------------------------------------------------------

    #[test]
    fn test_euclidean_distance() {
        let d = DistanceMetric::Euclidean
            .distance(&[0.0, 0.0], &[3.0, 4.0])
            .unwrap();
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_euclidean_identical_is_zero() {
        let v = [1.5, -2.0, 0.25];
        let d = DistanceMetric::Euclidean.distance(&v, &v).unwrap();
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_cosine_identical_is_zero() {
        let v = [1.0, 2.0, 3.0];
        let d = DistanceMetric::Cosine.distance(&v, &v).unwrap();
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_cosine_orthogonal_is_one() {
        let d = DistanceMetric::Cosine
            .distance(&[1.0, 0.0], &[0.0, 1.0])
            .unwrap();
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_opposite_is_two() {
        let d = DistanceMetric::Cosine
            .distance(&[1.0, 0.0], &[-1.0, 0.0])
            .unwrap();
        assert!((d - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let d = DistanceMetric::Cosine
            .distance(&[0.0, 0.0], &[1.0, 2.0])
            .unwrap();
        assert!((d - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_mismatch_fails() {
        for metric in [DistanceMetric::Euclidean, DistanceMetric::Cosine] {
            let err = metric.distance(&[1.0], &[1.0, 2.0]).unwrap_err();
            assert!(matches!(err, Error::DataIntegrity(_)));
        }
    }

    // ------------------------------------------------------------------
    // nearest_in_summary
    // ------------------------------------------------------------------

    #[test]
    fn test_nearest_empty_comparison_set() {
        let store = store_with_features(&[(0, &[0.0, 0.0])]);
        let nearest =
            nearest_in_summary(&[1.0, 1.0], &[], &store, DistanceMetric::Euclidean).unwrap();
        assert!(nearest.is_none());
    }

    #[test]
    fn test_nearest_picks_minimum() {
        let store = store_with_features(&[
            (0, &[0.0, 0.0]),
            (1, &[5.0, 0.0]),
            (2, &[1.0, 1.0]),
        ]);

        let (state, distance) = nearest_in_summary(
            &[1.0, 0.5],
            &[0, 1, 2],
            &store,
            DistanceMetric::Euclidean,
        )
        .unwrap()
        .unwrap();

        assert_eq!(state, 2);
        assert!((distance - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_nearest_missing_feature_fails() {
        let store = store_with_features(&[(0, &[0.0, 0.0])]);
        let err = nearest_in_summary(&[1.0, 1.0], &[0, 9], &store, DistanceMetric::Euclidean)
            .unwrap_err();
        assert!(matches!(err, Error::DataIntegrity(_)));
    }

    // ------------------------------------------------------------------
    // Threshold derivation
    // ------------------------------------------------------------------

    #[test]
    fn test_percentile_interpolation() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((percentile_of_sorted(&sorted, 0.0) - 1.0).abs() < 1e-9);
        assert!((percentile_of_sorted(&sorted, 100.0) - 5.0).abs() < 1e-9);
        assert!((percentile_of_sorted(&sorted, 50.0) - 3.0).abs() < 1e-9);
        // Rank 0.25 * 4 = 1.0 exactly.
        assert!((percentile_of_sorted(&sorted, 25.0) - 2.0).abs() < 1e-9);
        // Rank 0.1 * 4 = 0.4 -> 1.0 * 0.6 + 2.0 * 0.4.
        assert!((percentile_of_sorted(&sorted, 10.0) - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_derive_threshold_full_population() {
        // Three collinear points: pairwise distances 1, 1, 2.
        let store = store_with_features(&[
            (0, &[0.0, 0.0]),
            (1, &[1.0, 0.0]),
            (2, &[2.0, 0.0]),
        ]);

        let t = derive_threshold(&store, 3, 0.0, DistanceMetric::Euclidean, Some(7)).unwrap();
        assert!((t - 1.0).abs() < 1e-9);

        let t = derive_threshold(&store, 3, 100.0, DistanceMetric::Euclidean, Some(7)).unwrap();
        assert!((t - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_derive_threshold_deterministic_under_seed() {
        let store = store_with_features(&[
            (0, &[0.0, 0.0]),
            (1, &[1.0, 3.0]),
            (2, &[4.0, 0.5]),
            (3, &[2.0, 2.0]),
            (4, &[0.5, 1.5]),
        ]);

        let a = derive_threshold(&store, 3, 3.0, DistanceMetric::Euclidean, Some(11)).unwrap();
        let b = derive_threshold(&store, 3, 3.0, DistanceMetric::Euclidean, Some(11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_subset_larger_than_population_fails() {
        let store = store_with_features(&[(0, &[0.0]), (1, &[1.0])]);
        let err =
            derive_threshold(&store, 3, 3.0, DistanceMetric::Euclidean, Some(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_subset_below_two_fails() {
        let store = store_with_features(&[(0, &[0.0]), (1, &[1.0])]);
        let err =
            derive_threshold(&store, 1, 3.0, DistanceMetric::Euclidean, Some(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }
}
