//! The HIGHLIGHTS summary selectors.
//!
//! All three selectors share one skeleton: walk a stream of candidate states,
//! admit each candidate only if it keeps enough index distance from every
//! already-accepted state, and stop at the budget. They differ in the stream
//! order and in the extra checks per candidate:
//!
//! - [`highlights`] -- candidates in descending importance order.
//! - [`highlights_div`] -- same order, plus a feature-space diversity gate
//!   against the context-expanded summary.
//! - [`random_state_selection`] -- candidates drawn with replacement under an
//!   optional seed; the baseline the importance-ranked variants are compared
//!   against.
//!
//! Selection never backtracks: the acceptance order fully determines the
//! result, and a summary smaller than the budget is a normal outcome.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{DiversityConfig, SelectionConfig};
use crate::error::{Error, Result};
use crate::selection::context::expand_with_context;
use crate::selection::diversity::{derive_threshold, nearest_in_summary};
use crate::selection::index::IntervalIndex;
use crate::trajectory::types::{StateRecord, TrajectoryStore};

// ---------------------------------------------------------------------------
// Result type
// ---------------------------------------------------------------------------

/// The output of one selection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Accepted important states, ascending, at most `budget` of them.
    pub states: Vec<usize>,
    /// Ordered, deduplicated union of the accepted states' clipped context
    /// windows -- the frames the video actually shows.
    pub states_with_context: Vec<usize>,
}

/// Per-candidate outcome, emitted on the debug log for every state examined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateDecision {
    Accepted,
    RejectedGap,
    RejectedDiversity,
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

fn validate_budget(budget: usize) -> Result<()> {
    if budget == 0 {
        return Err(Error::InvalidConfiguration(
            "budget must be positive".into(),
        ));
    }
    Ok(())
}

/// Clip bounds for context windows: explicit configuration wins, otherwise
/// the observed state range.
fn resolve_bounds(store: &TrajectoryStore, config: &SelectionConfig) -> (usize, usize) {
    let (observed_min, observed_max) = store.bounds().unwrap_or((0, 0));
    (
        config.minimum_state.unwrap_or(observed_min),
        config.maximum_state.unwrap_or(observed_max),
    )
}

/// Whether `state` keeps the required index distance from both neighbors it
/// would have in the summary.
///
/// Two accepted states must be at least `2 * context_length + minimum_gap`
/// apart so their context windows neither overlap nor close the gap between
/// them.
fn gap_admits(index: &IntervalIndex, state: usize, config: &SelectionConfig) -> bool {
    let (before, after) = index.locate(state);
    let reach = (2 * config.context_length + config.minimum_gap) as i64;
    let s = state as i64;

    if let Some(after) = after {
        if s + reach > after as i64 {
            return false;
        }
    }
    if let Some(before) = before {
        if s - reach < before as i64 {
            return false;
        }
    }
    true
}

/// Stable descending sort by importance: equally important states keep their
/// ascending state order.
fn rank_by_importance(mut records: Vec<StateRecord>) -> Vec<StateRecord> {
    records.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.importance)));
    records
}

// ---------------------------------------------------------------------------
// HIGHLIGHTS
// ---------------------------------------------------------------------------

/// Greedy gap-constrained selection over importance-ranked candidates.
///
/// Iterates states from most to least important, accepting each candidate
/// that keeps the required distance from every accepted state, until the
/// budget is met or candidates run out.
pub fn highlights(
    store: &TrajectoryStore,
    importance: &BTreeMap<usize, f64>,
    config: &SelectionConfig,
) -> Result<Summary> {
    validate_budget(config.budget)?;
    if store.is_empty() {
        return Ok(Summary::default());
    }

    let ranked = rank_by_importance(store.records(importance)?);
    let (min_state, max_state) = resolve_bounds(store, config);

    let mut index = IntervalIndex::new();
    for record in &ranked {
        if !gap_admits(&index, record.state, config) {
            debug!(
                state = record.state,
                decision = ?CandidateDecision::RejectedGap,
                "candidate rejected"
            );
            continue;
        }
        index.insert(record.state);
        debug!(
            state = record.state,
            importance = record.importance,
            decision = ?CandidateDecision::Accepted,
            "candidate accepted"
        );
        if index.len() == config.budget {
            break;
        }
    }

    let states_with_context =
        expand_with_context(index.as_slice(), config.context_length, min_state, max_state);
    let states = index.into_vec();
    info!(
        chosen = states.len(),
        budget = config.budget,
        displayed = states_with_context.len(),
        "highlights selection finished"
    );
    Ok(Summary {
        states,
        states_with_context,
    })
}

// ---------------------------------------------------------------------------
// HIGHLIGHTS-DIV
// ---------------------------------------------------------------------------

/// Diversity-aware greedy selection.
///
/// Like [`highlights`], but a candidate that passes the gap check must also
/// keep more than the derived threshold distance (in feature space) from
/// every state the summary currently *displays* -- the context-expanded set,
/// not just the accepted states. A state visually similar to any shown frame
/// adds nothing to the summary even if its own index is far away.
///
/// The displayed set is recomputed from scratch after every acceptance;
/// budget and context length are small, so the quadratic recomputation is
/// cheap.
pub fn highlights_div(
    store: &TrajectoryStore,
    importance: &BTreeMap<usize, f64>,
    config: &SelectionConfig,
    div: &DiversityConfig,
) -> Result<Summary> {
    validate_budget(config.budget)?;
    if store.is_empty() {
        return Ok(Summary::default());
    }
    if !store.has_features() {
        return Err(Error::DataIntegrity(
            "diversity-aware selection requires feature vectors".into(),
        ));
    }

    let threshold = derive_threshold(
        store,
        div.subset_threshold,
        div.percentile_threshold,
        div.metric,
        div.seed,
    )?;
    let ranked = rank_by_importance(store.records(importance)?);
    let (min_state, max_state) = resolve_bounds(store, config);

    let mut index = IntervalIndex::new();
    let mut states_with_context: Vec<usize> = Vec::new();

    for record in &ranked {
        if !gap_admits(&index, record.state, config) {
            debug!(
                state = record.state,
                decision = ?CandidateDecision::RejectedGap,
                "candidate rejected"
            );
            continue;
        }

        let features = record.features.as_deref().ok_or_else(|| {
            Error::DataIntegrity(format!("state {} has no feature vector", record.state))
        })?;
        let nearest = nearest_in_summary(features, &states_with_context, store, div.metric)?;
        let admitted = match nearest {
            None => true,
            Some((_, distance)) => distance > threshold,
        };
        if !admitted {
            let (nearest_state, distance) = nearest.unwrap_or((0, 0.0));
            debug!(
                state = record.state,
                nearest_state,
                distance,
                threshold,
                decision = ?CandidateDecision::RejectedDiversity,
                "candidate rejected"
            );
            continue;
        }

        index.insert(record.state);
        states_with_context =
            expand_with_context(index.as_slice(), config.context_length, min_state, max_state);
        debug!(
            state = record.state,
            importance = record.importance,
            decision = ?CandidateDecision::Accepted,
            "candidate accepted"
        );

        if index.len() == config.budget {
            info!("hit budget limit");
            break;
        }
    }

    let states = index.into_vec();
    info!(
        chosen = states.len(),
        budget = config.budget,
        threshold,
        displayed = states_with_context.len(),
        "highlights-div selection finished"
    );
    Ok(Summary {
        states,
        states_with_context,
    })
}

// ---------------------------------------------------------------------------
// Random baseline
// ---------------------------------------------------------------------------

/// Random summary baseline.
///
/// Draws as many candidates as there are states, **with replacement**, under
/// `config.seed` (unseeded = nondeterministic), and runs them through the
/// same gap-constrained loop. A revisited or conflicting draw is rejected
/// like any other candidate, so the summary can end up below budget even
/// when a non-conflicting set exists.
pub fn random_state_selection(store: &TrajectoryStore, config: &SelectionConfig) -> Result<Summary> {
    validate_budget(config.budget)?;
    if store.is_empty() {
        return Ok(Summary::default());
    }

    let states: Vec<usize> = store.q_values().keys().copied().collect();
    let (min_state, max_state) = resolve_bounds(store, config);

    let mut rng = match config.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    let mut index = IntervalIndex::new();
    for _ in 0..states.len() {
        let state = states[rng.gen_range(0..states.len())];
        if !gap_admits(&index, state, config) {
            debug!(
                state,
                decision = ?CandidateDecision::RejectedGap,
                "candidate rejected"
            );
            continue;
        }
        index.insert(state);
        debug!(state, decision = ?CandidateDecision::Accepted, "candidate accepted");
        if index.len() == config.budget {
            break;
        }
    }

    let states_with_context =
        expand_with_context(index.as_slice(), config.context_length, min_state, max_state);
    let states = index.into_vec();
    info!(
        chosen = states.len(),
        budget = config.budget,
        seeded = config.seed.is_some(),
        "random selection finished"
    );
    Ok(Summary {
        states,
        states_with_context,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
