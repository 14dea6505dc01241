//! Importance-score computation.
//!
//! A state is "important" when the choice of action matters there. Both
//! policies measure that from the q-value vector:
//!
//!   worst:  I(s) = max_a Q(s,a) - min_a Q(s,a)
//!   second: I(s) = max_a Q(s,a) - second_largest_a Q(s,a)
//!
//! `worst` captures the full spread between the best and worst action.
//! `second` captures how uniquely good the best action is: a state where two
//! actions are tied at the top scores 0 even if a third action is terrible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Which comparison the importance score is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ImportancePolicy {
    /// Spread between the best and worst action.
    Worst,
    /// Margin between the best and second-best action.
    Second,
}

/// Score a single q-value vector.
///
/// # Edge cases
///
/// - An empty vector fails with [`Error::DataIntegrity`].
/// - [`ImportancePolicy::Second`] on a single-action vector fails with
///   [`Error::DataIntegrity`]: there is no runner-up to compare against.
pub fn score(q_values: &[f64], policy: ImportancePolicy) -> Result<f64> {
    if q_values.is_empty() {
        return Err(Error::DataIntegrity("empty q-value vector".into()));
    }

    match policy {
        ImportancePolicy::Worst => {
            let max = q_values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let min = q_values.iter().cloned().fold(f64::INFINITY, f64::min);
            Ok(max - min)
        }
        ImportancePolicy::Second => {
            if q_values.len() < 2 {
                return Err(Error::DataIntegrity(
                    "second-best importance needs at least two actions".into(),
                ));
            }
            // One pass tracking the two largest values. Duplicated maxima
            // count twice, so a tied top pair scores 0.
            let mut largest = f64::NEG_INFINITY;
            let mut second = f64::NEG_INFINITY;
            for &v in q_values {
                if v > largest {
                    second = largest;
                    largest = v;
                } else if v > second {
                    second = v;
                }
            }
            Ok(largest - second)
        }
    }
}

/// Score every state in a q-value mapping.
///
/// Returns the mapping state -> importance, keyed ascending by state index.
/// Any malformed vector fails the whole computation.
pub fn compute_importance(
    q_values_by_state: &BTreeMap<usize, Vec<f64>>,
    policy: ImportancePolicy,
) -> Result<BTreeMap<usize, f64>> {
    let mut importance = BTreeMap::new();
    for (&state, q) in q_values_by_state {
        let value = score(q, policy).map_err(|e| match e {
            Error::DataIntegrity(msg) => Error::DataIntegrity(format!("state {state}: {msg}")),
            other => other,
        })?;
        importance.insert(state, value);
    }
    debug!(states = importance.len(), ?policy, "computed importance scores");
    Ok(importance)
}
