//! Importance scoring for trajectory states.
//!
//! Converts a state's per-action q-value vector into one scalar that ranks
//! how interesting the state is for the summary. Two policies are available:
//! the full-range spread (`worst`) and the best-versus-runner-up margin
//! (`second`).

pub mod score;

pub use score::{compute_importance, score, ImportancePolicy};
