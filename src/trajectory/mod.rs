//! Trajectory data for recorded agent episodes.
//!
//! This module provides:
//! - [`types::StateRecord`] -- one scored state of a trajectory, the unit the
//!   selectors rank and accept.
//! - [`types::TrajectoryStore`] -- the validated container mapping state
//!   indices to q-value vectors and (optionally) feature vectors.
//! - [`io`] -- loaders for the per-state text files an agent run leaves on
//!   disk, and writers for the summary manifest consumed by the rendering
//!   pipeline.

pub mod io;
pub mod types;

// Re-export the most commonly used items at the module level.
pub use io::{read_feature_files, read_q_value_files, SummaryManifest};
pub use types::{StateRecord, TrajectoryStore};
