//! State-selection core.
//!
//! This module implements the summary selectors:
//!
//! 1. **Index** ([`index`]) -- the ordered [`IntervalIndex`] of accepted
//!    states with predecessor/successor lookup.
//! 2. **Context** ([`context`]) -- expansion of accepted states into clipped
//!    context windows and their ordered, deduplicated union.
//! 3. **Diversity** ([`diversity`]) -- feature-space distance metrics, the
//!    nearest-accepted-state scan, and data-calibrated threshold derivation.
//! 4. **Highlights** ([`highlights`]) -- the three selectors: greedy
//!    HIGHLIGHTS, diversity-aware HIGHLIGHTS-DIV, and the random baseline.

pub mod context;
pub mod diversity;
pub mod highlights;
pub mod index;

// Re-export the most commonly used items at the module level.
pub use context::expand_with_context;
pub use diversity::{derive_threshold, nearest_in_summary, DistanceMetric};
pub use highlights::{highlights, highlights_div, random_state_selection, Summary};
pub use index::IntervalIndex;
