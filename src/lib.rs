//! Showreel: highlight-based summarization of recorded agent trajectories.
//!
//! Implements the HIGHLIGHTS family of summary selectors: given per-state
//! q-value vectors from a recorded episode, score each state's importance,
//! then greedily pick a budget-bounded, well-spaced set of states (optionally
//! enforcing feature-space diversity) and expand each pick into a context
//! window for display.

pub mod config;
pub mod error;
pub mod importance;
pub mod selection;
pub mod trajectory;
