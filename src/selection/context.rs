//! Context-window expansion.
//!
//! An accepted state is shown together with the `context_length` states on
//! each side of it. The displayed set is the union of these windows, clipped
//! to the observed state range, as one ascending, duplicate-free sequence.

/// Expand accepted states into the ordered, deduplicated union of their
/// clipped context windows.
///
/// Each state `s` contributes the inclusive window
/// `[max(min_state, s - context_length), min(max_state, s + context_length)]`.
/// `accepted` must be ascending (the [`IntervalIndex`](super::IntervalIndex)
/// maintains this).
pub fn expand_with_context(
    accepted: &[usize],
    context_length: usize,
    min_state: usize,
    max_state: usize,
) -> Vec<usize> {
    let mut expanded = Vec::with_capacity(accepted.len() * (2 * context_length + 1));

    for &state in accepted {
        let lo = state.saturating_sub(context_length).max(min_state);
        let hi = (state + context_length).min(max_state);
        if lo > hi {
            // Window fell entirely outside the clip bounds.
            continue;
        }
        // Windows arrive in ascending order of their start, so skipping past
        // the last emitted index both deduplicates and merges overlaps.
        let start = match expanded.last() {
            Some(&last) if last >= lo => last + 1,
            _ => lo,
        };
        expanded.extend(start..=hi);
    }

    expanded
}
