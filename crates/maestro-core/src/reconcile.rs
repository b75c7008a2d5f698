//! Snapshot/delta reconciliation of streamed reply fragments.
//!
//! The agent service may send either the whole reply so far (a snapshot) or
//! only the newly generated text (a delta), and nothing on the wire says
//! which. A fragment is treated as a snapshot when it is strictly longer than
//! the accumulated text and starts with it; everything else is appended.
//!
//! This is a heuristic. A delta that happens to extend the accumulated text
//! as a prefix is taken for a snapshot, and a snapshot that is not longer than
//! the accumulated text is appended as a delta. An explicit sequence number or
//! snapshot marker from the server would be needed to remove the ambiguity.

/// How a fragment relates to the accumulated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// The fragment carries the full reply so far and replaces the text.
    Snapshot,
    /// The fragment carries only new text and is appended.
    Delta,
}

/// Decide whether `fragment` is a snapshot or a delta relative to `current`.
#[must_use]
pub fn classify(current: &str, fragment: &str) -> FragmentKind {
    if fragment.len() > current.len() && fragment.starts_with(current) {
        FragmentKind::Snapshot
    } else {
        FragmentKind::Delta
    }
}

/// Merge `fragment` into `current` and return the new accumulated text.
#[must_use]
pub fn merge(current: &str, fragment: &str) -> String {
    match classify(current, fragment) {
        FragmentKind::Snapshot => fragment.to_string(),
        FragmentKind::Delta => {
            let mut merged = String::with_capacity(current.len() + fragment.len());
            merged.push_str(current);
            merged.push_str(fragment);
            merged
        }
    }
}

/// Merge `fragment` into `buffer` in place, returning how it was classified.
pub fn merge_into(buffer: &mut String, fragment: &str) -> FragmentKind {
    let kind = classify(buffer, fragment);
    match kind {
        FragmentKind::Snapshot => {
            buffer.clear();
            buffer.push_str(fragment);
        }
        FragmentKind::Delta => buffer.push_str(fragment),
    }
    kind
}
