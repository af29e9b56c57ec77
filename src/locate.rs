//! Exact-match relocation for stale selections.
//!
//! When the buffer has mutated between capture and apply, the captured
//! offsets may point at different content. Relocation re-finds the captured
//! text: the original window first, then the exact occurrence nearest to the
//! original start offset. Nothing fuzzy is ever applied - a selection that
//! cannot be relocated exactly fails, because a misplaced splice corrupts
//! user content invisibly.

use crate::selection::Selection;

/// A splice target resolved against the buffer content at apply time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSpan {
    pub start: usize,
    pub end: usize,
}

/// Re-find the selected text in `content`.
///
/// Tie-break when multiple exact occurrences exist: smallest absolute
/// distance from the original start, then the lower offset. This
/// approximates "the place the user clicked" without positional tracking
/// through arbitrary edits.
pub(crate) fn relocate(content: &str, selection: &Selection) -> Option<ResolvedSpan> {
    let needle = selection.selected_text();
    let origin = selection.start();

    // Fast path: the original window still holds the selected text.
    if content.get(origin..selection.end()) == Some(needle) {
        return Some(ResolvedSpan {
            start: origin,
            end: selection.end(),
        });
    }

    content
        .match_indices(needle)
        .map(|(at, _)| at)
        .min_by_key(|at| (at.abs_diff(origin), *at))
        .map(|at| ResolvedSpan {
            start: at,
            end: at + needle.len(),
        })
}

/// Diagnostic for a failed relocation: the text now occupying the original
/// window, with its similarity to the expected text.
///
/// Feeds the "selection no longer present" notification only; never used to
/// pick a splice target.
pub(crate) fn stale_window_diagnostic(
    content: &str,
    selection: &Selection,
) -> Option<(String, f64)> {
    let start = floor_char_boundary(content, selection.start().min(content.len()));
    let end = floor_char_boundary(content, selection.end().min(content.len()));
    if start >= end {
        return None;
    }

    let found = &content[start..end];
    let similarity = strsim::normalized_levenshtein(selection.selected_text(), found);
    Some((found.to_string(), similarity))
}

fn floor_char_boundary(content: &str, mut offset: usize) -> usize {
    while offset > 0 && !content.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
