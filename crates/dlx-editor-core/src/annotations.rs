//! Line annotations: error markers and breakpoints.
//!
//! Both kinds are keyed by **1-based** line numbers, matching how diagnostics
//! read to a human. The buffer itself is 0-based; the shift helpers below
//! take 0-based line indices and apply the same mixed-base arithmetic the
//! editing layer relies on, so annotations track their lines across inserts,
//! removals and joins.

use std::collections::{BTreeMap, BTreeSet};

/// Error messages per 1-based line. Multiple messages on one line are
/// joined with `\n`.
pub type ErrorMarkers = BTreeMap<usize, String>;

/// Set of 1-based lines carrying a breakpoint.
pub type Breakpoints = BTreeSet<usize>;

/// Shift annotations for a new empty line inserted at 0-based `index`.
///
/// Every key `>= index` moves down by one; a marker sitting on the line being
/// split follows the tail onto the new line.
pub fn shift_for_inserted_line(markers: &mut ErrorMarkers, breakpoints: &mut Breakpoints, index: usize) {
    let shifted: ErrorMarkers = std::mem::take(markers)
        .into_iter()
        .map(|(line, message)| (if line >= index { line + 1 } else { line }, message))
        .collect();
    *markers = shifted;

    let moved: Breakpoints = std::mem::take(breakpoints)
        .into_iter()
        .map(|line| if line >= index { line + 1 } else { line })
        .collect();
    *breakpoints = moved;
}

/// Drop annotations on the removed 0-based `index` and shift the ones below
/// it up by one.
pub fn shift_for_removed_line(markers: &mut ErrorMarkers, breakpoints: &mut Breakpoints, index: usize) {
    let kept: ErrorMarkers = std::mem::take(markers)
        .into_iter()
        .filter(|(line, _)| line - 1 != index)
        .map(|(line, message)| (if line - 1 > index { line - 1 } else { line }, message))
        .collect();
    *markers = kept;

    let moved: Breakpoints = std::mem::take(breakpoints)
        .into_iter()
        .filter(|line| line - 1 != index)
        .map(|line| if line - 1 > index { line - 1 } else { line })
        .collect();
    *breakpoints = moved;
}

/// Drop annotations on the removed 0-based range `[start, end)` and shift
/// the ones below the range up by `end - start`.
pub fn shift_for_removed_range(
    markers: &mut ErrorMarkers,
    breakpoints: &mut Breakpoints,
    start: usize,
    end: usize,
) {
    let count = end - start;

    let kept: ErrorMarkers = std::mem::take(markers)
        .into_iter()
        .filter(|(line, _)| !(start..end).contains(&(line - 1)))
        .map(|(line, message)| (if line - 1 >= end { line - count } else { line }, message))
        .collect();
    *markers = kept;

    let moved: Breakpoints = std::mem::take(breakpoints)
        .into_iter()
        .filter(|line| !(start..end).contains(&(line - 1)))
        .map(|line| if line - 1 >= end { line - count } else { line })
        .collect();
    *breakpoints = moved;
}

/// Move annotations off a line that is being joined into its predecessor.
///
/// Called before [`shift_for_removed_line`], so the migrated annotation is
/// not dropped with the removed line.
pub fn migrate_for_joined_line(markers: &mut ErrorMarkers, breakpoints: &mut Breakpoints, joined_line: usize) {
    let migrated: ErrorMarkers = std::mem::take(markers)
        .into_iter()
        .map(|(line, message)| (if line - 1 == joined_line { line - 1 } else { line }, message))
        .collect();
    *markers = migrated;

    let moved: Breakpoints = std::mem::take(breakpoints)
        .into_iter()
        .map(|line| if line - 1 == joined_line { line - 1 } else { line })
        .collect();
    *breakpoints = moved;
}
