//! Connected-components grouping over note identifiers.
//!
//! # Responsibility
//! - Partition a note snapshot into groups of notes that share identifiers.
//! - Order each group newest-first and groups by seed appearance.
//!
//! # Invariants
//! - Every input note (by unique id) lands in exactly one group.
//! - Notes without identifiers stay singletons.
//! - Within a group, ties on `created_at` keep join order (seed first).
//! - Pure: no I/O, no shared state, input is never mutated.

use super::identifier::{identifiers, IdentifierSet};
use crate::model::note::{Note, NoteId};
use std::collections::HashSet;

/// How far a group expands from its seed note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Closure {
    /// Repeat the forward scan until a full pass adds no member.
    ///
    /// Every note transitively reachable from the seed joins the group,
    /// whatever the input order.
    #[default]
    FixedPoint,
    /// One forward scan per seed, as the legacy service did.
    ///
    /// A note placed before the member that would connect it is missed and
    /// later seeds its own group.
    SinglePass,
}

/// Groups notes with fixed-point closure.
pub fn group_notes(notes: &[Note]) -> Vec<Vec<Note>> {
    group_notes_with(notes, Closure::FixedPoint)
}

/// Groups notes with an explicit closure mode.
///
/// Ids must be unique within `notes`. A repeated id is treated as already
/// grouped and is dropped from the output; this never panics.
pub fn group_notes_with(notes: &[Note], closure: Closure) -> Vec<Vec<Note>> {
    group_indices(notes, closure)
        .into_iter()
        .map(|members| members.into_iter().map(|idx| notes[idx].clone()).collect())
        .collect()
}

/// Index form of the grouping: each inner vec holds positions into `notes`.
pub fn group_indices(notes: &[Note], closure: Closure) -> Vec<Vec<usize>> {
    let keys: Vec<IdentifierSet> = notes.iter().map(identifiers).collect();
    let mut used: HashSet<NoteId> = HashSet::with_capacity(notes.len());
    let mut groups = Vec::new();

    for seed in 0..notes.len() {
        if !used.insert(notes[seed].id) {
            continue;
        }

        let mut members = vec![seed];
        let mut accumulated = keys[seed].clone();

        loop {
            let mut grew = false;
            // Positions before `seed` are all used already.
            for other in (seed + 1)..notes.len() {
                if used.contains(&notes[other].id) || keys[other].is_disjoint(&accumulated) {
                    continue;
                }
                used.insert(notes[other].id);
                members.push(other);
                accumulated.extend(keys[other].iter().cloned());
                grew = true;
            }
            if !grew || closure == Closure::SinglePass {
                break;
            }
        }

        // Stable: equal timestamps keep join order.
        members.sort_by(|a, b| notes[*b].created_at.cmp(&notes[*a].created_at));
        groups.push(members);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::{group_indices, Closure};
    use crate::model::note::{Note, NoteDraft};
    use uuid::Uuid;

    fn with_email(email: &str, created_at: i64) -> Note {
        Note::with_id(
            Uuid::new_v4(),
            NoteDraft {
                email: Some(email.to_string()),
                ..NoteDraft::default()
            },
            created_at,
        )
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group_indices(&[], Closure::FixedPoint).is_empty());
    }

    #[test]
    fn equal_timestamps_keep_join_order() {
        let notes = vec![
            with_email("x@y.z", 5),
            with_email("X@Y.Z", 5),
            with_email("x@y.z ", 5),
        ];
        assert_eq!(group_indices(&notes, Closure::FixedPoint), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn duplicate_id_is_dropped_without_panicking() {
        let first = with_email("a@b.c", 1);
        let mut twin = with_email("other@b.c", 2);
        twin.id = first.id;
        let groups = group_indices(&[first, twin], Closure::FixedPoint);
        assert_eq!(groups, vec![vec![0]]);
    }
}
