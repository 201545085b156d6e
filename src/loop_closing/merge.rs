//! Track merge: bridge the gap by extending old tracks with new ones.
//!
//! For every match, the historical (test-frame) track is extended with the
//! anchor-frame track it matched. Anchor tracks that were absorbed are
//! dropped from the output; matches whose append fails leave both tracks as
//! they were. The input set is never modified: extended tracks are copies,
//! and every untouched track is shared with the input.
//!
//! Matches are not required to be one-to-one. If two historical tracks
//! match the same anchor-frame track, both are extended with its history
//! and the anchor track is removed once.

use std::collections::{HashMap, HashSet};

use crate::matching::MatchSet;
use crate::tracks::{Track, TrackId, TrackSet};

/// What a merge did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Anchor-frame tracks that were appended to at least one historical
    /// track and removed from the output.
    pub removed: HashSet<TrackId>,
    /// Historical tracks that were extended.
    pub extended: HashSet<TrackId>,
    /// Matches whose append failed (overlapping histories).
    pub failed_appends: usize,
    /// Matches whose indices were out of range for the given track lists.
    pub invalid_matches: usize,
}

/// Apply `matches` between `test_tracks` (index a) and `stitch_tracks`
/// (index b) to `all_tracks`, returning the new set and what changed.
pub fn merge_tracks(
    matches: &MatchSet,
    test_tracks: &TrackSet,
    stitch_tracks: &TrackSet,
    all_tracks: &TrackSet,
) -> (TrackSet, MergeSummary) {
    let mut summary = MergeSummary::default();
    let mut extended: HashMap<TrackId, Track> = HashMap::new();

    for m in matches {
        let (Some(test), Some(stitch)) = (
            test_tracks.tracks().get(m.index_a),
            stitch_tracks.tracks().get(m.index_b),
        ) else {
            tracing::warn!(
                "Ignoring match ({}, {}) outside track lists of size {} and {}",
                m.index_a,
                m.index_b,
                test_tracks.size(),
                stitch_tracks.size()
            );
            summary.invalid_matches += 1;
            continue;
        };

        // Appends to the same historical track accumulate on one copy.
        let mut target = extended
            .get(&test.id())
            .cloned()
            .unwrap_or_else(|| Track::clone(test));

        if target.append(stitch) {
            extended.insert(test.id(), target);
            summary.removed.insert(stitch.id());
        } else {
            summary.failed_appends += 1;
        }
    }

    summary.extended = extended
        .keys()
        .filter(|id| !summary.removed.contains(*id))
        .copied()
        .collect();

    // Must drop removed ids, not just reorder them; leftover anchor tracks
    // would duplicate observations already present in the extended tracks.
    let merged = all_tracks.rebuilt(&summary.removed, extended);
    (merged, summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::loop_closing::test_support::SequenceBuilder;
    use crate::matching::Match;

    fn matches(pairs: &[(usize, usize)]) -> MatchSet {
        pairs.iter().copied().map(Match::from).collect()
    }

    /// Shot A (3 tracks) on frames 1..=5, shot B (3 tracks) on 7..=9, and one
    /// track spanning both shots.
    fn scene() -> (TrackSet, Vec<TrackId>, Vec<TrackId>, TrackId) {
        let mut seq = SequenceBuilder::new();
        let a = seq.shot(1, 5, 3);
        let b = seq.shot(7, 9, 3);
        let both = seq.span(4, 8);
        (seq.build(), a, b, both)
    }

    #[test]
    fn test_successful_merge() {
        let (all, a, b, both) = scene();
        let test = TrackSet::from_shared(
            a.iter().map(|id| Arc::clone(all.get(*id).unwrap())).collect(),
        )
        .unwrap();
        let stitch = TrackSet::from_shared(
            b.iter().map(|id| Arc::clone(all.get(*id).unwrap())).collect(),
        )
        .unwrap();

        let (merged, summary) = merge_tracks(&matches(&[(0, 2), (2, 0)]), &test, &stitch, &all);

        assert_eq!(summary.removed, HashSet::from([b[2], b[0]]));
        assert_eq!(summary.extended, HashSet::from([a[0], a[2]]));
        assert_eq!(summary.failed_appends, 0);

        assert_eq!(merged.size(), all.size() - 2);
        assert!(!merged.contains(b[0]));
        assert!(!merged.contains(b[2]));
        assert!(merged.contains(b[1]));
        assert!(merged.contains(both));

        let extended = merged.get(a[0]).unwrap();
        assert_eq!(extended.frames().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 7, 8, 9]);
        // The merged track carries the anchor track's descriptor after the gap.
        assert_eq!(
            extended.state_at(7).unwrap().descriptor,
            all.get(b[2]).unwrap().state_at(7).unwrap().descriptor
        );

        // Input untouched.
        assert_eq!(all.get(a[0]).unwrap().last_frame(), Some(5));
        assert!(all.contains(b[0]));
    }

    #[test]
    fn test_failed_append_keeps_track() {
        let (all, a, _b, both) = scene();
        // `both` is active on 4..=8 and overlaps every shot-A track.
        let test = all.active_tracks(4);
        let stitch = all.active_tracks(7);
        let test_idx = test.tracks().iter().position(|t| t.id() == a[1]).unwrap();
        let both_idx = stitch.tracks().iter().position(|t| t.id() == both).unwrap();

        let (merged, summary) =
            merge_tracks(&matches(&[(test_idx, both_idx)]), &test, &stitch, &all);

        assert_eq!(summary.failed_appends, 1);
        assert!(summary.removed.is_empty());
        assert!(summary.extended.is_empty());
        assert_eq!(merged.ids(), all.ids());
        assert_eq!(merged.get(a[1]).unwrap().last_frame(), Some(5));
    }

    #[test]
    fn test_partial_success() {
        let (all, a, b, both) = scene();
        let test = all.active_tracks(5);
        let stitch = all.active_tracks(7);
        let idx = |set: &TrackSet, id: TrackId| set.tracks().iter().position(|t| t.id() == id).unwrap();

        let pairs = [
            (idx(&test, a[0]), idx(&stitch, b[0])),
            (idx(&test, a[1]), idx(&stitch, both)),
        ];
        let (merged, summary) = merge_tracks(&matches(&pairs), &test, &stitch, &all);

        assert_eq!(summary.removed, HashSet::from([b[0]]));
        assert_eq!(summary.failed_appends, 1);
        assert!(merged.contains(both));
        assert!(!merged.contains(b[0]));
        assert_eq!(merged.size(), all.size() - 1);
    }

    #[test]
    fn test_second_append_to_same_track_fails() {
        let (all, a, b, _both) = scene();
        let test = TrackSet::from_shared(vec![Arc::clone(all.get(a[0]).unwrap())]).unwrap();
        let stitch = TrackSet::from_shared(
            b.iter().map(|id| Arc::clone(all.get(*id).unwrap())).collect(),
        )
        .unwrap();

        let (merged, summary) = merge_tracks(&matches(&[(0, 0), (0, 1)]), &test, &stitch, &all);

        assert_eq!(summary.removed, HashSet::from([b[0]]));
        assert_eq!(summary.failed_appends, 1);
        assert!(merged.contains(b[1]));
        assert_eq!(merged.get(a[0]).unwrap().len(), 5 + 3);
    }

    #[test]
    fn test_shared_anchor_track_extends_both() {
        let (all, a, b, _both) = scene();
        let test = TrackSet::from_shared(vec![
            Arc::clone(all.get(a[0]).unwrap()),
            Arc::clone(all.get(a[1]).unwrap()),
        ])
        .unwrap();
        let stitch = TrackSet::from_shared(vec![Arc::clone(all.get(b[0]).unwrap())]).unwrap();

        let (merged, summary) = merge_tracks(&matches(&[(0, 0), (1, 0)]), &test, &stitch, &all);

        assert_eq!(summary.removed, HashSet::from([b[0]]));
        assert_eq!(summary.extended, HashSet::from([a[0], a[1]]));
        assert_eq!(summary.failed_appends, 0);
        assert_eq!(merged.size(), all.size() - 1);
        for id in [a[0], a[1]] {
            assert_eq!(
                merged.get(id).unwrap().frames().collect::<Vec<_>>(),
                vec![1, 2, 3, 4, 5, 7, 8, 9]
            );
        }
    }

    #[test]
    fn test_out_of_range_matches_ignored() {
        let (all, ..) = scene();
        let test = all.active_tracks(1);
        let stitch = all.active_tracks(9);

        let (merged, summary) = merge_tracks(&matches(&[(99, 0), (0, 99)]), &test, &stitch, &all);

        assert_eq!(summary.invalid_matches, 2);
        assert_eq!(merged.ids(), all.ids());
    }

    #[test]
    fn test_no_matches_rebuilds_identical_set() {
        let (all, ..) = scene();
        let (merged, summary) = merge_tracks(&MatchSet::default(), &all, &all, &all);
        assert_eq!(summary, MergeSummary::default());
        assert_eq!(merged.ids(), all.ids());
    }
}
