// tests/partition_properties.rs

use std::collections::HashSet;
use std::path::PathBuf;

use proptest::prelude::*;
use wavebuild::plan::{BuildUnit, IndependenceAnalyzer, overlaps};
use wavebuild::types::PathCase;

const SEGMENTS: &[&str] = &["a", "b", "ab", "src"];

// Short paths over a tiny alphabet, so equal roots, nested roots and
// siblings sharing a name prefix all come up often.
fn root_strategy() -> impl Strategy<Value = PathBuf> {
    proptest::collection::vec(0..SEGMENTS.len(), 0..4).prop_map(|segments| {
        let mut path = PathBuf::from("/w");
        for i in segments {
            path.push(SEGMENTS[i]);
        }
        path
    })
}

fn units_strategy(max: usize) -> impl Strategy<Value = Vec<BuildUnit>> {
    proptest::collection::vec(root_strategy(), 0..=max).prop_map(|roots| {
        roots
            .into_iter()
            .enumerate()
            .map(|(i, root)| BuildUnit::new(format!("unit_{i}"), root))
            .collect()
    })
}

fn analyzer() -> IndependenceAnalyzer {
    IndependenceAnalyzer::new(PathCase::Sensitive)
}

proptest! {
    #[test]
    fn overlap_is_symmetric_and_reflexive(a in root_strategy(), b in root_strategy()) {
        prop_assert!(overlaps(&a, &a, PathCase::Sensitive));
        prop_assert_eq!(
            overlaps(&a, &b, PathCase::Sensitive),
            overlaps(&b, &a, PathCase::Sensitive)
        );
    }

    #[test]
    fn no_overlapping_pair_shares_a_batch(set in units_strategy(12)) {
        for batch in analyzer().partition(&set) {
            let members = batch.units();
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    prop_assert!(
                        !overlaps(&members[i].source_root, &members[j].source_root, PathCase::Sensitive),
                        "{} and {} overlap but share batch {}",
                        members[i].name, members[j].name, batch.index
                    );
                }
            }
        }
    }

    #[test]
    fn every_unit_lands_in_exactly_one_batch(set in units_strategy(12)) {
        let batches = analyzer().partition(&set);

        let mut seen = HashSet::new();
        let mut count = 0;
        for batch in &batches {
            prop_assert!(!batch.is_empty());
            for unit in batch.units() {
                count += 1;
                prop_assert!(seen.insert(unit.name.clone()), "{} appears twice", unit.name);
            }
        }

        let expected: HashSet<String> = set.iter().map(|u| u.name.clone()).collect();
        prop_assert_eq!(count, set.len());
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn partition_is_deterministic(set in units_strategy(12)) {
        prop_assert_eq!(analyzer().partition(&set), analyzer().partition(&set));
    }

    #[test]
    fn batches_keep_input_order(set in units_strategy(12)) {
        let position = |name: &str| set.iter().position(|u| u.name == name);
        for batch in analyzer().partition(&set) {
            let positions: Vec<_> = batch.units().iter().map(|u| position(&u.name)).collect();
            let mut sorted = positions.clone();
            sorted.sort();
            prop_assert_eq!(positions, sorted);
        }
    }
}
