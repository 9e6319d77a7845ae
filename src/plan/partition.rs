// src/plan/partition.rs

use petgraph::graphmap::UnGraphMap;
use tracing::{debug, info};

use crate::plan::root_key::RootKey;
use crate::plan::unit::{Batch, BuildUnit};
use crate::types::PathCase;

/// Computes which units overlap and packs them into batches.
///
/// Batching is a greedy pass in input order:
///
/// - the first unassigned unit opens a new batch;
/// - every later unassigned unit joins that batch iff it overlaps none of the
///   units already in it;
/// - repeat until every unit is assigned.
///
/// The result is deterministic for a given input order but not minimal:
/// independent units can end up in different batches depending on where
/// they appear in the input. Overlapping units never share a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndependenceAnalyzer {
    case: PathCase,
}

impl IndependenceAnalyzer {
    pub fn new(case: PathCase) -> Self {
        Self { case }
    }

    pub fn path_case(&self) -> PathCase {
        self.case
    }

    /// Pairwise overlap graph over input indices.
    ///
    /// Every unit is a node; an edge `i -- j` means the roots of `units[i]`
    /// and `units[j]` overlap. Quadratic in the number of units, which is
    /// expected to stay in the tens.
    pub fn overlap_graph(&self, units: &[BuildUnit]) -> UnGraphMap<usize, ()> {
        let keys: Vec<RootKey> = units
            .iter()
            .map(|u| RootKey::new(&u.source_root, self.case))
            .collect();

        let mut graph = UnGraphMap::with_capacity(units.len(), 0);
        for i in 0..units.len() {
            graph.add_node(i);
        }

        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                if keys[i].overlaps(&keys[j]) {
                    debug!(
                        a = %units[i].name,
                        b = %units[j].name,
                        "source roots overlap"
                    );
                    graph.add_edge(i, j, ());
                }
            }
        }

        graph
    }

    /// Names of every overlapping pair, in input order.
    pub fn overlapping_pairs(&self, units: &[BuildUnit]) -> Vec<(String, String)> {
        let graph = self.overlap_graph(units);
        let mut pairs: Vec<(usize, usize)> = graph
            .all_edges()
            .map(|(a, b, _)| if a < b { (a, b) } else { (b, a) })
            .collect();
        pairs.sort_unstable();
        pairs
            .into_iter()
            .map(|(a, b)| (units[a].name.clone(), units[b].name.clone()))
            .collect()
    }

    /// Partition `units` into ordered batches of mutually independent units.
    pub fn partition(&self, units: &[BuildUnit]) -> Vec<Batch> {
        if units.is_empty() {
            return Vec::new();
        }

        let graph = self.overlap_graph(units);
        let mut assigned = vec![false; units.len()];
        let mut batches = Vec::new();

        for seed in 0..units.len() {
            if assigned[seed] {
                continue;
            }

            assigned[seed] = true;
            let mut members = vec![seed];

            for candidate in (seed + 1)..units.len() {
                if assigned[candidate] {
                    continue;
                }
                let independent = members
                    .iter()
                    .all(|&member| !graph.contains_edge(member, candidate));
                if independent {
                    assigned[candidate] = true;
                    members.push(candidate);
                }
            }

            let batch_units = members.into_iter().map(|i| units[i].clone()).collect();
            batches.push(Batch::new(batches.len(), batch_units));
        }

        info!(
            units = units.len(),
            overlaps = graph.edge_count(),
            batches = batches.len(),
            "partitioned build units into batches"
        );

        batches
    }
}

/// Partition using the host's path case convention.
pub fn partition(units: &[BuildUnit]) -> Vec<Batch> {
    IndependenceAnalyzer::default().partition(units)
}
