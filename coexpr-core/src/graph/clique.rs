//! Maximal clique enumeration (Bron–Kerbosch with Tomita pivoting).

use std::ops::ControlFlow;
use std::time::Instant;

use super::HogGraph;
use crate::bitset::NodeSet;
use crate::config::SearchBudget;
use crate::types::{GeneId, HogId};

/// A maximal clique of one HOG graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clique {
    pub hog: HogId,
    /// Member genes, sorted
    pub members: Vec<GeneId>,
    /// Node indices of the members in the source graph, ascending
    pub nodes: Vec<usize>,
}

impl Clique {
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }
}

/// Outcome of a per-HOG clique search.
#[derive(Debug, Clone, Default)]
pub struct CliqueSearch {
    /// Maximal cliques of at least the requested size, largest first, ties
    /// broken by member IDs
    pub cliques: Vec<Clique>,
    /// The search budget ran out; `cliques` may be incomplete
    pub truncated: bool,
    /// Expansion steps performed
    pub steps: u64,
}

/// Enumerate every maximal clique of `graph` with at least `min_size`
/// members.
///
/// Cliques of size 1 are never reported, whatever `min_size` is. If the
/// budget is exhausted the cliques found so far are returned with
/// `truncated` set.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::config::SearchBudget;
/// use coexpr_core::graph::{EdgeEvidence, HogGraph, enumerate_maximal_cliques};
/// use coexpr_core::types::SpeciesPair;
///
/// let mut graph = HogGraph::new(
///     "HOG1",
///     ["a", "b", "c"].map(|g| (g.to_string(), format!("sp_{g}"))),
/// );
/// let evidence = EdgeEvidence {
///     species_pair: SpeciesPair::new("X", "Y"),
///     p_value: 1e-4,
///     adjusted_p: 1e-3,
///     effect_size: 3.0,
/// };
/// for (x, y) in [("a", "b"), ("b", "c"), ("a", "c")] {
///     graph.add_edge(x, y, evidence.clone())?;
/// }
///
/// let search = enumerate_maximal_cliques(&graph, 3, SearchBudget::default());
/// assert_eq!(search.cliques.len(), 1);
/// assert_eq!(search.cliques[0].members, vec!["a", "b", "c"]);
/// # Ok::<(), coexpr_core::types::CoexprError>(())
/// ```
#[must_use]
pub fn enumerate_maximal_cliques(
    graph: &HogGraph,
    min_size: usize,
    budget: SearchBudget,
) -> CliqueSearch {
    let node_count = graph.node_count();
    if node_count < 2 || graph.edge_count() == 0 {
        return CliqueSearch::default();
    }

    let mut search = BronKerbosch {
        graph,
        min_size: min_size.max(2),
        budget,
        started: Instant::now(),
        steps: 0,
        truncated: false,
        found: Vec::new(),
    };
    let mut current = Vec::new();
    // Break only signals truncation, which is recorded on the searcher
    let _ = search.expand(
        &mut current,
        NodeSet::full(node_count),
        NodeSet::new(node_count),
    );

    let mut cliques: Vec<Clique> = search
        .found
        .into_iter()
        .map(|nodes| Clique {
            hog: graph.hog.clone(),
            members: nodes.iter().map(|&node| graph.node(node).to_string()).collect(),
            nodes,
        })
        .collect();
    cliques.sort_by(|a, b| {
        b.size()
            .cmp(&a.size())
            .then_with(|| a.members.cmp(&b.members))
    });

    CliqueSearch {
        cliques,
        truncated: search.truncated,
        steps: search.steps,
    }
}

struct BronKerbosch<'a> {
    graph: &'a HogGraph,
    min_size: usize,
    budget: SearchBudget,
    started: Instant,
    steps: u64,
    truncated: bool,
    found: Vec<Vec<usize>>,
}

impl BronKerbosch<'_> {
    fn budget_exhausted(&self) -> bool {
        if let Some(max_steps) = self.budget.max_steps {
            if self.steps > max_steps {
                return true;
            }
        }
        if let Some(limit) = self.budget.time_limit {
            if self.started.elapsed() >= limit {
                return true;
            }
        }
        false
    }

    /// `current` is R, `candidates` is P, `excluded` is X.
    fn expand(
        &mut self,
        current: &mut Vec<usize>,
        mut candidates: NodeSet,
        mut excluded: NodeSet,
    ) -> ControlFlow<()> {
        self.steps += 1;
        if self.budget_exhausted() {
            self.truncated = true;
            return ControlFlow::Break(());
        }

        if candidates.is_empty() {
            if excluded.is_empty() && current.len() >= self.min_size {
                let mut clique = current.clone();
                clique.sort_unstable();
                self.found.push(clique);
            }
            return ControlFlow::Continue(());
        }

        // Tomita pivot: the node of P ∪ X with most neighbours in P
        let mut pivot = usize::MAX;
        let mut best = 0;
        for node in candidates.iter().chain(excluded.iter()) {
            let covered = candidates.intersection_len(self.graph.neighbors(node));
            if pivot == usize::MAX || covered > best {
                pivot = node;
                best = covered;
            }
        }

        let branches: Vec<usize> = candidates
            .difference(self.graph.neighbors(pivot))
            .iter()
            .collect();
        for node in branches {
            let neighbors = self.graph.neighbors(node);
            current.push(node);
            let flow = self.expand(
                current,
                candidates.intersection(neighbors),
                excluded.intersection(neighbors),
            );
            current.pop();
            flow?;

            candidates.remove(node);
            excluded.insert(node);
        }
        ControlFlow::Continue(())
    }
}
