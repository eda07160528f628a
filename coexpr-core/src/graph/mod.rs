//! Per-HOG conserved-edge graphs and their maximal cliques.

pub mod assembler;
pub mod clique;

use std::collections::{BTreeMap, HashMap};

use crate::bitset::NodeSet;
use crate::types::{CoexprError, GeneId, HogId, SpeciesId, SpeciesPair};

pub use assembler::GraphAssembler;
pub use clique::{Clique, CliqueSearch, enumerate_maximal_cliques};

/// Statistical support for one conserved edge
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeEvidence {
    pub species_pair: SpeciesPair,
    /// Raw combined p-value
    pub p_value: f64,
    pub adjusted_p: f64,
    pub effect_size: f64,
}

/// Undirected graph of one HOG: nodes are member genes, edges are
/// statistically conserved co-expression relationships.
///
/// Nodes are indexed in gene-ID order. Edges only join genes of different
/// species; self loops are never stored.
#[derive(Debug, Clone)]
pub struct HogGraph {
    pub hog: HogId,
    nodes: Vec<GeneId>,
    species: Vec<SpeciesId>,
    index: HashMap<GeneId, usize>,
    adjacency: Vec<NodeSet>,
    edges: BTreeMap<(usize, usize), EdgeEvidence>,
}

impl HogGraph {
    /// Create an edgeless graph over `(gene, species)` nodes.
    ///
    /// Repeated genes are collapsed.
    pub fn new(hog: impl Into<HogId>, nodes: impl IntoIterator<Item = (GeneId, SpeciesId)>) -> Self {
        let mut members: Vec<(GeneId, SpeciesId)> = nodes.into_iter().collect();
        members.sort();
        members.dedup_by(|a, b| a.0 == b.0);

        let (nodes, species): (Vec<GeneId>, Vec<SpeciesId>) = members.into_iter().unzip();
        let index = nodes
            .iter()
            .enumerate()
            .map(|(position, gene)| (gene.clone(), position))
            .collect();
        let adjacency = vec![NodeSet::new(nodes.len()); nodes.len()];

        Self {
            hog: hog.into(),
            nodes,
            species,
            index,
            adjacency,
            edges: BTreeMap::new(),
        }
    }

    /// Add a conserved edge between two member genes.
    ///
    /// Returns `Ok(false)` without adding anything for a self loop or for
    /// two genes of the same species. When the edge already exists the
    /// evidence with the smaller adjusted p-value is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::UnknownGene`] if either gene is not a node.
    pub fn add_edge(
        &mut self,
        gene_a: &str,
        gene_b: &str,
        evidence: EdgeEvidence,
    ) -> Result<bool, CoexprError> {
        let a = self
            .index_of(gene_a)
            .ok_or_else(|| CoexprError::UnknownGene(gene_a.to_string()))?;
        let b = self
            .index_of(gene_b)
            .ok_or_else(|| CoexprError::UnknownGene(gene_b.to_string()))?;
        if a == b || self.species[a] == self.species[b] {
            return Ok(false);
        }

        let key = (a.min(b), a.max(b));
        match self.edges.get_mut(&key) {
            Some(existing) => {
                if evidence.adjusted_p < existing.adjusted_p {
                    *existing = evidence;
                }
            }
            None => {
                self.edges.insert(key, evidence);
                self.adjacency[a].insert(b);
                self.adjacency[b].insert(a);
            }
        }
        Ok(true)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Member genes in index order
    #[must_use]
    pub fn nodes(&self) -> &[GeneId] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, index: usize) -> &str {
        &self.nodes[index]
    }

    #[must_use]
    pub fn species_of(&self, index: usize) -> &str {
        &self.species[index]
    }

    #[must_use]
    pub fn index_of(&self, gene: &str) -> Option<usize> {
        self.index.get(gene).copied()
    }

    /// Neighbour set of a node
    #[must_use]
    pub fn neighbors(&self, index: usize) -> &NodeSet {
        &self.adjacency[index]
    }

    #[must_use]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        a != b && self.adjacency[a].contains(b)
    }

    #[must_use]
    pub fn evidence(&self, a: usize, b: usize) -> Option<&EdgeEvidence> {
        self.edges.get(&(a.min(b), a.max(b)))
    }

    /// All edges as `((a, b), evidence)` with `a < b`
    pub fn edges(&self) -> impl Iterator<Item = (&(usize, usize), &EdgeEvidence)> {
        self.edges.iter()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn evidence(p_value: f64) -> EdgeEvidence {
        EdgeEvidence {
            species_pair: SpeciesPair::new("X", "Y"),
            p_value,
            adjusted_p: p_value,
            effect_size: 2.0,
        }
    }

    /// Graph whose every node is its own species, so any edge is allowed
    pub fn graph(nodes: &[&str], edges: &[(&str, &str)]) -> HogGraph {
        let mut graph = HogGraph::new(
            "HOG1",
            nodes
                .iter()
                .map(|node| (node.to_string(), format!("sp_{node}"))),
        );
        for (a, b) in edges {
            assert!(graph.add_edge(a, b, evidence(0.001)).unwrap());
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{evidence, graph};
    use super::*;

    #[test]
    fn test_nodes_sorted_and_deduplicated() {
        let graph = HogGraph::new(
            "HOG7",
            vec![
                ("g2".to_string(), "B".to_string()),
                ("g1".to_string(), "A".to_string()),
                ("g2".to_string(), "B".to_string()),
            ],
        );
        assert_eq!(graph.nodes(), &["g1".to_string(), "g2".to_string()]);
        assert_eq!(graph.species_of(1), "B");
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_edges_are_undirected() {
        let graph = graph(&["A", "B", "C"], &[("B", "A")]);
        let a = graph.index_of("A").unwrap();
        let b = graph.index_of("B").unwrap();
        let c = graph.index_of("C").unwrap();
        assert!(graph.has_edge(a, b));
        assert!(graph.has_edge(b, a));
        assert!(!graph.has_edge(a, c));
        assert!(graph.evidence(b, a).is_some());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_same_species_and_self_loops_rejected() {
        let mut graph = HogGraph::new(
            "HOG1",
            vec![
                ("a1".to_string(), "A".to_string()),
                ("a2".to_string(), "A".to_string()),
                ("b1".to_string(), "B".to_string()),
            ],
        );
        assert!(!graph.add_edge("a1", "a2", evidence(0.01)).unwrap());
        assert!(!graph.add_edge("a1", "a1", evidence(0.01)).unwrap());
        assert!(graph.add_edge("a1", "b1", evidence(0.01)).unwrap());
        assert_eq!(graph.edge_count(), 1);
        assert!(matches!(
            graph.add_edge("a1", "zz", evidence(0.01)),
            Err(CoexprError::UnknownGene(_))
        ));
    }

    #[test]
    fn test_duplicate_edge_keeps_best_evidence() {
        let mut graph = graph(&["A", "B"], &[]);
        graph.add_edge("A", "B", evidence(0.02)).unwrap();
        graph.add_edge("B", "A", evidence(0.001)).unwrap();
        graph.add_edge("A", "B", evidence(0.03)).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.evidence(0, 1).unwrap().adjusted_p, 0.001);
    }
}
