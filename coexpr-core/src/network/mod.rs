//! Per-species co-expression networks.
//!
//! A network is built in four steps:
//!
//! 1. correlate every pair of expressed genes ([`correlation`]),
//! 2. rank each gene's partners by correlation strength ([`mutual_rank`]),
//! 3. combine the two directional ranks into the mutual rank
//!    `MR(i, j) = sqrt(rank(i→j) × rank(j→i))`,
//! 4. keep the `floor(density × N)` pairs with the smallest MR as edges.
//!
//! The signed and unsigned variants share steps 1 and 4 and differ only in
//! how strength is scored in step 2 (see [`ScoringMode`]).

pub mod correlation;
pub mod mutual_rank;

use std::collections::HashMap;

use log::debug;

use crate::config::{CoexprConfig, CorrelationMethod, ScoringMode};
use crate::constants::MIN_EXPRESSED_GENES;
use crate::expression::ExpressionMatrix;
use crate::types::{CoexprError, GeneId, SpeciesId};

pub use correlation::{CorrelationMatrix, correlation_matrix};
pub use mutual_rank::{DirectionalRanks, directional_ranks, edge_budget, select_edges};

/// One retained network edge between genes `source < target`
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkEdge {
    pub source: usize,
    pub target: usize,
    pub mutual_rank: f64,
    /// Raw correlation coefficient (sign preserved in both modes)
    pub correlation: f64,
}

/// Genes connected to one gene in one network.
///
/// Derived on demand from [`CorrelationNetwork::neighborhood`]; neighbours
/// are sorted by gene ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighborhood {
    pub gene: GeneId,
    pub neighbors: Vec<GeneId>,
}

impl Neighborhood {
    #[must_use]
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// Sparse mutual-rank network of one species in one tissue.
#[derive(Debug, Clone)]
pub struct CorrelationNetwork {
    pub species: SpeciesId,
    pub tissue: String,
    pub mode: ScoringMode,
    /// Density fraction the edge set was cut at
    pub density: f64,
    /// Genes dropped before correlation (missing values or constant rows)
    pub dropped_genes: usize,
    genes: Vec<GeneId>,
    index: HashMap<GeneId, usize>,
    edges: Vec<NetworkEdge>,
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl CorrelationNetwork {
    fn from_edges(
        matrix: &ExpressionMatrix,
        mode: ScoringMode,
        density: f64,
        genes: Vec<GeneId>,
        dropped_genes: usize,
        edges: Vec<NetworkEdge>,
    ) -> Self {
        let index = genes
            .iter()
            .enumerate()
            .map(|(position, gene)| (gene.clone(), position))
            .collect();

        let mut adjacency = vec![Vec::new(); genes.len()];
        for (edge_index, edge) in edges.iter().enumerate() {
            adjacency[edge.source].push((edge.target, edge_index));
            adjacency[edge.target].push((edge.source, edge_index));
        }
        for neighbors in &mut adjacency {
            neighbors.sort_unstable();
        }

        Self {
            species: matrix.species.clone(),
            tissue: matrix.tissue.clone(),
            mode,
            density,
            dropped_genes,
            genes,
            index,
            edges,
            adjacency,
        }
    }

    /// Genes in the network (expressed genes of the source matrix)
    #[must_use]
    pub fn genes(&self) -> &[GeneId] {
        &self.genes
    }

    #[must_use]
    pub fn num_genes(&self) -> usize {
        self.genes.len()
    }

    #[must_use]
    pub fn contains(&self, gene: &str) -> bool {
        self.index.contains_key(gene)
    }

    #[must_use]
    pub fn index_of(&self, gene: &str) -> Option<usize> {
        self.index.get(gene).copied()
    }

    #[must_use]
    pub fn gene(&self, index: usize) -> &str {
        &self.genes[index]
    }

    #[must_use]
    pub fn edges(&self) -> &[NetworkEdge] {
        &self.edges
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of unordered gene pairs, `n(n-1)/2`
    #[must_use]
    pub fn possible_pairs(&self) -> usize {
        self.genes.len() * self.genes.len().saturating_sub(1) / 2
    }

    /// Neighbour indices of the gene at `index`, ascending
    pub fn neighbor_indices(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[index].iter().map(|&(neighbor, _)| neighbor)
    }

    /// Neighbours of the gene at `index` with the edge's correlation
    pub fn neighbors_with_correlation(
        &self,
        index: usize,
    ) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency[index]
            .iter()
            .map(|&(neighbor, edge)| (neighbor, self.edges[edge].correlation))
    }

    /// Neighbourhood of a gene, `None` if the gene is not in the network
    #[must_use]
    pub fn neighborhood(&self, gene: &str) -> Option<Neighborhood> {
        let index = self.index_of(gene)?;
        let mut neighbors: Vec<GeneId> = self
            .neighbor_indices(index)
            .map(|neighbor| self.genes[neighbor].clone())
            .collect();
        neighbors.sort_unstable();
        Some(Neighborhood {
            gene: gene.to_string(),
            neighbors,
        })
    }

    fn edge_between(&self, a: &str, b: &str) -> Option<&NetworkEdge> {
        let a = self.index_of(a)?;
        let b = self.index_of(b)?;
        self.adjacency[a]
            .binary_search_by_key(&b, |&(neighbor, _)| neighbor)
            .ok()
            .map(|position| &self.edges[self.adjacency[a][position].1])
    }

    /// Mutual rank of a retained edge
    #[must_use]
    pub fn mutual_rank_of(&self, a: &str, b: &str) -> Option<f64> {
        self.edge_between(a, b).map(|edge| edge.mutual_rank)
    }

    /// Correlation of a retained edge
    #[must_use]
    pub fn correlation_of(&self, a: &str, b: &str) -> Option<f64> {
        self.edge_between(a, b).map(|edge| edge.correlation)
    }
}

/// Builds [`CorrelationNetwork`]s from expression matrices.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::config::ScoringMode;
/// use coexpr_core::expression::ExpressionMatrix;
/// use coexpr_core::network::NetworkBuilder;
///
/// let matrix = ExpressionMatrix::new(
///     "Zmays",
///     "leaf",
///     vec!["G1".into(), "G2".into(), "G3".into()],
///     vec!["s1".into(), "s2".into(), "s3".into(), "s4".into()],
///     vec![
///         1.0, 2.0, 3.0, 4.0,
///         1.1, 2.2, 2.9, 4.2,
///         4.0, 1.0, 3.0, 2.0,
///     ],
/// )?;
///
/// let builder = NetworkBuilder { density: 0.34, ..Default::default() };
/// let network = builder.build(&matrix, ScoringMode::Signed)?;
/// assert_eq!(network.edge_count(), 1);
/// assert!(network.mutual_rank_of("G1", "G2").is_some());
/// # Ok::<(), coexpr_core::types::CoexprError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NetworkBuilder {
    pub method: CorrelationMethod,
    pub density: f64,
    pub min_samples: usize,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::from_config(&CoexprConfig::default())
    }
}

impl NetworkBuilder {
    #[must_use]
    pub fn from_config(config: &CoexprConfig) -> Self {
        Self {
            method: config.correlation_method,
            density: config.density,
            min_samples: config.min_samples,
        }
    }

    /// Build one network for `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::InsufficientData`] if the matrix has fewer than
    /// `min_samples` samples or fewer than two expressed genes.
    pub fn build(
        &self,
        matrix: &ExpressionMatrix,
        mode: ScoringMode,
    ) -> Result<CorrelationNetwork, CoexprError> {
        let mut networks = self.build_modes(matrix, &[mode])?;
        Ok(networks.remove(0))
    }

    /// Build one network per mode, computing the correlation matrix once.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::InsufficientData`] if the matrix has fewer than
    /// `min_samples` samples or fewer than two expressed genes.
    pub fn build_modes(
        &self,
        matrix: &ExpressionMatrix,
        modes: &[ScoringMode],
    ) -> Result<Vec<CorrelationNetwork>, CoexprError> {
        let insufficient = |reason: String| CoexprError::InsufficientData {
            species: matrix.species.clone(),
            tissue: matrix.tissue.clone(),
            reason,
        };

        if matrix.num_samples() < self.min_samples {
            return Err(insufficient(format!(
                "{} samples (minimum {})",
                matrix.num_samples(),
                self.min_samples
            )));
        }

        let expressed = matrix.expressed_rows();
        if expressed.len() < MIN_EXPRESSED_GENES {
            return Err(insufficient(format!(
                "{} expressed genes (minimum {})",
                expressed.len(),
                MIN_EXPRESSED_GENES
            )));
        }

        let dropped_genes = matrix.num_genes() - expressed.len();
        if dropped_genes > 0 {
            debug!(
                "{}/{}: dropped {} genes with missing values or zero variance",
                matrix.species, matrix.tissue, dropped_genes
            );
        }

        let rows: Vec<&[f64]> = expressed.iter().map(|&index| matrix.row(index)).collect();
        let genes: Vec<GeneId> = expressed
            .iter()
            .map(|&index| matrix.genes()[index].clone())
            .collect();
        let correlations = correlation_matrix(&rows, self.method);

        let networks = modes
            .iter()
            .map(|&mode| {
                let ranks = directional_ranks(&correlations, mode);
                let edges = select_edges(&ranks, self.density)
                    .into_iter()
                    .map(|(source, target)| NetworkEdge {
                        source,
                        target,
                        mutual_rank: ranks.mutual_rank(source, target),
                        correlation: correlations.get(source, target),
                    })
                    .collect::<Vec<_>>();

                debug!(
                    "{}/{} {} network: {} genes, {} edges",
                    matrix.species,
                    matrix.tissue,
                    mode,
                    genes.len(),
                    edges.len()
                );

                CorrelationNetwork::from_edges(
                    matrix,
                    mode,
                    self.density,
                    genes.clone(),
                    dropped_genes,
                    edges,
                )
            })
            .collect();

        Ok(networks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{prefix}{i}")).collect()
    }

    fn sample_matrix() -> ExpressionMatrix {
        // G1/G2 track each other, G3 mirrors them, G4 is noise, G5 constant
        let values = vec![
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, //
            1.1, 2.3, 2.8, 4.1, 5.3, 5.9, //
            6.0, 5.2, 3.9, 3.1, 2.0, 0.8, //
            2.0, 6.0, 1.0, 5.0, 3.0, 4.0, //
            7.0, 7.0, 7.0, 7.0, 7.0, 7.0,
        ];
        ExpressionMatrix::new("A", "leaf", ids("G", 5), ids("s", 6), values).unwrap()
    }

    #[test]
    fn test_build_drops_unexpressed_genes() {
        let network = NetworkBuilder {
            density: 0.5,
            ..Default::default()
        }
        .build(&sample_matrix(), ScoringMode::Signed)
        .unwrap();

        assert_eq!(network.num_genes(), 4);
        assert_eq!(network.dropped_genes, 1);
        assert!(!network.contains("G5"));
        assert_eq!(network.possible_pairs(), 6);
        assert_eq!(network.edge_count(), 3);
    }

    #[test]
    fn test_network_has_no_self_edges_and_is_symmetric() {
        let network = NetworkBuilder {
            density: 1.0,
            ..Default::default()
        }
        .build(&sample_matrix(), ScoringMode::Unsigned)
        .unwrap();

        assert_eq!(network.edge_count(), network.possible_pairs());
        for edge in network.edges() {
            assert!(edge.source < edge.target);
            let a = network.gene(edge.source);
            let b = network.gene(edge.target);
            assert_eq!(network.mutual_rank_of(a, b), network.mutual_rank_of(b, a));
            assert_eq!(network.correlation_of(a, b), network.correlation_of(b, a));
        }
        for gene in network.genes() {
            let neighborhood = network.neighborhood(gene).unwrap();
            assert!(!neighborhood.neighbors.contains(gene));
        }
    }

    #[test]
    fn test_strongest_pair_is_first_edge() {
        let network = NetworkBuilder {
            density: 0.2,
            ..Default::default()
        }
        .build(&sample_matrix(), ScoringMode::Signed)
        .unwrap();

        // floor(0.2 * 6) = 1
        assert_eq!(network.edge_count(), 1);
        assert!(network.mutual_rank_of("G1", "G2").is_some());
        assert_eq!(network.mutual_rank_of("G1", "G2"), Some(1.0));
    }

    #[test]
    fn test_unsigned_mode_links_anticorrelated_genes() {
        let builder = NetworkBuilder {
            density: 0.5,
            ..Default::default()
        };
        let networks = builder
            .build_modes(
                &sample_matrix(),
                &[ScoringMode::Signed, ScoringMode::Unsigned],
            )
            .unwrap();
        let (signed, unsigned) = (&networks[0], &networks[1]);

        assert!(signed.correlation_of("G1", "G3").is_none());
        let correlation = unsigned.correlation_of("G1", "G3").unwrap();
        assert!(correlation < -0.9);
    }

    #[test]
    fn test_neighborhood() {
        let network = NetworkBuilder {
            density: 0.2,
            ..Default::default()
        }
        .build(&sample_matrix(), ScoringMode::Signed)
        .unwrap();

        let neighborhood = network.neighborhood("G1").unwrap();
        assert_eq!(neighborhood.neighbors, vec!["G2".to_string()]);
        assert!(network.neighborhood("G4").unwrap().is_empty());
        assert!(network.neighborhood("missing").is_none());
    }

    #[test]
    fn test_insufficient_samples() {
        let matrix =
            ExpressionMatrix::new("A", "leaf", ids("G", 3), ids("s", 2), vec![1.0, 2.0, 2.0, 1.0, 3.0, 4.0])
                .unwrap();
        let result = NetworkBuilder::default().build(&matrix, ScoringMode::Signed);
        assert!(matches!(
            result,
            Err(CoexprError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_insufficient_expressed_genes() {
        let matrix = ExpressionMatrix::new(
            "A",
            "leaf",
            ids("G", 2),
            ids("s", 3),
            vec![1.0, 2.0, 3.0, 5.0, 5.0, 5.0],
        )
        .unwrap();
        let result = NetworkBuilder::default().build(&matrix, ScoringMode::Signed);
        match result {
            Err(CoexprError::InsufficientData { species, tissue, .. }) => {
                assert_eq!(species, "A");
                assert_eq!(tissue, "leaf");
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }
}
