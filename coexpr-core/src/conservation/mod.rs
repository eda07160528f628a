//! Bidirectional neighbourhood conservation tests between two species.
//!
//! For an ortholog pair (A in species 1, B in species 2), A's network
//! neighbours are projected into species 2 through the ortholog table and
//! compared with B's actual neighbours (forward direction); B's neighbours
//! are projected back into species 1 and compared with A's (reverse
//! direction). Each direction is a hypergeometric over-representation test
//! over the orthologous gene universe of the target species. The combined
//! p-value is the smaller of the two.

pub mod hypergeom;

use log::debug;
use rayon::prelude::*;

use crate::network::CorrelationNetwork;
use crate::orthology::OrthologTable;
use crate::types::{CoexprError, GeneId, HogId, SpeciesPair};

pub use hypergeom::{DirectionalTest, upper_tail};

/// Which directional test produced the combined p-value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Species-1 neighbours projected onto species 2
    Forward,
    /// Species-2 neighbours projected onto species 1
    Reverse,
}

/// Result of testing one ortholog pair across two species networks.
#[derive(Debug, Clone, PartialEq)]
pub struct ConservationRecord {
    pub hog: HogId,
    pub species_pair: SpeciesPair,
    /// Gene of `species_pair.first`
    pub gene_a: GeneId,
    /// Gene of `species_pair.second`
    pub gene_b: GeneId,
    /// Size of A's neighbourhood in the species-1 network
    pub neighborhood_a: usize,
    /// Size of B's neighbourhood in the species-2 network
    pub neighborhood_b: usize,
    pub forward: DirectionalTest,
    pub reverse: DirectionalTest,
    /// min(forward p, reverse p)
    pub p_value: f64,
    /// Observed / expected overlap of the direction giving `p_value`
    pub effect_size: f64,
    /// Mean sign agreement of the correlations to matched neighbours, in
    /// `[-1, 1]`; 0 without matched neighbours.
    pub concordance: f64,
}

impl ConservationRecord {
    /// Direction whose p-value became the combined p-value (forward on ties)
    #[must_use]
    pub fn best_direction(&self) -> Direction {
        if self.forward.p_value <= self.reverse.p_value {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }

    /// Neighbour overlap of the winning direction
    #[must_use]
    pub fn overlap(&self) -> u64 {
        match self.best_direction() {
            Direction::Forward => self.forward.overlap,
            Direction::Reverse => self.reverse.overlap,
        }
    }
}

/// Counts describing one species-pair test run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairTestSummary {
    /// Ortholog pairs tested (records emitted)
    pub tested: usize,
    /// Tested pairs where at least one neighbourhood was empty
    pub empty_neighborhood: usize,
    /// Species-1 network genes without an ortholog in the species-2 network
    pub unmapped_first: usize,
    /// Species-2 network genes without an ortholog in the species-1 network
    pub unmapped_second: usize,
}

impl PairTestSummary {
    /// Genes excluded from testing for lack of a partner ortholog
    #[must_use]
    pub const fn missing_ortholog(&self) -> usize {
        self.unmapped_first + self.unmapped_second
    }
}

/// Records and counts from testing one species pair
#[derive(Debug, Clone)]
pub struct PairTestOutcome {
    pub species_pair: SpeciesPair,
    pub summary: PairTestSummary,
    pub records: Vec<ConservationRecord>,
}

/// Tests neighbourhood conservation for every ortholog pair of two networks.
///
/// Cross-species ortholog maps and the orthologous universes are computed
/// once at construction; individual tests only read them, so pairs are
/// tested in parallel.
#[derive(Debug)]
pub struct ConservationTester<'a> {
    first: &'a CorrelationNetwork,
    second: &'a CorrelationNetwork,
    orthologs: &'a OrthologTable,
    species_pair: SpeciesPair,
    /// For each species-1 gene, its orthologs' indices in network 2 (sorted)
    first_to_second: Vec<Vec<usize>>,
    /// For each species-2 gene, its orthologs' indices in network 1 (sorted)
    second_to_first: Vec<Vec<usize>>,
    universe_first: usize,
    universe_second: usize,
}

impl<'a> ConservationTester<'a> {
    #[must_use]
    pub fn new(
        first: &'a CorrelationNetwork,
        second: &'a CorrelationNetwork,
        orthologs: &'a OrthologTable,
    ) -> Self {
        let first_to_second = ortholog_index_map(first, second, orthologs);
        let second_to_first = ortholog_index_map(second, first, orthologs);
        let universe_first = first_to_second.iter().filter(|m| !m.is_empty()).count();
        let universe_second = second_to_first.iter().filter(|m| !m.is_empty()).count();

        Self {
            first,
            second,
            orthologs,
            species_pair: SpeciesPair::new(first.species.clone(), second.species.clone()),
            first_to_second,
            second_to_first,
            universe_first,
            universe_second,
        }
    }

    #[must_use]
    pub const fn species_pair(&self) -> &SpeciesPair {
        &self.species_pair
    }

    /// Sizes of the species-1 and species-2 orthologous universes
    #[must_use]
    pub const fn universe_sizes(&self) -> (usize, usize) {
        (self.universe_first, self.universe_second)
    }

    /// All testable ortholog pairs as (network-1 index, network-2 index),
    /// ordered by HOG then gene IDs.
    #[must_use]
    pub fn ortholog_pairs(&self) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(&str, &str, &str, usize, usize)> = self
            .first_to_second
            .iter()
            .enumerate()
            .flat_map(|(a, partners)| partners.iter().map(move |&b| (a, b)))
            .map(|(a, b)| {
                let gene_a = self.first.gene(a);
                let hog = self.orthologs.hog_of(gene_a).unwrap_or_default();
                (hog, gene_a, self.second.gene(b), a, b)
            })
            .collect();
        pairs.sort_unstable();
        pairs.into_iter().map(|(.., a, b)| (a, b)).collect()
    }

    /// Test a pair given by gene IDs.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::UnknownGene`] if either gene is missing from
    /// its network or the two are not orthologs, and propagates statistics
    /// errors.
    pub fn test_genes(&self, gene_a: &str, gene_b: &str) -> Result<ConservationRecord, CoexprError> {
        let a = self
            .first
            .index_of(gene_a)
            .ok_or_else(|| CoexprError::UnknownGene(gene_a.to_string()))?;
        let b = self
            .second
            .index_of(gene_b)
            .ok_or_else(|| CoexprError::UnknownGene(gene_b.to_string()))?;
        if self.first_to_second[a].binary_search(&b).is_err() {
            return Err(CoexprError::UnknownGene(format!(
                "{gene_a} and {gene_b} are not orthologs"
            )));
        }
        self.test_pair(a, b)
    }

    /// Test one ortholog pair given by network indices.
    ///
    /// # Errors
    ///
    /// Propagates [`CoexprError::Statistics`] from the hypergeometric tests.
    pub fn test_pair(&self, a: usize, b: usize) -> Result<ConservationRecord, CoexprError> {
        let gene_a = self.first.gene(a);
        let gene_b = self.second.gene(b);
        let hog = self.orthologs.hog_of(gene_a).unwrap_or_default().to_string();

        let neighbors_a: Vec<usize> = self.first.neighbor_indices(a).collect();
        let neighbors_b: Vec<usize> = self.second.neighbor_indices(b).collect();

        let mut record = ConservationRecord {
            hog,
            species_pair: self.species_pair.clone(),
            gene_a: gene_a.to_string(),
            gene_b: gene_b.to_string(),
            neighborhood_a: neighbors_a.len(),
            neighborhood_b: neighbors_b.len(),
            forward: DirectionalTest::untested(self.universe_second as u64),
            reverse: DirectionalTest::untested(self.universe_first as u64),
            p_value: 1.0,
            effect_size: 0.0,
            concordance: 0.0,
        };

        // Kept with p = 1 so the pair still counts in the FDR denominator
        if neighbors_a.is_empty() || neighbors_b.is_empty() {
            return Ok(record);
        }

        record.forward = directional_test(
            &neighbors_a,
            &neighbors_b,
            &self.first_to_second,
            &self.second_to_first,
            self.universe_second,
        )?;
        record.reverse = directional_test(
            &neighbors_b,
            &neighbors_a,
            &self.second_to_first,
            &self.first_to_second,
            self.universe_first,
        )?;

        record.p_value = record.forward.p_value.min(record.reverse.p_value);
        record.effect_size = match record.best_direction() {
            Direction::Forward => record.forward.fold_enrichment(),
            Direction::Reverse => record.reverse.fold_enrichment(),
        };
        record.concordance = self.sign_concordance(a, b, &neighbors_b);

        Ok(record)
    }

    /// Mean of sign(corr(A, a')) × sign(corr(B, b')) over neighbour pairs
    /// (a', b') that are orthologs of each other.
    fn sign_concordance(&self, a: usize, b: usize, neighbors_b: &[usize]) -> f64 {
        let correlations_b: Vec<(usize, f64)> = self.second.neighbors_with_correlation(b).collect();
        debug_assert_eq!(correlations_b.len(), neighbors_b.len());

        let mut total = 0.0;
        let mut matches = 0usize;
        for (neighbor_a, correlation_a) in self.first.neighbors_with_correlation(a) {
            for &partner in &self.first_to_second[neighbor_a] {
                if let Ok(position) = neighbors_b.binary_search(&partner) {
                    let correlation_b = correlations_b[position].1;
                    total += correlation_a.signum() * correlation_b.signum();
                    matches += 1;
                }
            }
        }

        if matches == 0 {
            0.0
        } else {
            total / matches as f64
        }
    }

    /// Test every ortholog pair of the two networks in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first statistics error encountered.
    pub fn run(&self) -> Result<PairTestOutcome, CoexprError> {
        let pairs = self.ortholog_pairs();
        let records = pairs
            .par_iter()
            .map(|&(a, b)| self.test_pair(a, b))
            .collect::<Result<Vec<_>, _>>()?;

        let summary = PairTestSummary {
            tested: records.len(),
            empty_neighborhood: records
                .iter()
                .filter(|record| record.neighborhood_a == 0 || record.neighborhood_b == 0)
                .count(),
            unmapped_first: self.first.num_genes() - self.universe_first,
            unmapped_second: self.second.num_genes() - self.universe_second,
        };

        debug!(
            "{}: {} ortholog pairs tested, {} with an empty neighbourhood, {} genes without partner ortholog",
            self.species_pair,
            summary.tested,
            summary.empty_neighborhood,
            summary.missing_ortholog()
        );

        Ok(PairTestOutcome {
            species_pair: self.species_pair.clone(),
            summary,
            records,
        })
    }
}

/// Map every gene of `from` to the indices of its orthologs in `to`.
fn ortholog_index_map(
    from: &CorrelationNetwork,
    to: &CorrelationNetwork,
    orthologs: &OrthologTable,
) -> Vec<Vec<usize>> {
    from.genes()
        .iter()
        .map(|gene| {
            let mut partners: Vec<usize> = orthologs
                .orthologs_in(gene, &to.species)
                .into_iter()
                .filter_map(|partner| to.index_of(partner))
                .collect();
            partners.sort_unstable();
            partners.dedup();
            partners
        })
        .collect()
}

/// Project `source_neighbors` into the target species and test their
/// overlap with `target_neighbors`.
///
/// Population is the target's orthologous universe; successes are the target
/// neighbours inside it; draws are the projected source neighbours.
fn directional_test(
    source_neighbors: &[usize],
    target_neighbors: &[usize],
    source_to_target: &[Vec<usize>],
    target_to_source: &[Vec<usize>],
    universe: usize,
) -> Result<DirectionalTest, CoexprError> {
    let mut projected: Vec<usize> = source_neighbors
        .iter()
        .flat_map(|&neighbor| source_to_target[neighbor].iter().copied())
        .collect();
    projected.sort_unstable();
    projected.dedup();

    let successes = target_neighbors
        .iter()
        .filter(|&&neighbor| !target_to_source[neighbor].is_empty())
        .count();
    let overlap = projected
        .iter()
        .filter(|gene| target_neighbors.binary_search(gene).is_ok())
        .count();

    DirectionalTest::run(
        universe as u64,
        successes as u64,
        projected.len() as u64,
        overlap as u64,
    )
}
