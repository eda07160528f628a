use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::{EdgeEvidence, HogGraph};
use crate::correction::AdjustedConservationRecord;
use crate::orthology::OrthologTable;
use crate::types::{CoexprError, SpeciesId};

/// Builds one [`HogGraph`] per HOG from FDR-significant conservation records.
///
/// Nodes are the HOG's member genes from every analysed species; an edge
/// joins two genes when their pair is significant in some species pair.
#[derive(Debug, Clone)]
pub struct GraphAssembler<'a> {
    orthologs: &'a OrthologTable,
    species: BTreeSet<SpeciesId>,
    fdr_threshold: f64,
}

impl<'a> GraphAssembler<'a> {
    pub fn new(
        orthologs: &'a OrthologTable,
        species: impl IntoIterator<Item = SpeciesId>,
        fdr_threshold: f64,
    ) -> Self {
        Self {
            orthologs,
            species: species.into_iter().collect(),
            fdr_threshold,
        }
    }

    /// Significant records grouped by HOG, in HOG order.
    #[must_use]
    pub fn group_significant<'r>(
        &self,
        records: &'r [AdjustedConservationRecord],
    ) -> BTreeMap<&'r str, Vec<&'r AdjustedConservationRecord>> {
        let mut by_hog: BTreeMap<&str, Vec<&AdjustedConservationRecord>> = BTreeMap::new();
        for adjusted in records
            .iter()
            .filter(|adjusted| adjusted.is_significant(self.fdr_threshold))
        {
            by_hog
                .entry(adjusted.record.hog.as_str())
                .or_default()
                .push(adjusted);
        }
        by_hog
    }

    /// Build the graph of one HOG from its significant records.
    ///
    /// Returns `Ok(None)` when no record yields an edge.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::UnknownGene`] if a record names a gene that is
    /// not a member of `hog` in an analysed species.
    pub fn assemble_hog(
        &self,
        hog: &str,
        significant: &[&AdjustedConservationRecord],
    ) -> Result<Option<HogGraph>, CoexprError> {
        let nodes = self
            .orthologs
            .hog_members(hog)
            .filter(|member| self.species.contains(&member.species))
            .map(|member| (member.gene.clone(), member.species.clone()));
        let mut graph = HogGraph::new(hog, nodes);

        for adjusted in significant {
            let record = &adjusted.record;
            graph.add_edge(
                &record.gene_a,
                &record.gene_b,
                EdgeEvidence {
                    species_pair: record.species_pair.clone(),
                    p_value: record.p_value,
                    adjusted_p: adjusted.adjusted_p,
                    effect_size: record.effect_size,
                },
            )?;
        }

        if graph.edge_count() == 0 {
            return Ok(None);
        }
        debug!(
            "{hog}: {} nodes, {} conserved edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(Some(graph))
    }

    /// Assemble graphs for every HOG with at least one significant edge,
    /// sorted by HOG ID.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphAssembler::assemble_hog`] error.
    pub fn assemble(
        &self,
        records: &[AdjustedConservationRecord],
    ) -> Result<Vec<HogGraph>, CoexprError> {
        let mut graphs = Vec::new();
        for (hog, significant) in self.group_significant(records) {
            if let Some(graph) = self.assemble_hog(hog, &significant)? {
                graphs.push(graph);
            }
        }
        Ok(graphs)
    }
}
