//! Clique annotation: species composition, life-habit class and aggregate
//! edge statistics, plus partitioning into life-habit strata.

use std::collections::BTreeSet;
use std::fmt;

use crate::graph::{Clique, HogGraph};
use crate::orthology::OrthologTable;
use crate::types::{GeneId, HogId, LifeHabit, SpeciesId};

/// Life-habit class of a whole clique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CliqueHabit {
    /// Every member species is annual
    Annual,
    /// Every member species is perennial
    Perennial,
    /// Anything else, including species with no habit tag
    Mixed,
}

impl fmt::Display for CliqueHabit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual => write!(f, "Annual"),
            Self::Perennial => write!(f, "Perennial"),
            Self::Mixed => write!(f, "Mixed"),
        }
    }
}

/// A maximal clique with its composition and statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedClique {
    /// `<HOG>_<n>`, n counting from 1 within the HOG
    pub clique_id: String,
    pub hog: HogId,
    pub members: Vec<GeneId>,
    /// Distinct species of the members, sorted
    pub species: Vec<SpeciesId>,
    pub life_habit: CliqueHabit,
    pub annual_species: usize,
    pub perennial_species: usize,
    /// Mean raw combined p-value over member edges
    pub mean_p_value: f64,
    pub median_p_value: f64,
    pub mean_effect_size: f64,
    pub edge_count: usize,
}

impl AnnotatedClique {
    #[must_use]
    pub fn size(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn total_species(&self) -> usize {
        self.species.len()
    }
}

/// Annotates cliques using species life habits from the ortholog table.
#[derive(Debug, Clone, Copy)]
pub struct CliqueAnnotator<'a> {
    orthologs: &'a OrthologTable,
}

impl<'a> CliqueAnnotator<'a> {
    pub fn new(orthologs: &'a OrthologTable) -> Self {
        Self { orthologs }
    }

    /// Annotate the cliques of one HOG graph. IDs are numbered in the order
    /// given.
    #[must_use]
    pub fn annotate(&self, graph: &HogGraph, cliques: &[Clique]) -> Vec<AnnotatedClique> {
        cliques
            .iter()
            .enumerate()
            .map(|(position, clique)| self.annotate_clique(graph, clique, position + 1))
            .collect()
    }

    fn annotate_clique(
        &self,
        graph: &HogGraph,
        clique: &Clique,
        number: usize,
    ) -> AnnotatedClique {
        let species: BTreeSet<&str> = clique
            .nodes
            .iter()
            .map(|&node| graph.species_of(node))
            .collect();
        let habits: Vec<LifeHabit> = species
            .iter()
            .map(|name| self.orthologs.life_habit(name))
            .collect();
        let annual_species = habits.iter().filter(|&&h| h == LifeHabit::Annual).count();
        let perennial_species = habits.iter().filter(|&&h| h == LifeHabit::Perennial).count();
        let life_habit = if annual_species == habits.len() {
            CliqueHabit::Annual
        } else if perennial_species == habits.len() {
            CliqueHabit::Perennial
        } else {
            CliqueHabit::Mixed
        };

        let mut p_values = Vec::new();
        let mut effect_sizes = Vec::new();
        for (i, &a) in clique.nodes.iter().enumerate() {
            for &b in &clique.nodes[i + 1..] {
                if let Some(evidence) = graph.evidence(a, b) {
                    p_values.push(evidence.p_value);
                    effect_sizes.push(evidence.effect_size);
                }
            }
        }

        AnnotatedClique {
            clique_id: format!("{}_{number}", clique.hog),
            hog: clique.hog.clone(),
            members: clique.members.clone(),
            species: species.into_iter().map(str::to_string).collect(),
            life_habit,
            annual_species,
            perennial_species,
            mean_p_value: mean(&p_values),
            median_p_value: median(&mut p_values),
            mean_effect_size: mean(&effect_sizes),
            edge_count: p_values.len(),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Output partition of annotated cliques
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stratum {
    All,
    Annual,
    Perennial,
    Mixed,
}

impl Stratum {
    pub const ALL: [Self; 4] = [Self::All, Self::Annual, Self::Perennial, Self::Mixed];
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Annual => write!(f, "annual"),
            Self::Perennial => write!(f, "perennial"),
            Self::Mixed => write!(f, "mixed"),
        }
    }
}

/// Annotated cliques split by life habit, plus the unfiltered set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliqueStrata {
    pub all: Vec<AnnotatedClique>,
    pub annual: Vec<AnnotatedClique>,
    pub perennial: Vec<AnnotatedClique>,
    pub mixed: Vec<AnnotatedClique>,
}

impl CliqueStrata {
    /// Partition `cliques`, keeping their order within every stratum
    #[must_use]
    pub fn new(cliques: Vec<AnnotatedClique>) -> Self {
        let mut strata = Self::default();
        for clique in &cliques {
            match clique.life_habit {
                CliqueHabit::Annual => strata.annual.push(clique.clone()),
                CliqueHabit::Perennial => strata.perennial.push(clique.clone()),
                CliqueHabit::Mixed => strata.mixed.push(clique.clone()),
            }
        }
        strata.all = cliques;
        strata
    }

    #[must_use]
    pub fn get(&self, stratum: Stratum) -> &[AnnotatedClique] {
        match stratum {
            Stratum::All => &self.all,
            Stratum::Annual => &self.annual,
            Stratum::Perennial => &self.perennial,
            Stratum::Mixed => &self.mixed,
        }
    }

    /// Sorted, de-duplicated member genes of one stratum
    #[must_use]
    pub fn genes(&self, stratum: Stratum) -> Vec<&str> {
        self.get(stratum)
            .iter()
            .flat_map(|clique| clique.members.iter().map(String::as_str))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchBudget;
    use crate::graph::{EdgeEvidence, enumerate_maximal_cliques};
    use crate::orthology::OrthologMember;
    use crate::types::SpeciesPair;

    fn member(species: &str, gene: &str, habit: LifeHabit) -> OrthologMember {
        OrthologMember {
            hog: "HOG5".to_string(),
            orthogroup: "OG5".to_string(),
            species: species.to_string(),
            gene: gene.to_string(),
            life_habit: habit,
            core: true,
        }
    }

    fn orthologs() -> OrthologTable {
        OrthologTable::new(vec![
            member("Athaliana", "at1", LifeHabit::Annual),
            member("Zmays", "zm1", LifeHabit::Annual),
            member("Osativa", "os1", LifeHabit::Annual),
            member("Ptrichocarpa", "pt1", LifeHabit::Perennial),
            member("Vvinifera", "vv1", LifeHabit::Perennial),
            member("Mystery", "my1", LifeHabit::Unknown),
        ])
        .unwrap()
    }

    fn complete_graph(table: &OrthologTable, genes: &[&str], p_values: &[f64]) -> HogGraph {
        let mut graph = HogGraph::new(
            "HOG5",
            genes.iter().map(|gene| {
                (
                    gene.to_string(),
                    table.species_of(gene).unwrap().to_string(),
                )
            }),
        );
        let mut p_iter = p_values.iter().cycle();
        for (i, a) in genes.iter().enumerate() {
            for b in &genes[i + 1..] {
                let p_value = *p_iter.next().unwrap();
                graph
                    .add_edge(
                        a,
                        b,
                        EdgeEvidence {
                            species_pair: SpeciesPair::new("X", "Y"),
                            p_value,
                            adjusted_p: p_value * 2.0,
                            effect_size: 1.0 / p_value,
                        },
                    )
                    .unwrap();
            }
        }
        graph
    }

    fn annotate_single(
        table: &OrthologTable,
        genes: &[&str],
        p_values: &[f64],
    ) -> AnnotatedClique {
        let graph = complete_graph(table, genes, p_values);
        let search = enumerate_maximal_cliques(&graph, 2, SearchBudget::default());
        assert_eq!(search.cliques.len(), 1);
        CliqueAnnotator::new(table)
            .annotate(&graph, &search.cliques)
            .remove(0)
    }

    #[test]
    fn test_all_annual_clique() {
        let table = orthologs();
        let clique = annotate_single(&table, &["at1", "zm1", "os1"], &[0.01]);
        assert_eq!(clique.life_habit, CliqueHabit::Annual);
        assert_eq!(clique.clique_id, "HOG5_1");
        assert_eq!(clique.species, vec!["Athaliana", "Osativa", "Zmays"]);
        assert_eq!(clique.annual_species, 3);
        assert_eq!(clique.perennial_species, 0);
        assert_eq!(clique.total_species(), 3);
        assert_eq!(clique.edge_count, 3);
    }

    #[test]
    fn test_perennial_member_makes_mixed() {
        let table = orthologs();
        let clique = annotate_single(&table, &["at1", "zm1", "os1", "pt1"], &[0.01]);
        assert_eq!(clique.life_habit, CliqueHabit::Mixed);
        assert_eq!(clique.annual_species, 3);
        assert_eq!(clique.perennial_species, 1);
        assert_eq!(clique.edge_count, 6);
    }

    #[test]
    fn test_all_perennial_and_unknown() {
        let table = orthologs();
        let perennial = annotate_single(&table, &["pt1", "vv1"], &[0.01]);
        assert_eq!(perennial.life_habit, CliqueHabit::Perennial);

        let unknown = annotate_single(&table, &["at1", "my1"], &[0.01]);
        assert_eq!(unknown.life_habit, CliqueHabit::Mixed);
        assert_eq!(unknown.annual_species, 1);
        assert_eq!(unknown.perennial_species, 0);
    }

    #[test]
    fn test_edge_statistics() {
        let table = orthologs();
        // Edge order: (at1,os1), (at1,zm1), (os1,zm1) after sorting nodes
        let clique = annotate_single(&table, &["at1", "os1", "zm1"], &[0.1, 0.2, 0.6]);
        assert!((clique.mean_p_value - 0.3).abs() < 1e-12);
        assert!((clique.median_p_value - 0.2).abs() < 1e-12);
        let expected_effect = (10.0 + 5.0 + 1.0 / 0.6) / 3.0;
        assert!((clique.mean_effect_size - expected_effect).abs() < 1e-9);

        let pair = annotate_single(&table, &["pt1", "vv1"], &[0.4]);
        assert!((pair.median_p_value - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_median_even_count() {
        let mut values = vec![0.4, 0.1, 0.3, 0.2];
        assert!((median(&mut values) - 0.25).abs() < 1e-12);
        assert_eq!(median(&mut []), 0.0);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_strata_partition() {
        let table = orthologs();
        let annual = annotate_single(&table, &["at1", "zm1"], &[0.01]);
        let mixed = annotate_single(&table, &["at1", "pt1"], &[0.01]);
        let perennial = annotate_single(&table, &["pt1", "vv1"], &[0.01]);

        let strata = CliqueStrata::new(vec![annual, mixed, perennial]);
        assert_eq!(strata.all.len(), 3);
        assert_eq!(strata.get(Stratum::Annual).len(), 1);
        assert_eq!(strata.get(Stratum::Perennial).len(), 1);
        assert_eq!(strata.get(Stratum::Mixed).len(), 1);
        assert_eq!(strata.genes(Stratum::All), vec!["at1", "pt1", "vv1", "zm1"]);
        assert_eq!(strata.genes(Stratum::Mixed), vec!["at1", "pt1"]);
        assert_eq!(Stratum::Perennial.to_string(), "perennial");
    }
}
