use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;

use crate::annotation::{AnnotatedClique, CliqueAnnotator, CliqueStrata};
use crate::config::{CoexprConfig, ScoringMode};
use crate::conservation::{ConservationTester, PairTestOutcome, PairTestSummary};
use crate::correction::{AdjustedConservationRecord, adjust_records};
use crate::expression::ExpressionMatrix;
use crate::graph::{GraphAssembler, enumerate_maximal_cliques};
use crate::io::{ExpressionData, read_expression_table, read_ortholog_table};
use crate::network::{CorrelationNetwork, NetworkBuilder};
use crate::orthology::OrthologTable;
use crate::polarity::PolarityAnalyzer;
use crate::results::{
    ModeResults, RunManifest, TissueAnalysis, UnitKind, UnitReport, UnitStatus,
};
use crate::types::{CoexprError, SpeciesId, SpeciesPair};

/// Marker trait for the pipeline stage of a [`CoexprEngine`].
///
/// Networks must be built before conservation can be tested; the stage is
/// tracked in the type so that order cannot be violated.
pub trait PipelineState {}

/// Marker type for an engine whose networks are not built yet.
#[derive(Debug, Clone)]
pub struct Pending;

/// Marker type for an engine holding the tissue's co-expression networks.
#[derive(Debug, Clone)]
pub struct Networked;

impl PipelineState for Pending {}
impl PipelineState for Networked {}

/// Per-tissue discovery pipeline.
///
/// The engine runs every stage for one tissue and one scoring-mode set:
/// network construction per species, conservation tests per species pair,
/// pooled FDR correction, then clique search and annotation per HOG. Each
/// stage runs its independent units in parallel on the current rayon pool.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::config::CoexprConfig;
/// use coexpr_core::engine::PendingEngine;
/// use coexpr_core::orthology::OrthologTable;
///
/// let config = CoexprConfig::default();
/// let orthologs = OrthologTable::default();
///
/// let engine = PendingEngine::new(&config, &orthologs, "leaf").build_networks(&[]);
/// let analysis = engine.discover();
/// assert!(analysis.signed.strata.all.is_empty());
/// ```
#[derive(Debug)]
pub struct CoexprEngine<'a, S: PipelineState> {
    config: &'a CoexprConfig,
    orthologs: &'a OrthologTable,
    tissue: String,
    /// Built networks per species, one per scoring mode in `modes()` order
    networks: BTreeMap<SpeciesId, Vec<CorrelationNetwork>>,
    manifest: RunManifest,
    _state: PhantomData<S>,
}

/// An engine before network construction
pub type PendingEngine<'a> = CoexprEngine<'a, Pending>;

/// An engine ready for conservation testing and clique discovery
pub type NetworkedEngine<'a> = CoexprEngine<'a, Networked>;

impl<S: PipelineState> CoexprEngine<'_, S> {
    /// Scoring modes run by this engine, signed first
    #[must_use]
    pub fn modes(&self) -> Vec<ScoringMode> {
        if self.config.unsigned {
            vec![ScoringMode::Signed, ScoringMode::Unsigned]
        } else {
            vec![ScoringMode::Signed]
        }
    }

    #[must_use]
    pub fn tissue(&self) -> &str {
        &self.tissue
    }

    #[must_use]
    pub const fn manifest(&self) -> &RunManifest {
        &self.manifest
    }
}

impl<'a> PendingEngine<'a> {
    pub fn new(
        config: &'a CoexprConfig,
        orthologs: &'a OrthologTable,
        tissue: impl Into<String>,
    ) -> Self {
        Self {
            config,
            orthologs,
            tissue: tissue.into(),
            networks: BTreeMap::new(),
            manifest: RunManifest::default(),
            _state: PhantomData,
        }
    }

    /// Build every species' networks for this tissue.
    ///
    /// Species are built one at a time so that only one dense correlation
    /// matrix is alive; each build is parallel over gene rows. Matrices of
    /// other tissues are ignored. A species whose matrix cannot
    /// yield a network is recorded as a failed unit; the others proceed.
    #[must_use]
    pub fn build_networks(self, matrices: &[&ExpressionMatrix]) -> NetworkedEngine<'a> {
        let builder = NetworkBuilder::from_config(self.config);
        let modes = self.modes();

        let built: Vec<(SpeciesId, Result<Vec<CorrelationNetwork>, CoexprError>)> = matrices
            .iter()
            .filter(|matrix| matrix.tissue == self.tissue)
            .map(|matrix| (matrix.species.clone(), builder.build_modes(matrix, &modes)))
            .collect();

        let mut networks = BTreeMap::new();
        let mut manifest = self.manifest;
        for (species, result) in built {
            match result {
                Ok(species_networks) => {
                    for network in &species_networks {
                        manifest.record(
                            UnitKind::Network,
                            species.as_str(),
                            network.mode,
                            UnitStatus::Completed,
                            format!(
                                "{} genes, {} edges",
                                network.num_genes(),
                                network.edge_count()
                            ),
                        );
                    }
                    networks.insert(species, species_networks);
                }
                Err(error) => {
                    warn!("{}: skipping {species}: {error}", self.tissue);
                    for &mode in &modes {
                        manifest.record(
                            UnitKind::Network,
                            species.as_str(),
                            mode,
                            UnitStatus::Failed,
                            error.to_string(),
                        );
                    }
                }
            }
        }

        CoexprEngine {
            config: self.config,
            orthologs: self.orthologs,
            tissue: self.tissue,
            networks,
            manifest,
            _state: PhantomData,
        }
    }
}

impl<'a> NetworkedEngine<'a> {
    /// Species with a network for this tissue, sorted
    pub fn species(&self) -> impl Iterator<Item = &SpeciesId> {
        self.networks.keys()
    }

    /// Network of `species` under `mode`, if it was built
    #[must_use]
    pub fn network(&self, species: &str, mode: ScoringMode) -> Option<&CorrelationNetwork> {
        self.networks
            .get(species)?
            .iter()
            .find(|network| network.mode == mode)
    }

    /// Species pairs to test: the configured list, or every unordered pair of
    /// species with a network (lexicographic order within and across pairs).
    #[must_use]
    pub fn species_pairs(&self) -> Vec<SpeciesPair> {
        if let Some(pairs) = &self.config.species_pairs {
            return pairs.clone();
        }
        let species: Vec<&SpeciesId> = self.networks.keys().collect();
        let mut pairs = Vec::new();
        for (i, first) in species.iter().enumerate() {
            for second in &species[i + 1..] {
                pairs.push(SpeciesPair::new(first.as_str(), second.as_str()));
            }
        }
        pairs
    }

    /// Test every species pair under `mode` and BH-adjust the pooled records.
    ///
    /// Returns the adjusted records, per-pair summaries and one unit report
    /// per species pair.
    #[must_use]
    pub fn test_conservation(&self, mode: ScoringMode) -> ConservationBatch {
        let outcomes: Vec<(SpeciesPair, Result<_, CoexprError>)> = self
            .species_pairs()
            .into_par_iter()
            .map(|pair| {
                let result = self.test_species_pair(&pair, mode);
                (pair, result)
            })
            .collect();

        let mut batch = ConservationBatch::default();
        let mut pooled = Vec::new();
        for (pair, result) in outcomes {
            match result {
                Ok(outcome) => {
                    let summary = &outcome.summary;
                    batch.reports.push(UnitReport {
                        kind: UnitKind::SpeciesPair,
                        unit_id: pair.to_string(),
                        mode,
                        status: UnitStatus::Completed,
                        reason: format!(
                            "{} pairs tested, {} with empty neighbourhood, {} genes without ortholog",
                            summary.tested,
                            summary.empty_neighborhood,
                            summary.missing_ortholog()
                        ),
                    });
                    batch.summaries.push((pair, outcome.summary));
                    pooled.extend(outcome.records);
                }
                Err(error) => {
                    warn!("{} ({mode}): species pair {pair} failed: {error}", self.tissue);
                    batch.reports.push(UnitReport {
                        kind: UnitKind::SpeciesPair,
                        unit_id: pair.to_string(),
                        mode,
                        status: UnitStatus::Failed,
                        reason: error.to_string(),
                    });
                }
            }
        }

        batch.records = adjust_records(pooled);
        batch
    }

    fn test_species_pair(
        &self,
        pair: &SpeciesPair,
        mode: ScoringMode,
    ) -> Result<PairTestOutcome, CoexprError> {
        let missing = |species: &str| CoexprError::InsufficientData {
            species: species.to_string(),
            tissue: self.tissue.clone(),
            reason: format!("no {mode} network"),
        };
        let first = self
            .network(&pair.first, mode)
            .ok_or_else(|| missing(&pair.first))?;
        let second = self
            .network(&pair.second, mode)
            .ok_or_else(|| missing(&pair.second))?;
        ConservationTester::new(first, second, self.orthologs).run()
    }

    /// Assemble HOG graphs from adjusted records, then enumerate and
    /// annotate their maximal cliques, one HOG per task.
    #[must_use]
    pub fn discover_cliques(
        &self,
        mode: ScoringMode,
        records: &[AdjustedConservationRecord],
    ) -> CliqueBatch {
        let assembler = GraphAssembler::new(
            self.orthologs,
            self.networks.keys().cloned(),
            self.config.fdr_threshold,
        );
        let annotator = CliqueAnnotator::new(self.orthologs);
        let groups: Vec<_> = assembler.group_significant(records).into_iter().collect();

        let per_hog: Vec<Option<(Vec<AnnotatedClique>, UnitReport)>> = groups
            .par_iter()
            .map(|(hog, significant)| {
                let report = |status, reason: String| UnitReport {
                    kind: UnitKind::Hog,
                    unit_id: (*hog).to_string(),
                    mode,
                    status,
                    reason,
                };
                let graph = match assembler.assemble_hog(hog, significant) {
                    Ok(Some(graph)) => graph,
                    Ok(None) => return None,
                    Err(error) => {
                        return Some((Vec::new(), report(UnitStatus::Failed, error.to_string())));
                    }
                };

                let search = enumerate_maximal_cliques(
                    &graph,
                    self.config.min_clique_size,
                    self.config.search_budget,
                );
                let cliques = annotator.annotate(&graph, &search.cliques);
                let unit = if search.truncated {
                    warn!(
                        "{} ({mode}): clique search for {hog} truncated after {} steps",
                        self.tissue, search.steps
                    );
                    report(
                        UnitStatus::Partial,
                        format!(
                            "clique search budget exhausted after {} steps; {} cliques kept",
                            search.steps,
                            cliques.len()
                        ),
                    )
                } else {
                    report(
                        UnitStatus::Completed,
                        format!(
                            "{} nodes, {} edges, {} cliques",
                            graph.node_count(),
                            graph.edge_count(),
                            cliques.len()
                        ),
                    )
                };
                Some((cliques, unit))
            })
            .collect();

        let mut batch = CliqueBatch::default();
        let mut cliques = Vec::new();
        for (hog_cliques, report) in per_hog.into_iter().flatten() {
            if report.status != UnitStatus::Failed {
                batch.hog_graphs += 1;
            }
            cliques.extend(hog_cliques);
            batch.reports.push(report);
        }
        batch.strata = CliqueStrata::new(cliques);
        batch
    }

    /// Run conservation testing, correction and clique discovery for every
    /// mode, then the polarity comparison when both modes ran.
    #[must_use]
    pub fn discover(self) -> TissueAnalysis {
        let mut manifest = self.manifest.clone();
        let mut results: Vec<ModeResults> = Vec::new();

        for mode in self.modes() {
            let conservation = self.test_conservation(mode);
            let cliques = self.discover_cliques(mode, &conservation.records);
            manifest.extend(conservation.reports);
            manifest.extend(cliques.reports);

            info!(
                "{} ({mode}): {} ortholog pairs tested, {} conserved, {} HOG graphs, {} cliques",
                self.tissue,
                conservation.records.len(),
                conservation
                    .records
                    .iter()
                    .filter(|record| record.is_significant(self.config.fdr_threshold))
                    .count(),
                cliques.hog_graphs,
                cliques.strata.all.len()
            );

            results.push(ModeResults {
                mode,
                records: conservation.records,
                pair_summaries: conservation.summaries,
                hog_graphs: cliques.hog_graphs,
                strata: cliques.strata,
            });
        }

        let mut modes = results.into_iter();
        let signed = modes.next().unwrap_or_else(|| ModeResults {
            mode: ScoringMode::Signed,
            records: Vec::new(),
            pair_summaries: Vec::new(),
            hog_graphs: 0,
            strata: CliqueStrata::default(),
        });
        let unsigned = modes.next();

        let polarity = unsigned
            .as_ref()
            .map(|unsigned| {
                PolarityAnalyzer::new(self.tissue.as_str(), self.config.polarity_percentile)
                    .analyze(&signed.records, &unsigned.records)
            })
            .unwrap_or_default();

        TissueAnalysis {
            tissue: self.tissue,
            signed,
            unsigned,
            polarity,
            manifest,
        }
    }
}

/// Pooled, adjusted conservation records of one mode
#[derive(Debug, Clone, Default)]
pub struct ConservationBatch {
    pub records: Vec<AdjustedConservationRecord>,
    pub summaries: Vec<(SpeciesPair, PairTestSummary)>,
    pub reports: Vec<UnitReport>,
}

/// Annotated cliques of one mode, with per-HOG unit reports
#[derive(Debug, Clone, Default)]
pub struct CliqueBatch {
    pub strata: CliqueStrata,
    pub hog_graphs: usize,
    pub reports: Vec<UnitReport>,
}

/// High-level entry point running the whole pipeline over input files or
/// in-memory tables.
///
/// When `num_threads` is set the analyzer owns a dedicated rayon pool and
/// runs every stage inside it; otherwise the global pool is used.
///
/// # Examples
///
/// ```rust,no_run
/// use coexpr_core::{CoexprAnalyzer, config::CoexprConfig};
///
/// let config = CoexprConfig {
///     density: 0.05,
///     num_threads: Some(4),
///     ..Default::default()
/// };
/// let analyzer = CoexprAnalyzer::new(config)?;
/// let analyses = analyzer.analyze_files("expression.tsv", "orthologs.tsv", Some("leaf"))?;
/// println!("{} cliques", analyses[0].signed.strata.all.len());
/// # Ok::<(), coexpr_core::types::CoexprError>(())
/// ```
#[derive(Debug)]
pub struct CoexprAnalyzer {
    pub config: CoexprConfig,
    pool: Option<rayon::ThreadPool>,
}

impl CoexprAnalyzer {
    /// Validate `config` and set up the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::InvalidConfig`] for out-of-range settings and
    /// [`CoexprError::ThreadPool`] if the pool cannot be created.
    pub fn new(config: CoexprConfig) -> Result<Self, CoexprError> {
        config.validate()?;
        let pool = match config.num_threads {
            Some(num_threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build()
                    .map_err(|e| {
                        CoexprError::ThreadPool(format!("Failed to configure thread pool: {e}"))
                    })?,
            ),
            None => None,
        };
        Ok(Self { config, pool })
    }

    fn install<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Run the pipeline for one tissue.
    #[must_use]
    pub fn analyze_tissue(
        &self,
        tissue: &str,
        matrices: &[&ExpressionMatrix],
        orthologs: &OrthologTable,
    ) -> TissueAnalysis {
        if !self.config.quiet {
            info!("{tissue}: building networks for {} species", matrices.len());
        }
        self.install(|| {
            PendingEngine::new(&self.config, orthologs, tissue)
                .build_networks(matrices)
                .discover()
        })
    }

    /// Run every tissue of `data` (or only `tissue`), in tissue order.
    ///
    /// Species life habits tagged in the expression table fill in species
    /// the ortholog table leaves untagged. With `core_only` set, non-core
    /// ortholog rows are dropped first.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::InvalidConfig`] if `tissue` is not in the data.
    pub fn analyze(
        &self,
        data: &ExpressionData,
        orthologs: &OrthologTable,
        tissue: Option<&str>,
    ) -> Result<Vec<TissueAnalysis>, CoexprError> {
        let mut orthologs = if self.config.core_only {
            orthologs.core_only()?
        } else {
            orthologs.clone()
        };
        orthologs.merge_habits(&data.habits);

        let tissues: Vec<&str> = match tissue {
            Some(wanted) => {
                if !data.tissues().contains(&wanted) {
                    return Err(CoexprError::InvalidConfig(format!(
                        "tissue '{wanted}' not found in expression data"
                    )));
                }
                vec![wanted]
            }
            None => data.tissues(),
        };

        Ok(tissues
            .into_iter()
            .map(|tissue| {
                let matrices: Vec<&ExpressionMatrix> = data.for_tissue(tissue).collect();
                self.analyze_tissue(tissue, &matrices, &orthologs)
            })
            .collect())
    }

    /// Read both input tables and run [`CoexprAnalyzer::analyze`].
    ///
    /// # Errors
    ///
    /// Returns read and parse errors of either table, or an unknown-tissue
    /// error.
    pub fn analyze_files<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        expression: P,
        orthologs: Q,
        tissue: Option<&str>,
    ) -> Result<Vec<TissueAnalysis>, CoexprError> {
        let data = read_expression_table(expression)?;
        let orthologs = read_ortholog_table(orthologs)?;
        if !self.config.quiet {
            info!(
                "read {} expression matrices and {} ortholog genes",
                data.matrices.len(),
                orthologs.len()
            );
        }
        self.analyze(&data, &orthologs, tissue)
    }
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    use super::*;
    use crate::orthology::OrthologMember;
    use crate::types::LifeHabit;

    /// Sample profiles of four co-expression modules. Module 3 is the mirror
    /// image of module 2 (`9 - x`), so the two merge under unsigned scoring.
    const MODULE_PROFILES: [[f64; 8]; 4] = [
        [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
        [3.0, 8.0, 1.0, 6.0, 2.0, 7.0, 4.0, 5.0],
        [6.0, 1.0, 8.0, 3.0, 7.0, 2.0, 5.0, 4.0],
        [2.0, 5.0, 7.0, 1.0, 8.0, 4.0, 3.0, 6.0],
    ];

    /// Twelve genes in four modules of three; members of a module are linear
    /// transforms of the module profile.
    pub fn module_matrix(species: &str, tissue: &str) -> ExpressionMatrix {
        let mut genes = Vec::new();
        let mut values = Vec::new();
        for (module, profile) in MODULE_PROFILES.iter().enumerate() {
            for member in 0..3 {
                let k = module * 3 + member + 1;
                genes.push(format!("{}{k}", species.to_ascii_lowercase()));
                let scale = 1.0 + 0.5 * member as f64;
                values.extend(profile.iter().map(|v| v * scale + 2.0 * member as f64));
            }
        }
        let samples = (1..=8).map(|s| format!("{species}_s{s}")).collect();
        ExpressionMatrix::new(species, tissue, genes, samples, values).unwrap()
    }

    /// `HOG<k>` holds gene k of every species
    pub fn module_orthologs(species: &[(&str, LifeHabit)]) -> OrthologTable {
        let mut members = Vec::new();
        for k in 1..=12 {
            for (name, habit) in species {
                members.push(OrthologMember {
                    hog: format!("HOG{k:02}"),
                    orthogroup: format!("OG{k:02}"),
                    species: name.to_string(),
                    gene: format!("{}{k}", name.to_ascii_lowercase()),
                    life_habit: *habit,
                    core: k <= 9,
                });
            }
        }
        OrthologTable::new(members).unwrap()
    }

    pub fn module_config() -> CoexprConfig {
        CoexprConfig {
            density: 0.19,
            num_threads: Some(2),
            quiet: true,
            ..Default::default()
        }
    }
}
