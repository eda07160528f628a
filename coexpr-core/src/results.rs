use std::fmt;

use crate::annotation::CliqueStrata;
use crate::config::ScoringMode;
use crate::conservation::PairTestSummary;
use crate::correction::AdjustedConservationRecord;
use crate::polarity::PolarityRecord;
use crate::types::SpeciesPair;

/// Kind of independently scheduled work unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitKind {
    /// One species' network build
    Network,
    /// Conservation tests for one species pair
    SpeciesPair,
    /// Clique search and annotation for one HOG
    Hog,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::SpeciesPair => write!(f, "species_pair"),
            Self::Hog => write!(f, "hog"),
        }
    }
}

/// How far a unit got
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitStatus {
    Completed,
    /// Finished with partial output, e.g. a truncated clique search
    Partial,
    Failed,
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Partial => write!(f, "partial"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of one work unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub kind: UnitKind,
    /// Species, species pair or HOG ID
    pub unit_id: String,
    pub mode: ScoringMode,
    pub status: UnitStatus,
    /// Failure reason, truncation note or summary counts
    pub reason: String,
}

/// Every unit outcome of one tissue run.
///
/// Per-unit failures are collected here instead of aborting the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunManifest {
    pub units: Vec<UnitReport>,
}

impl RunManifest {
    pub fn record(
        &mut self,
        kind: UnitKind,
        unit_id: impl Into<String>,
        mode: ScoringMode,
        status: UnitStatus,
        reason: impl Into<String>,
    ) {
        self.units.push(UnitReport {
            kind,
            unit_id: unit_id.into(),
            mode,
            status,
            reason: reason.into(),
        });
    }

    /// Number of units with the given status
    #[must_use]
    pub fn count(&self, status: UnitStatus) -> usize {
        self.units.iter().filter(|unit| unit.status == status).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|unit| unit.status == UnitStatus::Failed)
    }

    /// Look up a unit report
    #[must_use]
    pub fn find(&self, kind: UnitKind, unit_id: &str, mode: ScoringMode) -> Option<&UnitReport> {
        self.units
            .iter()
            .find(|unit| unit.kind == kind && unit.unit_id == unit_id && unit.mode == mode)
    }

    pub fn extend(&mut self, reports: impl IntoIterator<Item = UnitReport>) {
        self.units.extend(reports);
    }
}

/// Results of one scoring mode (signed or unsigned) for one tissue.
#[derive(Debug, Clone)]
pub struct ModeResults {
    pub mode: ScoringMode,
    /// Every tested ortholog pair with its BH-adjusted p-value, grouped by
    /// species pair
    pub records: Vec<AdjustedConservationRecord>,
    /// Per species-pair test counts
    pub pair_summaries: Vec<(SpeciesPair, PairTestSummary)>,
    /// HOG graphs with at least one conserved edge
    pub hog_graphs: usize,
    pub strata: CliqueStrata,
}

impl ModeResults {
    /// Number of records significant at `fdr_threshold`
    #[must_use]
    pub fn significant(&self, fdr_threshold: f64) -> usize {
        self.records
            .iter()
            .filter(|record| record.is_significant(fdr_threshold))
            .count()
    }
}

/// All outputs of one tissue.
///
/// # Examples
///
/// ```rust,no_run
/// use coexpr_core::{CoexprAnalyzer, config::CoexprConfig};
///
/// let analyzer = CoexprAnalyzer::new(CoexprConfig::default())?;
/// for analysis in analyzer.analyze_files("expression.tsv", "orthologs.tsv", None)? {
///     println!(
///         "{}: {} signed cliques, {} divergent pairs",
///         analysis.tissue,
///         analysis.signed.strata.all.len(),
///         analysis.polarity.iter().filter(|record| record.divergent).count()
///     );
/// }
/// # Ok::<(), coexpr_core::types::CoexprError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TissueAnalysis {
    pub tissue: String,
    pub signed: ModeResults,
    /// Present when the unsigned variant was enabled
    pub unsigned: Option<ModeResults>,
    /// Empty when the unsigned variant was disabled
    pub polarity: Vec<PolarityRecord>,
    pub manifest: RunManifest,
}

impl TissueAnalysis {
    /// Results of each mode that was run, signed first
    pub fn modes(&self) -> impl Iterator<Item = &ModeResults> {
        std::iter::once(&self.signed).chain(self.unsigned.as_ref())
    }
}
