//! Tab-separated output tables for discovery results.
//!
//! ## Files
//!
//! Per tissue, [`write_tissue_outputs`] writes into one directory:
//!
//! - `<tissue>.<mode>.<stratum>.cliques.tsv`: annotated cliques
//! - `<tissue>.<mode>.<stratum>.genes.txt`: clique member genes, one per line
//! - `<tissue>.<mode>.conservation.tsv`: every tested ortholog pair
//! - `<tissue>.polarity.tsv`: signed vs. unsigned comparison (when the
//!   unsigned variant ran)
//! - `<tissue>.manifest.tsv`: completed, partial and failed units
//!
//! `mode` is `signed` or `unsigned`; `stratum` is `all`, `annual`,
//! `perennial` or `mixed`.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use coexpr_core::{CoexprAnalyzer, config::CoexprConfig};
//! use coexpr_core::output::write_tissue_outputs;
//!
//! let analyzer = CoexprAnalyzer::new(CoexprConfig::default())?;
//! for analysis in analyzer.analyze_files("expression.tsv", "orthologs.tsv", None)? {
//!     let written = write_tissue_outputs("results", &analysis)?;
//!     println!("{}: {} files", analysis.tissue, written.len());
//! }
//! # Ok::<(), coexpr_core::types::CoexprError>(())
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::annotation::Stratum;
use crate::config::ScoringMode;
use crate::results::TissueAnalysis;
use crate::types::CoexprError;

mod formats {
    pub mod cliques;
    pub mod conservation;
    pub mod genes;
    pub mod manifest;
    pub mod polarity;
}

pub use formats::{
    cliques::{CLIQUE_TABLE_HEADER, write_clique_table},
    conservation::{CONSERVATION_TABLE_HEADER, write_conservation_table},
    genes::write_gene_list,
    manifest::{MANIFEST_HEADER, write_manifest},
    polarity::{POLARITY_TABLE_HEADER, write_polarity_table},
};

/// One output file of a tissue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputTable {
    Cliques(ScoringMode, Stratum),
    Genes(ScoringMode, Stratum),
    Conservation(ScoringMode),
    Polarity,
    Manifest,
}

impl OutputTable {
    /// File name of this table for `tissue`
    #[must_use]
    pub fn file_name(&self, tissue: &str) -> String {
        match self {
            Self::Cliques(mode, stratum) => format!("{tissue}.{mode}.{stratum}.cliques.tsv"),
            Self::Genes(mode, stratum) => format!("{tissue}.{mode}.{stratum}.genes.txt"),
            Self::Conservation(mode) => format!("{tissue}.{mode}.conservation.tsv"),
            Self::Polarity => format!("{tissue}.polarity.tsv"),
            Self::Manifest => format!("{tissue}.manifest.tsv"),
        }
    }
}

/// Write one table of `analysis` to `writer`.
///
/// Tables of a mode that did not run are written header-only (cliques and
/// conservation) or empty (genes).
///
/// # Errors
///
/// Returns [`CoexprError::IoError`] if writing fails.
pub fn write_table<W: Write>(
    writer: &mut W,
    analysis: &TissueAnalysis,
    table: OutputTable,
) -> Result<(), CoexprError> {
    let mode_results = move |mode: ScoringMode| analysis.modes().find(|results| results.mode == mode);
    match table {
        OutputTable::Cliques(mode, stratum) => {
            let cliques = mode_results(mode)
                .map(|results| results.strata.get(stratum))
                .unwrap_or_default();
            write_clique_table(writer, cliques)
        }
        OutputTable::Genes(mode, stratum) => {
            let genes = mode_results(mode)
                .map(|results| results.strata.genes(stratum))
                .unwrap_or_default();
            write_gene_list(writer, &genes)
        }
        OutputTable::Conservation(mode) => {
            let records = mode_results(mode)
                .map(|results| results.records.as_slice())
                .unwrap_or_default();
            write_conservation_table(writer, records)
        }
        OutputTable::Polarity => write_polarity_table(writer, &analysis.polarity),
        OutputTable::Manifest => write_manifest(writer, &analysis.manifest),
    }
}

/// Every table produced for `analysis`, in writing order
#[must_use]
pub fn tables_for(analysis: &TissueAnalysis) -> Vec<OutputTable> {
    let mut tables = Vec::new();
    for results in analysis.modes() {
        for stratum in Stratum::ALL {
            tables.push(OutputTable::Cliques(results.mode, stratum));
            tables.push(OutputTable::Genes(results.mode, stratum));
        }
        tables.push(OutputTable::Conservation(results.mode));
    }
    if analysis.unsigned.is_some() {
        tables.push(OutputTable::Polarity);
    }
    tables.push(OutputTable::Manifest);
    tables
}

/// Write all tables of one tissue into `dir`, creating it if needed.
///
/// Returns the written paths in [`tables_for`] order.
///
/// # Errors
///
/// Returns [`CoexprError::IoError`] if the directory or a file cannot be
/// written.
pub fn write_tissue_outputs(
    dir: impl AsRef<Path>,
    analysis: &TissueAnalysis,
) -> Result<Vec<PathBuf>, CoexprError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for table in tables_for(analysis) {
        let path = dir.join(table.file_name(&analysis.tissue));
        let mut writer = BufWriter::new(File::create(&path)?);
        write_table(&mut writer, analysis, table)?;
        writer.flush()?;
        written.push(path);
    }
    Ok(written)
}
