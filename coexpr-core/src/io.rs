//! Readers for the long-format expression table and the ortholog table.
//!
//! Both inputs are delimited text with a header row. Files ending in `.csv`
//! are comma-separated, everything else is tab-separated.

use std::collections::{BTreeMap, HashMap, btree_map::Entry};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use log::debug;
use serde::Deserialize;

use crate::constants::MISSING_VALUE_TOKENS;
use crate::expression::ExpressionMatrix;
use crate::orthology::{OrthologMember, OrthologTable};
use crate::types::{CoexprError, LifeHabit, SpeciesId};

#[derive(Debug, Deserialize)]
struct ExpressionRow {
    species: String,
    tissue: String,
    gene_id: String,
    sample_id: String,
    value: String,
    #[serde(default)]
    life_habit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrthologRow {
    hog_id: String,
    og_id: String,
    species: String,
    gene_id: String,
    #[serde(default)]
    life_habit: Option<String>,
    #[serde(default)]
    core: Option<String>,
}

/// Every expression matrix of an input file, plus the species life habits
/// tagged in it.
#[derive(Debug, Clone, Default)]
pub struct ExpressionData {
    /// Sorted by tissue, then species
    pub matrices: Vec<ExpressionMatrix>,
    pub habits: BTreeMap<SpeciesId, LifeHabit>,
}

impl ExpressionData {
    /// Distinct tissues, sorted
    #[must_use]
    pub fn tissues(&self) -> Vec<&str> {
        let mut tissues: Vec<&str> = self
            .matrices
            .iter()
            .map(|matrix| matrix.tissue.as_str())
            .collect();
        tissues.dedup();
        tissues
    }

    /// Matrices of one tissue, sorted by species
    pub fn for_tissue<'a>(
        &'a self,
        tissue: &'a str,
    ) -> impl Iterator<Item = &'a ExpressionMatrix> {
        self.matrices
            .iter()
            .filter(move |matrix| matrix.tissue == tissue)
    }
}

/// Field delimiter implied by a file name
#[must_use]
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

/// Read a long-format expression table
/// (`species, tissue, gene_id, sample_id, value, life_habit`).
///
/// # Errors
///
/// Returns an I/O or CSV error if the file cannot be read, and
/// [`CoexprError::ParseError`] for unparseable values or a repeated
/// (species, tissue, gene, sample) cell.
pub fn read_expression_table(path: impl AsRef<Path>) -> Result<ExpressionData, CoexprError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse_expression_table(file, delimiter_for(path))
}

/// Parse an expression table from any reader.
///
/// Genes and samples keep their order of first appearance; a gene with no
/// value for some sample of its matrix gets a missing value there.
///
/// # Errors
///
/// See [`read_expression_table`].
pub fn parse_expression_table<R: Read>(
    input: R,
    delimiter: u8,
) -> Result<ExpressionData, CoexprError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(input);

    let mut builders: BTreeMap<(String, SpeciesId), MatrixBuilder> = BTreeMap::new();
    let mut habits: BTreeMap<SpeciesId, LifeHabit> = BTreeMap::new();

    for result in reader.deserialize::<ExpressionRow>() {
        let row = result?;
        let value = parse_value(&row.value).ok_or_else(|| {
            CoexprError::ParseError(format!(
                "invalid expression value '{}' for {}/{} sample {}",
                row.value, row.species, row.gene_id, row.sample_id
            ))
        })?;

        let habit = row
            .life_habit
            .as_deref()
            .map(LifeHabit::from_tag)
            .unwrap_or_default();
        let entry = habits.entry(row.species.clone()).or_default();
        if *entry == LifeHabit::Unknown {
            *entry = habit;
        }

        builders
            .entry((row.tissue, row.species))
            .or_default()
            .insert(row.gene_id, row.sample_id, value)?;
    }

    let matrices = builders
        .into_iter()
        .map(|((tissue, species), builder)| builder.finish(species, tissue))
        .collect::<Result<Vec<_>, _>>()?;
    debug!("read {} expression matrices", matrices.len());

    Ok(ExpressionData { matrices, habits })
}

fn parse_value(raw: &str) -> Option<f64> {
    if MISSING_VALUE_TOKENS.contains(&raw) {
        return Some(f64::NAN);
    }
    raw.parse::<f64>().ok().filter(|value| !value.is_nan())
}

#[derive(Debug, Default)]
struct MatrixBuilder {
    genes: Vec<String>,
    gene_index: HashMap<String, usize>,
    samples: Vec<String>,
    sample_index: HashMap<String, usize>,
    cells: BTreeMap<(usize, usize), f64>,
}

impl MatrixBuilder {
    fn insert(&mut self, gene: String, sample: String, value: f64) -> Result<(), CoexprError> {
        let gene_position = position_of(&mut self.genes, &mut self.gene_index, gene);
        let sample_position = position_of(&mut self.samples, &mut self.sample_index, sample);
        match self.cells.entry((gene_position, sample_position)) {
            Entry::Occupied(_) => Err(CoexprError::ParseError(format!(
                "duplicate value for gene {} sample {}",
                self.genes[gene_position], self.samples[sample_position]
            ))),
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    fn finish(
        self,
        species: SpeciesId,
        tissue: String,
    ) -> Result<ExpressionMatrix, CoexprError> {
        let width = self.samples.len();
        let mut values = vec![f64::NAN; self.genes.len() * width];
        for ((gene, sample), value) in self.cells {
            values[gene * width + sample] = value;
        }
        ExpressionMatrix::new(species, tissue, self.genes, self.samples, values)
    }
}

fn position_of(ids: &mut Vec<String>, index: &mut HashMap<String, usize>, id: String) -> usize {
    if let Some(&position) = index.get(&id) {
        return position;
    }
    ids.push(id.clone());
    index.insert(id, ids.len() - 1);
    ids.len() - 1
}

/// Read an ortholog table
/// (`hog_id, og_id, species, gene_id, life_habit, core`).
///
/// # Errors
///
/// Returns an I/O or CSV error if the file cannot be read, and
/// [`CoexprError::ParseError`] for an unrecognised core flag or a gene
/// listed under two species or HOGs.
pub fn read_ortholog_table(path: impl AsRef<Path>) -> Result<OrthologTable, CoexprError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    parse_ortholog_table(file, delimiter_for(path))
}

/// Parse an ortholog table from any reader. A missing core flag counts as
/// core membership.
///
/// # Errors
///
/// See [`read_ortholog_table`].
pub fn parse_ortholog_table<R: Read>(
    input: R,
    delimiter: u8,
) -> Result<OrthologTable, CoexprError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .from_reader(input);

    let mut members = Vec::new();
    for result in reader.deserialize::<OrthologRow>() {
        let row = result?;
        let core = match row.core.as_deref() {
            None | Some("") => true,
            Some(flag) => parse_flag(flag).ok_or_else(|| {
                CoexprError::ParseError(format!(
                    "invalid core flag '{flag}' for gene {}",
                    row.gene_id
                ))
            })?,
        };
        members.push(OrthologMember {
            hog: row.hog_id,
            orthogroup: row.og_id,
            species: row.species,
            gene: row.gene_id,
            life_habit: row
                .life_habit
                .as_deref()
                .map(LifeHabit::from_tag)
                .unwrap_or_default(),
            core,
        });
    }
    debug!("read {} ortholog rows", members.len());

    OrthologTable::new(members)
}

fn parse_flag(flag: &str) -> Option<bool> {
    match flag.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
