//! Per-species, per-tissue expression matrices.
//!
//! Matrices are consumed pre-normalized; this module only stores the values
//! and answers which rows are usable for correlation.

use std::collections::HashSet;

use crate::constants::MIN_ROW_VARIANCE;
use crate::types::{CoexprError, GeneId, SpeciesId};

/// Gene×sample expression values for one species in one tissue.
///
/// Values are stored row-major (one row per gene). Missing measurements are
/// `NaN`.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::expression::ExpressionMatrix;
///
/// let matrix = ExpressionMatrix::new(
///     "Zmays",
///     "leaf",
///     vec!["G1".into(), "G2".into()],
///     vec!["s1".into(), "s2".into(), "s3".into()],
///     vec![1.0, 2.0, 3.0, 3.0, 2.0, 1.0],
/// )?;
/// assert_eq!(matrix.num_genes(), 2);
/// assert_eq!(matrix.row(1), &[3.0, 2.0, 1.0]);
/// # Ok::<(), coexpr_core::types::CoexprError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    pub species: SpeciesId,
    pub tissue: String,
    genes: Vec<GeneId>,
    samples: Vec<String>,
    values: Vec<f64>,
}

impl ExpressionMatrix {
    /// Create a matrix from row-major values.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::ParseError`] if gene or sample IDs repeat, if
    /// the value count does not match `genes × samples`, or if a value is
    /// infinite.
    pub fn new(
        species: impl Into<SpeciesId>,
        tissue: impl Into<String>,
        genes: Vec<GeneId>,
        samples: Vec<String>,
        values: Vec<f64>,
    ) -> Result<Self, CoexprError> {
        let species = species.into();
        let tissue = tissue.into();

        if let Some(duplicate) = first_duplicate(&genes) {
            return Err(CoexprError::ParseError(format!(
                "duplicate gene ID {duplicate} in {species}/{tissue}"
            )));
        }
        if let Some(duplicate) = first_duplicate(&samples) {
            return Err(CoexprError::ParseError(format!(
                "duplicate sample ID {duplicate} in {species}/{tissue}"
            )));
        }
        if values.len() != genes.len() * samples.len() {
            return Err(CoexprError::ParseError(format!(
                "{species}/{tissue}: expected {} values for {} genes x {} samples, got {}",
                genes.len() * samples.len(),
                genes.len(),
                samples.len(),
                values.len()
            )));
        }
        if values.iter().any(|value| value.is_infinite()) {
            return Err(CoexprError::ParseError(format!(
                "{species}/{tissue}: infinite expression value"
            )));
        }

        Ok(Self {
            species,
            tissue,
            genes,
            samples,
            values,
        })
    }

    #[must_use]
    pub fn genes(&self) -> &[GeneId] {
        &self.genes
    }

    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    #[must_use]
    pub fn num_genes(&self) -> usize {
        self.genes.len()
    }

    #[must_use]
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Expression values of the gene at `index`, one per sample
    #[must_use]
    pub fn row(&self, index: usize) -> &[f64] {
        let width = self.samples.len();
        &self.values[index * width..(index + 1) * width]
    }

    /// Whether the row can take part in a correlation: no missing values and
    /// non-zero variance.
    #[must_use]
    pub fn is_expressed(&self, index: usize) -> bool {
        let row = self.row(index);
        if row.is_empty() || row.iter().any(|value| value.is_nan()) {
            return false;
        }
        let mean = row.iter().sum::<f64>() / row.len() as f64;
        let variance = row.iter().map(|value| (value - mean).powi(2)).sum::<f64>();
        variance > MIN_ROW_VARIANCE
    }

    /// Indices of all expressed rows, in matrix order
    #[must_use]
    pub fn expressed_rows(&self) -> Vec<usize> {
        (0..self.genes.len())
            .filter(|&index| self.is_expressed(index))
            .collect()
    }
}

fn first_duplicate(ids: &[String]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter()
        .find(|id| !seen.insert(id.as_str()))
        .map(String::as_str)
}
