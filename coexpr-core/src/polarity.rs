//! Polarity divergence between the signed and unsigned analyses.
//!
//! A pair whose neighbourhood is strongly conserved by magnitude, but whose
//! matched neighbours correlate with opposite signs in the two species, is a
//! candidate regulatory sign change.

use std::collections::HashMap;
use std::fmt;

use crate::constants::MIN_REPORTED_P_VALUE;
use crate::correction::AdjustedConservationRecord;
use crate::types::{GeneId, SpeciesPair};

/// Inferred direction of conserved co-expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Matched neighbours correlate with the same sign in both species
    Concordant,
    /// Matched neighbours mostly flip sign between species
    Discordant,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concordant => write!(f, "concordant"),
            Self::Discordant => write!(f, "discordant"),
        }
    }
}

/// Signed vs. unsigned comparison for one ortholog pair
#[derive(Debug, Clone, PartialEq)]
pub struct PolarityRecord {
    pub tissue: String,
    pub species_pair: SpeciesPair,
    pub gene_1: GeneId,
    pub gene_2: GeneId,
    /// `-log10(p)` of the signed analysis. The sign is taken from the
    /// unsigned analysis: negative when the unsigned record is discordant.
    pub signed_score: f64,
    /// `-log10(p)` of the unsigned analysis
    pub unsigned_score: f64,
    pub polarity: Polarity,
    pub divergent: bool,
}

/// `-log10(p)` with `p` floored so the score stays finite
#[must_use]
pub fn significance_score(p_value: f64) -> f64 {
    // 0.0 - x keeps p = 1 at +0.0
    0.0 - p_value.max(MIN_REPORTED_P_VALUE).log10()
}

/// Linear-interpolation percentile (`percentile` in `[0, 100]`).
///
/// Returns `None` for an empty slice.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::polarity::percentile;
///
/// assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 50.0), Some(2.5));
/// assert_eq!(percentile(&[], 75.0), None);
/// ```
#[must_use]
pub fn percentile(values: &[f64], percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = percentile.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Flags polarity-divergent pairs of one tissue.
#[derive(Debug, Clone)]
pub struct PolarityAnalyzer {
    tissue: String,
    percentile: f64,
}

impl PolarityAnalyzer {
    pub fn new(tissue: impl Into<String>, percentile: f64) -> Self {
        Self {
            tissue: tissue.into(),
            percentile,
        }
    }

    /// Join signed and unsigned records on (species pair, gene A, gene B)
    /// and score every pair present in both.
    ///
    /// A pair is divergent when its polarity is discordant and its unsigned
    /// score is strictly above the configured percentile of all joined
    /// unsigned scores. Output is sorted by species pair, then genes.
    #[must_use]
    pub fn analyze(
        &self,
        signed: &[AdjustedConservationRecord],
        unsigned: &[AdjustedConservationRecord],
    ) -> Vec<PolarityRecord> {
        let signed_by_key: HashMap<(&SpeciesPair, &str, &str), &AdjustedConservationRecord> =
            signed
                .iter()
                .map(|adjusted| {
                    let record = &adjusted.record;
                    (
                        (
                            &record.species_pair,
                            record.gene_a.as_str(),
                            record.gene_b.as_str(),
                        ),
                        adjusted,
                    )
                })
                .collect();

        let mut records: Vec<PolarityRecord> = unsigned
            .iter()
            .filter_map(|adjusted| {
                let record = &adjusted.record;
                let key = (
                    &record.species_pair,
                    record.gene_a.as_str(),
                    record.gene_b.as_str(),
                );
                let signed = signed_by_key.get(&key)?;

                let polarity = if record.concordance >= 0.0 {
                    Polarity::Concordant
                } else {
                    Polarity::Discordant
                };
                let magnitude = significance_score(signed.record.p_value);
                let signed_score = match polarity {
                    Polarity::Concordant => magnitude,
                    Polarity::Discordant => 0.0 - magnitude,
                };

                Some(PolarityRecord {
                    tissue: self.tissue.clone(),
                    species_pair: record.species_pair.clone(),
                    gene_1: record.gene_a.clone(),
                    gene_2: record.gene_b.clone(),
                    signed_score,
                    unsigned_score: significance_score(record.p_value),
                    polarity,
                    divergent: false,
                })
            })
            .collect();

        let scores: Vec<f64> = records.iter().map(|record| record.unsigned_score).collect();
        if let Some(threshold) = percentile(&scores, self.percentile) {
            for record in &mut records {
                record.divergent =
                    record.polarity == Polarity::Discordant && record.unsigned_score > threshold;
            }
        }

        records.sort_by(|a, b| {
            (&a.species_pair, &a.gene_1, &a.gene_2).cmp(&(&b.species_pair, &b.gene_1, &b.gene_2))
        });
        records
    }
}
