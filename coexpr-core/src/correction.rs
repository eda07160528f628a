//! Benjamini–Hochberg false-discovery-rate correction.
//!
//! Records from every species pair of a tissue are pooled into one batch so
//! that the FDR is controlled over the whole tested universe, not per pair.

use crate::conservation::ConservationRecord;

/// A conservation record with its BH-adjusted p-value
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedConservationRecord {
    pub record: ConservationRecord,
    pub adjusted_p: f64,
}

impl AdjustedConservationRecord {
    /// Whether the pair is a conserved edge at `fdr_threshold`
    #[must_use]
    pub fn is_significant(&self, fdr_threshold: f64) -> bool {
        self.adjusted_p < fdr_threshold
    }
}

/// BH step-up adjustment of a slice of p-values, returned in input order.
///
/// With p-values sorted ascending (ties kept in input order),
/// `q(i) = min over j ≥ i of min(1, p(j) × m / j)`.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::correction::benjamini_hochberg;
///
/// let adjusted = benjamini_hochberg(&[0.01, 0.04, 0.03, 0.2]);
/// assert_eq!(adjusted, vec![0.04, 0.04 * 4.0 / 3.0, 0.04 * 4.0 / 3.0, 0.2]);
/// ```
#[must_use]
pub fn benjamini_hochberg(p_values: &[f64]) -> Vec<f64> {
    let m = p_values.len();
    let mut order: Vec<usize> = (0..m).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut adjusted = vec![0.0; m];
    let mut running_min = 1.0_f64;
    for (rank, &index) in order.iter().enumerate().rev() {
        let scaled = p_values[index] * m as f64 / (rank + 1) as f64;
        running_min = running_min.min(scaled);
        adjusted[index] = running_min;
    }
    adjusted
}

/// Adjust a pooled batch of records. An empty batch yields an empty result.
#[must_use]
pub fn adjust_records(records: Vec<ConservationRecord>) -> Vec<AdjustedConservationRecord> {
    let p_values: Vec<f64> = records.iter().map(|record| record.p_value).collect();
    let adjusted = benjamini_hochberg(&p_values);
    records
        .into_iter()
        .zip(adjusted)
        .map(|(record, adjusted_p)| AdjustedConservationRecord {
            // Float rounding in p × m / j must not push q below p
            adjusted_p: adjusted_p.max(record.p_value),
            record,
        })
        .collect()
}
