use rayon::prelude::*;

use crate::config::CorrelationMethod;

/// Dense symmetric gene×gene correlation matrix with a unit diagonal
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    size: usize,
    values: Vec<f64>,
}

impl CorrelationMatrix {
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.size + column]
    }

    /// Correlations of gene `row` with every gene, itself included
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.size..(row + 1) * self.size]
    }
}

/// Average ranks (1-based); tied values share the mean of their positions.
#[must_use]
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end hold ranks start+1..=end
        let shared = (start + 1 + end) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = shared;
        }
        start = end;
    }
    ranks
}

/// Center a row and scale it to unit length, so that the dot product of two
/// standardized rows is their Pearson correlation.
fn standardize(row: &[f64]) -> Vec<f64> {
    let mean = row.iter().sum::<f64>() / row.len() as f64;
    let centered: Vec<f64> = row.iter().map(|value| value - mean).collect();
    let norm = centered.iter().map(|value| value * value).sum::<f64>().sqrt();
    if norm == 0.0 {
        return vec![0.0; row.len()];
    }
    centered.into_iter().map(|value| value / norm).collect()
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Compute the full correlation matrix of the given rows.
///
/// Rows are expected to be complete (no missing values). Each output row is
/// computed in parallel. `corr(i, j)` and `corr(j, i)` accumulate the same
/// products in the same order, so the matrix is exactly symmetric.
#[must_use]
pub fn correlation_matrix(rows: &[&[f64]], method: CorrelationMethod) -> CorrelationMatrix {
    let standardized: Vec<Vec<f64>> = rows
        .par_iter()
        .map(|row| match method {
            CorrelationMethod::Spearman => standardize(&average_ranks(row)),
            CorrelationMethod::Pearson => standardize(row),
        })
        .collect();

    let size = rows.len();
    let mut values = vec![0.0; size * size];
    if size > 0 {
        values
            .par_chunks_mut(size)
            .enumerate()
            .for_each(|(i, out)| {
                for (j, slot) in out.iter_mut().enumerate() {
                    *slot = if i == j {
                        1.0
                    } else {
                        dot(&standardized[i], &standardized[j]).clamp(-1.0, 1.0)
                    };
                }
            });
    }

    CorrelationMatrix { size, values }
}
