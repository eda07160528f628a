use rayon::prelude::*;

use crate::config::ScoringMode;
use crate::network::correlation::CorrelationMatrix;

/// Row-major matrix of directional ranks: `get(i, j)` is the rank of gene
/// `j` among gene `i`'s correlation partners (1 = strongest). The diagonal
/// is zero.
#[derive(Debug, Clone)]
pub struct DirectionalRanks {
    size: usize,
    ranks: Vec<u32>,
}

impl DirectionalRanks {
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// rank(i→j)
    #[inline]
    #[must_use]
    pub fn get(&self, from: usize, to: usize) -> u32 {
        self.ranks[from * self.size + to]
    }

    /// rank(i→j) × rank(j→i); orders pairs exactly as the mutual rank does
    #[inline]
    #[must_use]
    pub fn rank_product(&self, i: usize, j: usize) -> u64 {
        u64::from(self.get(i, j)) * u64::from(self.get(j, i))
    }

    /// MR(i, j) = sqrt(rank(i→j) × rank(j→i))
    #[inline]
    #[must_use]
    pub fn mutual_rank(&self, i: usize, j: usize) -> f64 {
        (self.rank_product(i, j) as f64).sqrt()
    }
}

/// Rank each gene's correlation partners by strength under `mode`.
///
/// Ties share the smallest rank of their group (competition ranking), so
/// equal strengths never get an arbitrary order.
#[must_use]
pub fn directional_ranks(matrix: &CorrelationMatrix, mode: ScoringMode) -> DirectionalRanks {
    let size = matrix.size();
    let mut ranks = vec![0u32; size * size];
    if size == 0 {
        return DirectionalRanks { size, ranks };
    }

    ranks.par_chunks_mut(size).enumerate().for_each(|(i, out)| {
        let row = matrix.row(i);
        let mut partners: Vec<usize> = (0..size).filter(|&j| j != i).collect();
        partners.sort_by(|&a, &b| mode.strength(row[b]).total_cmp(&mode.strength(row[a])));

        let mut group_rank = 1u32;
        for (position, &j) in partners.iter().enumerate() {
            if position > 0 {
                let previous = partners[position - 1];
                if mode.strength(row[j]) != mode.strength(row[previous]) {
                    group_rank = position as u32 + 1;
                }
            }
            out[j] = group_rank;
        }
    });

    DirectionalRanks { size, ranks }
}

/// Number of edges kept for `density` over `total_pairs` possible pairs:
/// `floor(density × total_pairs)`, guarded against float round-down.
#[must_use]
pub fn edge_budget(density: f64, total_pairs: usize) -> usize {
    let exact = density * total_pairs as f64;
    ((exact + 1e-9).floor() as usize).min(total_pairs)
}

/// Number of pairs `(i, j)`, `i < j`, whose rank product is at most `limit`
fn count_at_most(ranks: &DirectionalRanks, limit: u64) -> usize {
    let size = ranks.size();
    (0..size)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..size)
                .filter(|&j| ranks.rank_product(i, j) <= limit)
                .count()
        })
        .sum()
}

/// Pick the strongest `floor(density × N)` unordered pairs.
///
/// Pairs are ordered by (rank product, i, j) ascending with `i < j`; the
/// lexicographic pair index is the single tie-break at the threshold, so the
/// selection is deterministic and its size is exact.
///
/// The cut-off rank product is found by bisection over pair counts, so only
/// the kept pairs are ever materialized.
#[must_use]
pub fn select_edges(ranks: &DirectionalRanks, density: f64) -> Vec<(usize, usize)> {
    let size = ranks.size();
    let total_pairs = size * size.saturating_sub(1) / 2;
    let keep = edge_budget(density, total_pairs);
    if keep == 0 {
        return Vec::new();
    }

    // Smallest rank product with at least `keep` pairs at or below it
    let max_rank = size.saturating_sub(1) as u64;
    let (mut low, mut high) = (1u64, (max_rank * max_rank).max(1));
    while low < high {
        let middle = low + (high - low) / 2;
        if count_at_most(ranks, middle) >= keep {
            high = middle;
        } else {
            low = middle + 1;
        }
    }
    let threshold = low;

    let mut below: Vec<(u64, u32, u32)> = (0..size)
        .into_par_iter()
        .flat_map_iter(|i| {
            ((i + 1)..size).filter_map(move |j| {
                let product = ranks.rank_product(i, j);
                (product < threshold).then_some((product, i as u32, j as u32))
            })
        })
        .collect();
    below.sort_unstable();

    let remaining = keep - below.len();
    let at_threshold = (0..size)
        .flat_map(|i| ((i + 1)..size).map(move |j| (i, j)))
        .filter(|&(i, j)| ranks.rank_product(i, j) == threshold)
        .take(remaining);

    below
        .into_iter()
        .map(|(_, i, j)| (i as usize, j as usize))
        .chain(at_threshold)
        .collect()
}
