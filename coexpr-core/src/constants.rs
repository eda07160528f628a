// =============================================================================
// Network construction
// =============================================================================

/// Fraction of all gene pairs kept as network edges
pub const DEFAULT_DENSITY: f64 = 0.03;

/// Fewest samples a matrix may have and still yield a network
pub const DEFAULT_MIN_SAMPLES: usize = 3;

/// Fewest expressed genes a matrix may have and still yield a network
pub const MIN_EXPRESSED_GENES: usize = 2;

/// Variance below which a gene row is treated as constant
pub const MIN_ROW_VARIANCE: f64 = 1e-12;

// =============================================================================
// Testing and correction
// =============================================================================

/// Adjusted p-value below which a conserved pair becomes a graph edge
pub const DEFAULT_FDR_THRESHOLD: f64 = 0.05;

/// Floor applied to p-values before taking -log10
pub const MIN_REPORTED_P_VALUE: f64 = 1e-300;

// =============================================================================
// Cliques and polarity
// =============================================================================

/// Smallest maximal clique reported by default
pub const DEFAULT_MIN_CLIQUE_SIZE: usize = 3;

/// Bron–Kerbosch expansion steps allowed per HOG before truncating
pub const DEFAULT_MAX_SEARCH_STEPS: u64 = 1_000_000;

/// Unsigned-score percentile a divergent pair must exceed
pub const DEFAULT_POLARITY_PERCENTILE: f64 = 75.0;

// =============================================================================
// Input parsing
// =============================================================================

/// Value strings read as a missing measurement
pub const MISSING_VALUE_TOKENS: [&str; 4] = ["", "NA", "NaN", "nan"];
