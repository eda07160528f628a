use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use crate::constants::{
    DEFAULT_DENSITY, DEFAULT_FDR_THRESHOLD, DEFAULT_MAX_SEARCH_STEPS, DEFAULT_MIN_CLIQUE_SIZE,
    DEFAULT_MIN_SAMPLES, DEFAULT_POLARITY_PERCENTILE,
};
use crate::types::{CoexprError, SpeciesPair};

/// Correlation coefficient used to build the gene×gene matrix.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::config::CorrelationMethod;
///
/// assert_eq!("spearman".parse::<CorrelationMethod>().unwrap(), CorrelationMethod::Spearman);
/// assert!("kendall".parse::<CorrelationMethod>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrelationMethod {
    /// Rank-based correlation, robust to outlying samples.
    #[default]
    Spearman,

    /// Linear correlation on the normalized values.
    Pearson,
}

impl std::str::FromStr for CorrelationMethod {
    type Err = CoexprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spearman" | "rank" => Ok(Self::Spearman),
            "pearson" => Ok(Self::Pearson),
            other => Err(CoexprError::InvalidConfig(format!(
                "unknown correlation method '{other}'"
            ))),
        }
    }
}

/// How correlation strength is scored before ranking.
///
/// The pipeline is instantiated once per mode; the two runs share every code
/// path and differ only in [`ScoringMode::strength`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoringMode {
    /// Positive correlations are strong, negative ones weak.
    Signed,

    /// Correlation magnitude only; anti-correlated genes are strong neighbours.
    Unsigned,
}

impl ScoringMode {
    /// Strength of a correlation under this mode (larger = stronger)
    #[inline]
    #[must_use]
    pub fn strength(self, correlation: f64) -> f64 {
        match self {
            Self::Signed => correlation,
            Self::Unsigned => correlation.abs(),
        }
    }
}

impl fmt::Display for ScoringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed => write!(f, "signed"),
            Self::Unsigned => write!(f, "unsigned"),
        }
    }
}

/// Limits on a single per-HOG clique search.
///
/// When either limit is hit the enumerator stops and returns the cliques
/// found so far, flagged as truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    /// Maximum number of Bron–Kerbosch expansion steps (`None` = unbounded)
    pub max_steps: Option<u64>,
    /// Wall-clock limit per HOG (`None` = unbounded)
    pub time_limit: Option<Duration>,
}

impl SearchBudget {
    /// A budget that never truncates
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_steps: None,
            time_limit: None,
        }
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_steps: Some(DEFAULT_MAX_SEARCH_STEPS),
            time_limit: None,
        }
    }
}

/// Configuration settings for a coexpressolog discovery run.
///
/// # Examples
///
/// ## Default configuration
///
/// ```rust
/// use coexpr_core::config::CoexprConfig;
///
/// let config = CoexprConfig::default();
/// assert_eq!(config.density, 0.03);
/// assert_eq!(config.min_clique_size, 3);
/// ```
///
/// ## Pairwise cliques with a stricter FDR
///
/// ```rust
/// use coexpr_core::config::CoexprConfig;
///
/// let config = CoexprConfig {
///     fdr_threshold: 0.01,
///     min_clique_size: 2,
///     num_threads: Some(4),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoexprConfig {
    /// Correlation coefficient for the gene×gene matrix.
    ///
    /// **Default**: [`CorrelationMethod::Spearman`]
    pub correlation_method: CorrelationMethod,

    /// Fraction of all gene pairs retained as network edges, in `(0, 1]`.
    ///
    /// **Default**: `0.03`
    pub density: f64,

    /// Benjamini–Hochberg adjusted p-value below which a conserved pair
    /// becomes a HOG graph edge.
    ///
    /// **Default**: `0.05`
    pub fdr_threshold: f64,

    /// Smallest maximal clique reported (at least 2).
    ///
    /// **Default**: `3`
    pub min_clique_size: usize,

    /// Percentile of the tissue's unsigned scores a pair must exceed to be
    /// flagged as polarity-divergent, in `[0, 100]`.
    ///
    /// **Default**: `75.0`
    pub polarity_percentile: f64,

    /// Minimum number of samples required to build a network.
    ///
    /// **Default**: `3`
    pub min_samples: usize,

    /// Also run the unsigned (absolute correlation) variant and the polarity
    /// divergence analysis.
    ///
    /// **Default**: `true`
    pub unsigned: bool,

    /// Only use ortholog table rows flagged as core HOG members.
    ///
    /// **Default**: `false`
    pub core_only: bool,

    /// Species pairs to test. `None` tests every unordered pair of species
    /// with a network for the tissue. Each combination may appear once, in
    /// either order.
    ///
    /// **Default**: `None`
    pub species_pairs: Option<Vec<SpeciesPair>>,

    /// Per-HOG clique search limits.
    pub search_budget: SearchBudget,

    /// Number of worker threads. `None` uses the rayon default.
    ///
    /// **Default**: `None`
    pub num_threads: Option<usize>,

    /// Suppress progress messages (logged at info level otherwise).
    ///
    /// **Default**: `false`
    pub quiet: bool,
}

impl Default for CoexprConfig {
    fn default() -> Self {
        Self {
            correlation_method: CorrelationMethod::default(),
            density: DEFAULT_DENSITY,
            fdr_threshold: DEFAULT_FDR_THRESHOLD,
            min_clique_size: DEFAULT_MIN_CLIQUE_SIZE,
            polarity_percentile: DEFAULT_POLARITY_PERCENTILE,
            min_samples: DEFAULT_MIN_SAMPLES,
            unsigned: true,
            core_only: false,
            species_pairs: None,
            search_budget: SearchBudget::default(),
            num_threads: None,
            quiet: false,
        }
    }
}

impl CoexprConfig {
    /// Check every numeric setting is in range.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<(), CoexprError> {
        if !(self.density > 0.0 && self.density <= 1.0) {
            return Err(CoexprError::InvalidConfig(format!(
                "density must be in (0, 1], got {}",
                self.density
            )));
        }
        if !(self.fdr_threshold > 0.0 && self.fdr_threshold <= 1.0) {
            return Err(CoexprError::InvalidConfig(format!(
                "FDR threshold must be in (0, 1], got {}",
                self.fdr_threshold
            )));
        }
        if self.min_clique_size < 2 {
            return Err(CoexprError::InvalidConfig(format!(
                "minimum clique size must be at least 2, got {}",
                self.min_clique_size
            )));
        }
        if !(0.0..=100.0).contains(&self.polarity_percentile) {
            return Err(CoexprError::InvalidConfig(format!(
                "polarity percentile must be in [0, 100], got {}",
                self.polarity_percentile
            )));
        }
        if self.min_samples < 2 {
            return Err(CoexprError::InvalidConfig(format!(
                "minimum sample count must be at least 2, got {}",
                self.min_samples
            )));
        }
        if self.num_threads == Some(0) {
            return Err(CoexprError::InvalidConfig(
                "thread count must be positive".to_string(),
            ));
        }
        if let Some(pairs) = &self.species_pairs {
            if let Some(pair) = pairs.iter().find(|pair| pair.first == pair.second) {
                return Err(CoexprError::InvalidConfig(format!(
                    "species pair {pair} pairs a species with itself"
                )));
            }
            let mut seen = HashSet::with_capacity(pairs.len());
            for pair in pairs {
                let key = if pair.first < pair.second {
                    (&pair.first, &pair.second)
                } else {
                    (&pair.second, &pair.first)
                };
                if !seen.insert(key) {
                    return Err(CoexprError::InvalidConfig(format!(
                        "species pair {pair} is listed more than once"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoexprConfig::default();
        assert_eq!(config.correlation_method, CorrelationMethod::Spearman);
        assert_eq!(config.density, 0.03);
        assert_eq!(config.fdr_threshold, 0.05);
        assert_eq!(config.min_clique_size, 3);
        assert_eq!(config.polarity_percentile, 75.0);
        assert!(config.unsigned);
        assert!(!config.core_only);
        assert!(config.species_pairs.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let bad = [
            CoexprConfig {
                density: 0.0,
                ..Default::default()
            },
            CoexprConfig {
                density: 1.5,
                ..Default::default()
            },
            CoexprConfig {
                fdr_threshold: 0.0,
                ..Default::default()
            },
            CoexprConfig {
                min_clique_size: 1,
                ..Default::default()
            },
            CoexprConfig {
                polarity_percentile: 101.0,
                ..Default::default()
            },
            CoexprConfig {
                min_samples: 1,
                ..Default::default()
            },
            CoexprConfig {
                num_threads: Some(0),
                ..Default::default()
            },
            CoexprConfig {
                species_pairs: Some(vec![SpeciesPair::new("A", "A")]),
                ..Default::default()
            },
        ];

        for config in bad {
            assert!(
                matches!(config.validate(), Err(CoexprError::InvalidConfig(_))),
                "expected rejection for {config:?}"
            );
        }
    }

    #[test]
    fn test_validate_rejects_repeated_species_pairs() {
        let repeated = CoexprConfig {
            species_pairs: Some(vec![SpeciesPair::new("A", "B"), SpeciesPair::new("A", "B")]),
            ..Default::default()
        };
        assert!(matches!(repeated.validate(), Err(CoexprError::InvalidConfig(_))));

        let reversed = CoexprConfig {
            species_pairs: Some(vec![SpeciesPair::new("A", "B"), SpeciesPair::new("B", "A")]),
            ..Default::default()
        };
        assert!(matches!(reversed.validate(), Err(CoexprError::InvalidConfig(_))));

        let distinct = CoexprConfig {
            species_pairs: Some(vec![SpeciesPair::new("A", "B"), SpeciesPair::new("B", "C")]),
            ..Default::default()
        };
        assert!(distinct.validate().is_ok());
    }

    #[test]
    fn test_scoring_mode_strength() {
        assert_eq!(ScoringMode::Signed.strength(-0.8), -0.8);
        assert_eq!(ScoringMode::Unsigned.strength(-0.8), 0.8);
        assert_eq!(ScoringMode::Signed.to_string(), "signed");
        assert_eq!(ScoringMode::Unsigned.to_string(), "unsigned");
    }

    #[test]
    fn test_correlation_method_parse() {
        assert_eq!(
            "Pearson".parse::<CorrelationMethod>().unwrap(),
            CorrelationMethod::Pearson
        );
        assert_eq!(
            "rank".parse::<CorrelationMethod>().unwrap(),
            CorrelationMethod::Spearman
        );
        assert!("kendall".parse::<CorrelationMethod>().is_err());
    }

    #[test]
    fn test_search_budget_defaults() {
        let budget = SearchBudget::default();
        assert_eq!(budget.max_steps, Some(DEFAULT_MAX_SEARCH_STEPS));
        assert!(budget.time_limit.is_none());

        let unbounded = SearchBudget::unbounded();
        assert!(unbounded.max_steps.is_none());
    }
}
