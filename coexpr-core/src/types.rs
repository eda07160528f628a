use std::fmt;

use thiserror::Error;

/// Gene identifier as it appears in the expression and ortholog tables.
///
/// Gene IDs are expected to be unique across species (plant gene models
/// usually carry a species prefix); the ortholog table rejects a gene listed
/// under two species.
pub type GeneId = String;

/// Species identifier.
pub type SpeciesId = String;

/// Hierarchical ortholog group identifier.
pub type HogId = String;

/// Species-level life-history trait used to stratify cliques.
///
/// # Examples
///
/// ```rust
/// use coexpr_core::types::LifeHabit;
///
/// assert_eq!(LifeHabit::from_tag("Annual"), LifeHabit::Annual);
/// assert_eq!(LifeHabit::from_tag(" perennial "), LifeHabit::Perennial);
/// assert_eq!(LifeHabit::from_tag("biennial"), LifeHabit::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum LifeHabit {
    /// Completes its life cycle within one growing season
    Annual,
    /// Lives for more than two growing seasons
    Perennial,
    /// Tag missing or not recognised
    #[default]
    Unknown,
}

impl LifeHabit {
    /// Parse a free-text life-habit tag (case-insensitive).
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "annual" => Self::Annual,
            "perennial" => Self::Perennial,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for LifeHabit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Annual => write!(f, "annual"),
            Self::Perennial => write!(f, "perennial"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Ordered pair of species analysed together.
///
/// A pair and its reverse test the same genes, so a run lists each
/// combination once. The order given at construction is kept: `first` is "species 1" for the
/// forward direction of every conservation test run on this pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeciesPair {
    pub first: SpeciesId,
    pub second: SpeciesId,
}

impl SpeciesPair {
    pub fn new(first: impl Into<SpeciesId>, second: impl Into<SpeciesId>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Whether `species` is one of the two members
    #[must_use]
    pub fn contains(&self, species: &str) -> bool {
        self.first == species || self.second == species
    }
}

impl fmt::Display for SpeciesPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_vs_{}", self.first, self.second)
    }
}

/// Error types raised by the co-expression conservation pipeline
#[derive(Error, Debug)]
pub enum CoexprError {
    /// Too few expressed genes or samples to build a network
    #[error("Insufficient data for {species}/{tissue}: {reason}")]
    InsufficientData {
        species: SpeciesId,
        tissue: String,
        reason: String,
    },
    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// File I/O operation failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Malformed delimited input
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    /// Error parsing input data
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Distribution could not be constructed from the given counts
    #[error("Statistics error: {0}")]
    Statistics(String),
    /// Gene referenced but absent from the table or network
    #[error("Unknown gene: {0}")]
    UnknownGene(GeneId),
    /// Worker pool could not be created
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_life_habit_from_tag() {
        assert_eq!(LifeHabit::from_tag("annual"), LifeHabit::Annual);
        assert_eq!(LifeHabit::from_tag("ANNUAL"), LifeHabit::Annual);
        assert_eq!(LifeHabit::from_tag("Perennial"), LifeHabit::Perennial);
        assert_eq!(LifeHabit::from_tag(""), LifeHabit::Unknown);
        assert_eq!(LifeHabit::from_tag("NA"), LifeHabit::Unknown);
    }

    #[test]
    fn test_life_habit_display() {
        assert_eq!(LifeHabit::Annual.to_string(), "annual");
        assert_eq!(LifeHabit::Perennial.to_string(), "perennial");
        assert_eq!(LifeHabit::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_species_pair_display_and_contains() {
        let pair = SpeciesPair::new("Zmays", "Sbicolor");
        assert_eq!(pair.to_string(), "Zmays_vs_Sbicolor");
        assert!(pair.contains("Zmays"));
        assert!(pair.contains("Sbicolor"));
        assert!(!pair.contains("Osativa"));
    }

    #[test]
    fn test_error_display() {
        let err = CoexprError::InsufficientData {
            species: "Zmays".to_string(),
            tissue: "leaf".to_string(),
            reason: "1 expressed gene".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data for Zmays/leaf: 1 expressed gene"
        );

        let err = CoexprError::UnknownGene("G1".to_string());
        assert_eq!(err.to_string(), "Unknown gene: G1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CoexprError = io.into();
        assert!(matches!(err, CoexprError::IoError(_)));
    }
}
