//! Hypergeometric over-representation test of neighbourhood overlap.

use statrs::distribution::{DiscreteCDF, Hypergeometric};

use crate::types::CoexprError;

/// Counts and outcome of one directional hypergeometric test.
///
/// Drawing `draws` genes from a `population` that holds `successes` marked
/// genes, `overlap` marked genes were observed.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DirectionalTest {
    pub population: u64,
    pub successes: u64,
    pub draws: u64,
    pub overlap: u64,
    /// P(X ≥ overlap)
    pub p_value: f64,
}

impl DirectionalTest {
    /// Run the test on the given counts.
    ///
    /// # Errors
    ///
    /// Returns [`CoexprError::Statistics`] if the counts do not describe a
    /// valid hypergeometric distribution (more successes or draws than the
    /// population).
    pub fn run(
        population: u64,
        successes: u64,
        draws: u64,
        overlap: u64,
    ) -> Result<Self, CoexprError> {
        Ok(Self {
            population,
            successes,
            draws,
            overlap,
            p_value: upper_tail(population, successes, draws, overlap)?,
        })
    }

    /// A test that was not run: no overlap, p = 1
    #[must_use]
    pub const fn untested(population: u64) -> Self {
        Self {
            population,
            successes: 0,
            draws: 0,
            overlap: 0,
            p_value: 1.0,
        }
    }

    /// Mean overlap under the null, `draws × successes / population`
    #[must_use]
    pub fn expected(&self) -> f64 {
        if self.population == 0 {
            return 0.0;
        }
        self.draws as f64 * self.successes as f64 / self.population as f64
    }

    /// Observed over expected overlap; 0 when nothing is expected
    #[must_use]
    pub fn fold_enrichment(&self) -> f64 {
        let expected = self.expected();
        if expected > 0.0 {
            self.overlap as f64 / expected
        } else {
            0.0
        }
    }
}

/// P(X ≥ observed) for X ~ Hypergeometric(population, successes, draws).
///
/// # Errors
///
/// Returns [`CoexprError::Statistics`] for impossible counts.
pub fn upper_tail(
    population: u64,
    successes: u64,
    draws: u64,
    observed: u64,
) -> Result<f64, CoexprError> {
    if successes > population || draws > population || observed > successes.min(draws) {
        return Err(CoexprError::Statistics(format!(
            "invalid hypergeometric counts: population {population}, successes {successes}, draws {draws}, observed {observed}"
        )));
    }
    if observed == 0 {
        return Ok(1.0);
    }

    let distribution = Hypergeometric::new(population, successes, draws)
        .map_err(|e| CoexprError::Statistics(e.to_string()))?;
    // sf(k) is P(X > k); the test includes the observed count itself
    Ok(distribution.sf(observed - 1).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binomial(n: u64, k: u64) -> f64 {
        (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
    }

    #[test]
    fn test_zero_overlap_is_one() {
        assert_eq!(upper_tail(100, 10, 10, 0).unwrap(), 1.0);
        assert_eq!(upper_tail(5, 0, 0, 0).unwrap(), 1.0);
    }

    #[test]
    fn test_full_overlap_matches_closed_form() {
        // P(X >= 3) with M=10, K=3, n=3 is 1 / C(10, 3)
        let p = upper_tail(10, 3, 3, 3).unwrap();
        assert!((p - 1.0 / binomial(10, 3)).abs() < 1e-12);
    }

    #[test]
    fn test_tail_matches_pmf_sum() {
        // M=20, K=5, n=6, P(X >= 2)
        let pmf = |x: u64| binomial(5, x) * binomial(15, 6 - x) / binomial(20, 6);
        let expected: f64 = (2..=5).map(pmf).sum();
        let p = upper_tail(20, 5, 6, 2).unwrap();
        assert!((p - expected).abs() < 1e-9);
    }

    #[test]
    fn test_larger_overlap_is_more_significant() {
        let p2 = upper_tail(200, 20, 20, 2).unwrap();
        let p6 = upper_tail(200, 20, 20, 6).unwrap();
        assert!(p6 < p2);
        assert!(p2 <= 1.0 && p6 > 0.0);
    }

    #[test]
    fn test_invalid_counts() {
        assert!(matches!(
            upper_tail(5, 6, 1, 1),
            Err(CoexprError::Statistics(_))
        ));
        assert!(matches!(
            upper_tail(5, 2, 2, 3),
            Err(CoexprError::Statistics(_))
        ));
    }

    #[test]
    fn test_directional_test_effect() {
        let test = DirectionalTest::run(100, 10, 10, 4).unwrap();
        assert!((test.expected() - 1.0).abs() < 1e-12);
        assert!((test.fold_enrichment() - 4.0).abs() < 1e-12);

        let untested = DirectionalTest::untested(100);
        assert_eq!(untested.p_value, 1.0);
        assert_eq!(untested.fold_enrichment(), 0.0);
    }
}
