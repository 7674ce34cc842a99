//! Tabu Search configuration.

use crate::error::{Result, SearchError};

/// Configuration parameters for Tabu Search.
///
/// # Examples
///
/// ```
/// use u_labelsearch::tabu::TabuConfig;
///
/// let config = TabuConfig::default()
///     .with_max_iterations(1000)
///     .with_tabu_tenure(7)
///     .with_sample_size(50);
/// assert_eq!(config.max_iterations, 1000);
/// assert_eq!(config.tabu_tenure, 7);
/// assert_eq!(config.sample_size, Some(50));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabuConfig {
    /// Number of iterations to run.
    pub max_iterations: usize,
    /// Number of accepted steps whose moves stay forbidden.
    pub tabu_tenure: usize,
    /// Number of neighbors evaluated per iteration (None for the full
    /// neighborhood).
    pub sample_size: Option<usize>,
    /// Accepted non-improving steps before the search is restarted from a
    /// fresh random solution (None disables restarts).
    pub max_unimproved: Option<usize>,
    /// Whether the random start is evaluated and recorded as iteration 0.
    pub evaluate_initial: bool,
    /// Random seed (None for random).
    pub seed: Option<u64>,
}

impl Default for TabuConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tabu_tenure: 10,
            sample_size: None,
            max_unimproved: None,
            evaluate_initial: false,
            seed: None,
        }
    }
}

impl TabuConfig {
    /// Sets the number of iterations.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Sets the tabu tenure.
    pub fn with_tabu_tenure(mut self, tenure: usize) -> Self {
        self.tabu_tenure = tenure;
        self
    }

    /// Limits the number of neighbors evaluated per iteration.
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = Some(size);
        self
    }

    /// Enables restarts after `n` accepted steps without improvement.
    pub fn with_max_unimproved(mut self, n: usize) -> Self {
        self.max_unimproved = Some(n);
        self
    }

    /// Enables or disables evaluation of the initial solution.
    pub fn with_evaluate_initial(mut self, evaluate: bool) -> Self {
        self.evaluate_initial = evaluate;
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(SearchError::InvalidConfig(
                "max_iterations must be positive".into(),
            ));
        }
        if self.tabu_tenure == 0 {
            return Err(SearchError::InvalidConfig(
                "tabu_tenure must be positive".into(),
            ));
        }
        if self.sample_size == Some(0) {
            return Err(SearchError::InvalidConfig(
                "sample_size must be positive".into(),
            ));
        }
        if self.max_unimproved == Some(0) {
            return Err(SearchError::InvalidConfig(
                "max_unimproved must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tabu_config_defaults() {
        let config = TabuConfig::default();
        assert_eq!(config.max_iterations, 500);
        assert_eq!(config.tabu_tenure, 10);
        assert!(config.sample_size.is_none());
        assert!(config.max_unimproved.is_none());
        assert!(!config.evaluate_initial);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tabu_config_builder() {
        let config = TabuConfig::default()
            .with_max_iterations(1000)
            .with_tabu_tenure(2)
            .with_sample_size(30)
            .with_max_unimproved(50)
            .with_evaluate_initial(true)
            .with_seed(123);

        assert_eq!(config.max_iterations, 1000);
        assert_eq!(config.tabu_tenure, 2);
        assert_eq!(config.sample_size, Some(30));
        assert_eq!(config.max_unimproved, Some(50));
        assert!(config.evaluate_initial);
        assert_eq!(config.seed, Some(123));
    }

    #[test]
    fn test_tabu_config_rejects_zero_values() {
        assert!(TabuConfig::default().with_max_iterations(0).validate().is_err());
        assert!(TabuConfig::default().with_tabu_tenure(0).validate().is_err());
        assert!(TabuConfig::default().with_sample_size(0).validate().is_err());
        assert!(TabuConfig::default().with_max_unimproved(0).validate().is_err());
    }
}
