use std::path::PathBuf;

use anyhow::Context;

/// Default directory holding the artifact bundle.
pub const DEFAULT_ARTIFACT_DIR: &str = "artifacts";

/// Default location of the historical loan CSV.
pub const DEFAULT_TRAINING_CSV: &str = "loan/loan.csv";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory the training run writes the bundle to and serving reads it from.
    pub artifact_dir: PathBuf,

    /// Historical loan records used for training.
    pub training_csv: PathBuf,

    /// Decision threshold overriding the one stored in the bundle.
    pub decision_threshold: Option<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            training_csv: PathBuf::from(DEFAULT_TRAINING_CSV),
            decision_threshold: None,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `CREDIT_ARTIFACT_DIR`: bundle directory (default: `artifacts`)
    /// - `CREDIT_TRAINING_CSV`: training data (default: `loan/loan.csv`)
    /// - `CREDIT_DECISION_THRESHOLD`: decision threshold in `[0, 1]`
    ///
    /// # Errors
    ///
    /// Returns an error if `CREDIT_DECISION_THRESHOLD` is not a number in `[0, 1]`.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the threshold variable is malformed.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let artifact_dir = lookup("CREDIT_ARTIFACT_DIR").map_or(defaults.artifact_dir, PathBuf::from);
        let training_csv = lookup("CREDIT_TRAINING_CSV").map_or(defaults.training_csv, PathBuf::from);

        let decision_threshold = match lookup("CREDIT_DECISION_THRESHOLD") {
            Some(raw) => {
                let threshold: f64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("CREDIT_DECISION_THRESHOLD is not a number: {raw}"))?;
                anyhow::ensure!(
                    (0.0..=1.0).contains(&threshold),
                    "CREDIT_DECISION_THRESHOLD must lie in [0, 1], got {threshold}"
                );
                Some(threshold)
            }
            None => None,
        };

        Ok(Self {
            artifact_dir,
            training_csv,
            decision_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).expect("defaults should load");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CREDIT_ARTIFACT_DIR", "/tmp/bundle"),
            ("CREDIT_TRAINING_CSV", "data/loans.csv"),
            ("CREDIT_DECISION_THRESHOLD", "0.55"),
        ]))
        .expect("overrides should load");

        assert_eq!(config.artifact_dir, PathBuf::from("/tmp/bundle"));
        assert_eq!(config.training_csv, PathBuf::from("data/loans.csv"));
        assert_eq!(config.decision_threshold, Some(0.55));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let result = Config::from_lookup(lookup_from(&[("CREDIT_DECISION_THRESHOLD", "1.5")]));
        assert!(result.is_err());

        let result = Config::from_lookup(lookup_from(&[("CREDIT_DECISION_THRESHOLD", "high")]));
        assert!(result.is_err());
    }
}
