//! Read-only state shared by every scoring request.

use std::path::Path;

use anyhow::{Context, Result};
use burn::prelude::*;
use feature_extractor::{FeatureAssembler, LoanApplication};
use ml_model::{BundleManifest, CreditModel, decide, load_bundle, predict_proba};
use serde::Serialize;
use tracing::debug;

use crate::risk::{RiskCategory, score};

/// Outcome of scoring one application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    /// Probability of default in `[0, 1]`.
    pub probability: f64,
    /// 1 if the application is predicted to default.
    pub decision: u8,
    pub threshold: f64,
    pub score: f64,
    pub category: RiskCategory,
}

impl Assessment {
    /// Builds the assessment for a model probability.
    #[must_use]
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let score = score(probability);
        Self {
            probability,
            decision: decide(probability, threshold),
            threshold,
            score,
            category: RiskCategory::from_score(score),
        }
    }

    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.decision == 1
    }
}

/// Everything loaded once at start-up to score applications.
///
/// Built from a bundle directory and never mutated afterwards.
#[derive(Debug)]
pub struct ServingContext<B: Backend> {
    manifest: BundleManifest,
    assembler: FeatureAssembler,
    model: CreditModel<B>,
    device: B::Device,
    threshold: f64,
}

impl<B: Backend> ServingContext<B> {
    /// Loads the bundle in `dir` onto `device`.
    ///
    /// # Arguments
    ///
    /// * `dir` - Bundle directory written by the train command.
    /// * `device` - Device to run the model on.
    /// * `threshold` - Decision threshold overriding the bundle's, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundle cannot be loaded or the threshold lies
    /// outside `[0, 1]`.
    pub fn load(dir: &Path, device: B::Device, threshold: Option<f64>) -> Result<Self> {
        let bundle = load_bundle::<B>(dir, &device)
            .with_context(|| format!("Failed to load artifact bundle from {}", dir.display()))?;

        let threshold = threshold.unwrap_or(bundle.manifest.decision_threshold);
        anyhow::ensure!(
            (0.0..=1.0).contains(&threshold),
            "Decision threshold must lie in [0, 1], got {threshold}"
        );

        Ok(Self {
            assembler: bundle.manifest.assembler(),
            manifest: bundle.manifest,
            model: bundle.model,
            device,
            threshold,
        })
    }

    #[must_use]
    pub const fn manifest(&self) -> &BundleManifest {
        &self.manifest
    }

    #[must_use]
    pub const fn assembler(&self) -> &FeatureAssembler {
        &self.assembler
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Scores a single application.
    ///
    /// # Errors
    ///
    /// Returns an error if the application fails bounds or encoding checks,
    /// or the assembled vector does not fit the fitted transforms.
    pub fn assess(&self, application: &LoanApplication) -> Result<Assessment> {
        let features = self
            .assembler
            .assemble(application)
            .context("Invalid loan application")?;
        let row = self
            .manifest
            .preprocess_row(&features.values)
            .context("Failed to preprocess features")?;

        let probabilities =
            predict_proba(&self.model, &[row], &self.device).context("Model inference failed")?;
        let probability = probabilities
            .first()
            .copied()
            .context("Model returned no prediction")?;

        let assessment = Assessment::from_probability(f64::from(probability), self.threshold);
        debug!(
            probability = assessment.probability,
            score = assessment.score,
            category = %assessment.category,
            "Assessed application"
        );
        Ok(assessment)
    }
}
