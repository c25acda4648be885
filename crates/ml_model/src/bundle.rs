//! Versioned on-disk bundle of everything needed to score an application.
//!
//! A bundle directory holds `manifest.json` (schema, category universes,
//! scaler, optional projector, model shape, threshold and metrics) next to
//! `model-<bundle_id>.mpk`, the Burn record of the network weights. The
//! weights file name is keyed by the manifest's id, so a manifest can only
//! ever be paired with the weights written in the same training run.

use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use chrono::{DateTime, Utc};
use feature_extractor::{CategoryUniverse, FeatureAssembler, FeatureSchema};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    ArtifactError, ClassificationReport, CreditModel, ModelConfig, PcaProjector, StandardScaler,
    TrainingOutput, TransformError,
};

/// Current manifest layout version.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// File name of the manifest inside a bundle directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Extension the Burn recorder appends to the weights stem.
const WEIGHTS_EXTENSION: &str = "mpk";

/// Architecture of the stored network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelShape {
    pub input_size: usize,
    pub hidden_size_1: usize,
    pub hidden_size_2: usize,
}

impl ModelShape {
    #[must_use]
    pub const fn from_config(config: &ModelConfig) -> Self {
        Self {
            input_size: config.input_size,
            hidden_size_1: config.hidden_size_1,
            hidden_size_2: config.hidden_size_2,
        }
    }

    #[must_use]
    pub fn to_config(self) -> ModelConfig {
        ModelConfig::new(self.input_size)
            .with_hidden_size_1(self.hidden_size_1)
            .with_hidden_size_2(self.hidden_size_2)
    }
}

/// Data volumes and losses recorded for a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Rows read from the CSV export.
    pub rows_read: usize,
    /// Rows left after cleaning.
    pub rows_used: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub seed: u64,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub output: TrainingOutput,
}

/// Everything about a bundle except the network weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub format_version: u32,
    pub bundle_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub schema: FeatureSchema,
    pub feature_names: Vec<String>,
    pub universe: CategoryUniverse,
    pub scaler: StandardScaler,
    pub projector: Option<PcaProjector>,
    pub model: ModelShape,
    pub decision_threshold: f64,
    pub training: TrainingSummary,
    pub evaluation: ClassificationReport,
}

impl BundleManifest {
    /// Creates a manifest with a fresh bundle id and the current time.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        schema: FeatureSchema,
        universe: CategoryUniverse,
        scaler: StandardScaler,
        projector: Option<PcaProjector>,
        model: ModelShape,
        decision_threshold: f64,
        training: TrainingSummary,
        evaluation: ClassificationReport,
    ) -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            bundle_id: Uuid::new_v4(),
            created_at: Utc::now(),
            feature_names: schema.feature_names(&universe),
            schema,
            universe,
            scaler,
            projector,
            model,
            decision_threshold,
            training,
            evaluation,
        }
    }

    /// Weights file name without the extension the recorder appends.
    #[must_use]
    pub fn weights_stem(&self) -> String {
        format!("model-{}", self.bundle_id)
    }

    /// Weights file name as it appears on disk.
    #[must_use]
    pub fn weights_file(&self) -> String {
        format!("{}.{WEIGHTS_EXTENSION}", self.weights_stem())
    }

    /// Width of the raw feature vector the assembler produces.
    #[must_use]
    pub fn feature_width(&self) -> usize {
        self.schema.width(&self.universe)
    }

    /// Assembler matching this bundle's schema and universe.
    #[must_use]
    pub fn assembler(&self) -> FeatureAssembler {
        FeatureAssembler::new(self.schema, self.universe.clone())
    }

    /// Applies the fitted scaler and, if present, the projector to one row.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Width`] if the row is not `feature_width` wide.
    pub fn preprocess_row(&self, row: &[f64]) -> Result<Vec<f64>, TransformError> {
        let scaled = self.scaler.transform_row(row)?;
        match &self.projector {
            Some(projector) => projector.transform_row(&scaled),
            None => Ok(scaled),
        }
    }

    /// Checks that every stage of the pipeline agrees on its widths.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first inconsistency found.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(ArtifactError::Version {
                found: self.format_version,
                expected: BUNDLE_FORMAT_VERSION,
            });
        }

        let expected_names = self.schema.feature_names(&self.universe);
        if self.feature_names != expected_names {
            return Err(ArtifactError::Inconsistent(format!(
                "feature names do not match schema {}",
                self.schema
            )));
        }

        let width = self.feature_width();
        if self.scaler.width() != width || self.scaler.scale.len() != width {
            return Err(ArtifactError::Inconsistent(format!(
                "scaler width {} does not match schema width {width}",
                self.scaler.width()
            )));
        }

        let model_input = match &self.projector {
            Some(projector) => {
                if projector.input_width() != width {
                    return Err(ArtifactError::Inconsistent(format!(
                        "projector input width {} does not match scaler width {width}",
                        projector.input_width()
                    )));
                }
                projector.output_width()
            }
            None => width,
        };

        if self.model.input_size != model_input {
            return Err(ArtifactError::Inconsistent(format!(
                "model input width {} does not match preprocessed width {model_input}",
                self.model.input_size
            )));
        }

        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(ArtifactError::Inconsistent(format!(
                "decision threshold {} is outside [0, 1]",
                self.decision_threshold
            )));
        }

        Ok(())
    }
}

/// A loaded bundle: validated manifest plus the network on a device.
#[derive(Debug)]
pub struct ArtifactBundle<B: Backend> {
    pub manifest: BundleManifest,
    pub model: CreditModel<B>,
}

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Writes a bundle into `dir`, creating the directory if needed.
///
/// The weights are written first and the manifest last, through a temporary
/// file and a rename, so a directory with a readable manifest always has
/// its weights.
///
/// # Errors
///
/// Returns an error if the manifest is inconsistent or any file cannot be
/// written.
pub fn save_bundle<B: Backend>(
    dir: &Path,
    manifest: &BundleManifest,
    model: &CreditModel<B>,
) -> Result<PathBuf, ArtifactError> {
    manifest.validate()?;
    if model.input_size() != manifest.model.input_size {
        return Err(ArtifactError::Inconsistent(format!(
            "network input width {} does not match manifest width {}",
            model.input_size(),
            manifest.model.input_size
        )));
    }

    fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let weights_path = dir.join(manifest.weights_stem());
    model
        .clone()
        .save_file(weights_path.clone(), &recorder())
        .map_err(|e| ArtifactError::Weights {
            path: weights_path.clone(),
            message: format!("{e:?}"),
        })?;

    let manifest_path = dir.join(MANIFEST_FILE);
    let temp_path = dir.join(format!("{MANIFEST_FILE}.tmp"));
    let json = serde_json::to_vec_pretty(manifest).map_err(|source| ArtifactError::Manifest {
        path: manifest_path.clone(),
        source,
    })?;
    fs::write(&temp_path, json).map_err(|source| ArtifactError::Io {
        path: temp_path.clone(),
        source,
    })?;
    fs::rename(&temp_path, &manifest_path).map_err(|source| ArtifactError::Io {
        path: manifest_path.clone(),
        source,
    })?;

    remove_stale_weights(dir, &manifest.weights_file());

    info!(
        dir = %dir.display(),
        bundle_id = %manifest.bundle_id,
        schema = %manifest.schema,
        "Saved artifact bundle"
    );

    Ok(manifest_path)
}

/// Deletes weights files left in `dir` by earlier runs.
///
/// Only `model-*.mpk` files other than `keep` are touched. Failures are
/// logged; the bundle just written is already complete.
fn remove_stale_weights(dir: &Path, keep: &str) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Could not list bundle directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let stale = name != keep
            && name.starts_with("model-")
            && Path::new(name)
                .extension()
                .is_some_and(|ext| ext == WEIGHTS_EXTENSION);
        if !stale {
            continue;
        }

        match fs::remove_file(entry.path()) {
            Ok(()) => debug!(file = name, "Removed stale weights"),
            Err(e) => warn!(file = name, error = %e, "Could not remove stale weights"),
        }
    }
}

/// Reads and validates the manifest of a bundle without loading weights.
///
/// # Errors
///
/// Returns an error if the manifest is missing, malformed, of an unsupported
/// version, or internally inconsistent.
pub fn read_manifest(dir: &Path) -> Result<BundleManifest, ArtifactError> {
    let path = dir.join(MANIFEST_FILE);
    let bytes = fs::read(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;

    // Check the version before the full parse so that a newer layout is
    // reported as such rather than as a missing field.
    #[derive(Deserialize)]
    struct VersionHeader {
        format_version: u32,
    }
    let header: VersionHeader =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Manifest {
            path: path.clone(),
            source,
        })?;
    if header.format_version != BUNDLE_FORMAT_VERSION {
        return Err(ArtifactError::Version {
            found: header.format_version,
            expected: BUNDLE_FORMAT_VERSION,
        });
    }

    let manifest: BundleManifest =
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Manifest { path, source })?;
    manifest.validate()?;
    Ok(manifest)
}

/// Loads a bundle and its network weights onto `device`.
///
/// # Errors
///
/// Returns an error if the manifest fails [`read_manifest`], or the weights
/// file named by the manifest's id is missing or does not match the stored
/// model shape.
pub fn load_bundle<B: Backend>(dir: &Path, device: &B::Device) -> Result<ArtifactBundle<B>, ArtifactError> {
    let manifest = read_manifest(dir)?;

    let weights_file = dir.join(manifest.weights_file());
    if !weights_file.is_file() {
        return Err(ArtifactError::Weights {
            path: weights_file,
            message: "file not found".to_string(),
        });
    }

    let weights_path = dir.join(manifest.weights_stem());
    let model = manifest
        .model
        .to_config()
        .init::<B>(device)
        .load_file(weights_path, &recorder(), device)
        .map_err(|e| ArtifactError::Weights {
            path: weights_file.clone(),
            message: format!("{e:?}"),
        })?;

    info!(
        dir = %dir.display(),
        bundle_id = %manifest.bundle_id,
        schema = %manifest.schema,
        projector = manifest.projector.is_some(),
        "Loaded artifact bundle"
    );

    Ok(ArtifactBundle { manifest, model })
}

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::backend::ndarray::NdArrayDevice;

    use super::*;
    use crate::predict_proba;

    type TestBackend = NdArray;

    fn training_rows(width: usize) -> Vec<Vec<f64>> {
        (0..12)
            .map(|i| (0..width).map(|j| ((i * 3 + j * 7) % 11) as f64).collect())
            .collect()
    }

    fn summary() -> TrainingSummary {
        TrainingSummary {
            rows_read: 12,
            rows_used: 12,
            train_rows: 10,
            test_rows: 2,
            seed: 42,
            epochs: 1,
            batch_size: 32,
            learning_rate: 1e-3,
            output: TrainingOutput {
                final_train_loss: 0.6,
                final_valid_loss: None,
                best_valid_loss: None,
                best_epoch: None,
                epochs_completed: 1,
                stopped_early: false,
            },
        }
    }

    fn manifest(schema: FeatureSchema, components: Option<usize>) -> BundleManifest {
        let universe = CategoryUniverse::default();
        let rows = training_rows(schema.width(&universe));
        let scaler = StandardScaler::fit(&rows).expect("scaler");
        let scaled = scaler.transform(&rows).expect("scaled");
        let projector = components.map(|k| PcaProjector::fit(&scaled, k).expect("projector"));
        let input_size = projector.as_ref().map_or(scaler.width(), PcaProjector::output_width);

        BundleManifest::new(
            schema,
            universe,
            scaler,
            projector,
            ModelShape::from_config(&ModelConfig::new(input_size)),
            0.5,
            summary(),
            ClassificationReport::from_predictions(&[0, 1], &[0, 1], 0.5),
        )
    }

    #[test]
    fn test_round_trip_preserves_predictions() {
        let dir = tempfile::tempdir().expect("temp dir");
        let device = NdArrayDevice::default();
        let manifest = manifest(FeatureSchema::Raw, None);
        let model: CreditModel<TestBackend> = manifest.model.to_config().init(&device);

        save_bundle(dir.path(), &manifest, &model).expect("save");
        assert!(dir.path().join(manifest.weights_file()).is_file());

        let loaded = load_bundle::<TestBackend>(dir.path(), &device).expect("load");
        assert_eq!(loaded.manifest.bundle_id, manifest.bundle_id);
        assert_eq!(loaded.manifest.feature_names, manifest.feature_names);
        assert_eq!(loaded.manifest.model, manifest.model);

        let rows: Vec<Vec<f64>> = training_rows(13)
            .iter()
            .map(|row| manifest.preprocess_row(row).expect("preprocess"))
            .collect();
        let before = predict_proba(&model, &rows, &device).expect("before");
        let after = predict_proba(&loaded.model, &rows, &device).expect("after");
        for (a, b) in before.iter().zip(&after) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_projector_bundle() {
        let dir = tempfile::tempdir().expect("temp dir");
        let device = NdArrayDevice::default();
        let manifest = manifest(FeatureSchema::Expanded, Some(5));
        assert_eq!(manifest.model.input_size, 5);

        let model: CreditModel<TestBackend> = manifest.model.to_config().init(&device);
        save_bundle(dir.path(), &manifest, &model).expect("save");

        let loaded = load_bundle::<TestBackend>(dir.path(), &device).expect("load");
        assert_eq!(loaded.model.input_size(), 5);

        let row = vec![1.0; manifest.feature_width()];
        assert_eq!(loaded.manifest.preprocess_row(&row).expect("preprocess").len(), 5);
    }

    #[test]
    fn test_missing_weights_fail() {
        let dir = tempfile::tempdir().expect("temp dir");
        let device = NdArrayDevice::default();
        let manifest = manifest(FeatureSchema::Raw, None);
        let model: CreditModel<TestBackend> = manifest.model.to_config().init(&device);

        save_bundle(dir.path(), &manifest, &model).expect("save");
        fs::remove_file(dir.path().join(manifest.weights_file())).expect("remove weights");

        let err = load_bundle::<TestBackend>(dir.path(), &device).expect_err("weights missing");
        assert!(matches!(err, ArtifactError::Weights { .. }));
    }

    #[test]
    fn test_weights_from_another_run_are_not_picked_up() {
        let dir = tempfile::tempdir().expect("temp dir");
        let device = NdArrayDevice::default();

        let first = manifest(FeatureSchema::Raw, None);
        let model: CreditModel<TestBackend> = first.model.to_config().init(&device);
        save_bundle(dir.path(), &first, &model).expect("save");

        // A manifest from a later run, written without its own weights.
        let second = manifest(FeatureSchema::Raw, None);
        let json = serde_json::to_vec(&second).expect("json");
        fs::write(dir.path().join(MANIFEST_FILE), json).expect("overwrite manifest");

        let err = load_bundle::<TestBackend>(dir.path(), &device).expect_err("mismatched id");
        assert!(matches!(err, ArtifactError::Weights { .. }));
    }

    #[test]
    fn test_retrain_replaces_previous_weights() {
        let dir = tempfile::tempdir().expect("temp dir");
        let device = NdArrayDevice::default();

        let first = manifest(FeatureSchema::Raw, None);
        let model: CreditModel<TestBackend> = first.model.to_config().init(&device);
        save_bundle(dir.path(), &first, &model).expect("first save");

        let unrelated = dir.path().join("notes.mpk");
        fs::write(&unrelated, b"keep me").expect("write unrelated file");

        let second = manifest(FeatureSchema::Raw, None);
        save_bundle(dir.path(), &second, &model).expect("second save");

        assert!(!dir.path().join(first.weights_file()).exists());
        assert!(dir.path().join(second.weights_file()).is_file());
        assert!(unrelated.is_file());

        let loaded = load_bundle::<TestBackend>(dir.path(), &device).expect("load");
        assert_eq!(loaded.manifest.bundle_id, second.bundle_id);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut bad = manifest(FeatureSchema::Raw, None);
        bad.model.input_size = 7;
        assert!(matches!(bad.validate(), Err(ArtifactError::Inconsistent(_))));

        let mut bad = manifest(FeatureSchema::Expanded, None);
        bad.scaler = manifest(FeatureSchema::Raw, None).scaler;
        assert!(matches!(bad.validate(), Err(ArtifactError::Inconsistent(_))));

        let mut bad = manifest(FeatureSchema::Raw, Some(3));
        bad.feature_names.pop();
        assert!(matches!(bad.validate(), Err(ArtifactError::Inconsistent(_))));
    }

    #[test]
    fn test_save_rejects_model_of_wrong_width() {
        let dir = tempfile::tempdir().expect("temp dir");
        let device = NdArrayDevice::default();
        let manifest = manifest(FeatureSchema::Raw, None);
        let model: CreditModel<TestBackend> = ModelConfig::new(4).init(&device);

        assert!(save_bundle(dir.path(), &manifest, &model).is_err());
    }

    #[test]
    fn test_unsupported_version_and_garbage() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join(MANIFEST_FILE), r#"{"format_version": 99}"#).expect("write");
        let err = read_manifest(dir.path()).expect_err("version");
        assert!(matches!(err, ArtifactError::Version { found: 99, .. }));

        fs::write(dir.path().join(MANIFEST_FILE), "not json").expect("write");
        let err = read_manifest(dir.path()).expect_err("garbage");
        assert!(matches!(err, ArtifactError::Manifest { .. }));

        let empty = tempfile::tempdir().expect("temp dir");
        let err = read_manifest(empty.path()).expect_err("missing");
        assert!(matches!(err, ArtifactError::Io { .. }));
    }
}
