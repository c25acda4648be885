//! Inspect command - prints what a bundle contains without loading weights.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use ml_model::{BundleManifest, read_manifest};

fn kv(key: &str, value: impl std::fmt::Display) {
    println!("  {}: {}", key.white().bold(), value);
}

/// Prints a manifest summary.
pub fn print_manifest(manifest: &BundleManifest) {
    println!("{}", "=== Artifact Bundle ===".cyan().bold());
    kv("Bundle id", manifest.bundle_id);
    kv("Created", manifest.created_at.to_rfc3339());
    kv("Format version", manifest.format_version);
    kv("Schema", manifest.schema);
    kv("Features", manifest.feature_width());
    kv(
        "Projection",
        manifest
            .projector
            .as_ref()
            .map_or_else(|| "none".to_string(), |p| format!("{} components", p.output_width())),
    );
    kv(
        "Network",
        format!(
            "{} -> {} -> {} -> 1",
            manifest.model.input_size, manifest.model.hidden_size_1, manifest.model.hidden_size_2
        ),
    );
    kv("Decision threshold", manifest.decision_threshold);

    let training = &manifest.training;
    println!("\n{}", "=== Training ===".cyan().bold());
    kv("Rows read / used", format!("{} / {}", training.rows_read, training.rows_used));
    kv("Train / test rows", format!("{} / {}", training.train_rows, training.test_rows));
    kv("Epochs completed", training.output.epochs_completed);
    kv("Stopped early", training.output.stopped_early);
    if let Some(loss) = training.output.best_valid_loss {
        kv("Best validation loss", format!("{loss:.6}"));
    }

    println!("\n{}", "=== Evaluation ===".cyan().bold());
    print!("{}", manifest.evaluation);
}

/// Runs the inspect command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or is inconsistent.
pub fn run(bundle: &Path, json: bool) -> Result<BundleManifest> {
    let manifest =
        read_manifest(bundle).with_context(|| format!("Failed to read bundle {}", bundle.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        print_manifest(&manifest);
    }

    Ok(manifest)
}
