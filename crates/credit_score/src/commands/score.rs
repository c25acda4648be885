//! Score command - assesses one loan application against a trained bundle.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use feature_extractor::LoanApplication;
use tracing::info;

use super::{InferenceBackend, init_device};
use crate::context::{Assessment, ServingContext};
use crate::form_input::{apply_overrides, from_json_file, prompt};
use crate::render::{decision_label, percent, render};

/// Where the application comes from and how to print the result.
#[derive(Debug, Clone, Default)]
pub struct ScoreOptions {
    pub bundle: PathBuf,
    /// JSON file with form fields.
    pub form: Option<PathBuf>,
    /// `name=value` overrides applied after the file.
    pub overrides: Vec<String>,
    /// Prompt for each field on the terminal.
    pub interactive: bool,
    pub threshold: Option<f64>,
    pub json: bool,
}

/// Builds the application from the form file, overrides and prompts.
///
/// # Errors
///
/// Returns an error if any input source is malformed.
pub fn collect_application(
    options: &ScoreOptions,
    context: &ServingContext<InferenceBackend>,
) -> Result<LoanApplication> {
    let mut application = match &options.form {
        Some(path) => from_json_file(path)?,
        None => LoanApplication::default(),
    };
    apply_overrides(&mut application, &options.overrides)?;

    if options.interactive {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        prompt(
            &mut application,
            context.manifest().schema,
            context.assembler().universe(),
            &mut input,
            &mut output,
        )?;
    }

    Ok(application)
}

/// Machine-readable form of an assessment.
#[must_use]
pub fn to_json(assessment: &Assessment) -> serde_json::Value {
    serde_json::json!({
        "probability": assessment.probability,
        "probability_percent": (percent(assessment.probability) * 100.0).round() / 100.0,
        "decision": assessment.decision,
        "decision_label": decision_label(assessment),
        "threshold": assessment.threshold,
        "score": assessment.score,
        "category": assessment.category,
    })
}

/// Runs the score command.
///
/// The bundle is loaded once into a [`ServingContext`] before any input is
/// read; a bundle that fails to load ends the command.
///
/// # Errors
///
/// Returns an error if the bundle cannot be loaded or the application is
/// invalid.
pub fn run(options: &ScoreOptions) -> Result<Assessment> {
    let context = ServingContext::<InferenceBackend>::load(&options.bundle, init_device(), options.threshold)?;
    info!(
        bundle_id = %context.manifest().bundle_id,
        schema = %context.manifest().schema,
        threshold = context.threshold(),
        "Serving context ready"
    );

    let application = collect_application(options, &context)?;
    let assessment = context.assess(&application)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&assessment))?);
    } else {
        print!("{}", render(&assessment));
    }

    Ok(assessment)
}
