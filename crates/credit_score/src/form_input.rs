//! Collecting a loan application from files, flags and prompts.

use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use feature_extractor::{CategoryUniverse, FeatureSchema, FieldKind, FormField, LoanApplication, form_fields};

/// Reads an application from a JSON file. Missing fields take their defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or contains unknown fields.
pub fn from_json_file(path: &Path) -> Result<LoanApplication> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read form {}", path.display()))?;
    from_json(&text).with_context(|| format!("Invalid form {}", path.display()))
}

/// Parses an application from JSON text.
///
/// # Errors
///
/// Returns an error if the text is not a JSON object of known form fields.
pub fn from_json(text: &str) -> Result<LoanApplication> {
    Ok(serde_json::from_str(text)?)
}

/// Splits a `name=value` override.
///
/// # Errors
///
/// Returns an error if there is no `=` or the name is empty.
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected name=value, got {raw:?}"))?;
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "Empty field name in {raw:?}");
    Ok((name.to_string(), value.trim().to_string()))
}

/// Applies `name=value` overrides in order.
///
/// # Errors
///
/// Returns an error for malformed overrides, unknown fields or non-numeric
/// values for numeric fields.
pub fn apply_overrides(application: &mut LoanApplication, overrides: &[String]) -> Result<()> {
    for raw in overrides {
        let (name, value) = parse_assignment(raw)?;
        application
            .set(&name, &value)
            .with_context(|| format!("Invalid override {raw:?}"))?;
    }
    Ok(())
}

fn describe(field: &FormField, universe: &CategoryUniverse, current: &str) -> String {
    let mut prompt = field.label.to_string();
    match field.kind {
        FieldKind::Number { min, max, .. } => match max {
            Some(max) => prompt.push_str(&format!(" [{min} to {max}]")),
            None => prompt.push_str(&format!(" [>= {min}]")),
        },
        FieldKind::Choice { .. } => {
            prompt.push_str(&format!(" ({})", field.options(universe).join(", ")));
        }
    }
    if let Some(help) = field.help {
        prompt.push_str(&format!("\n  {help}"));
    }
    prompt.push_str(&format!("\n  {} (default {current}): ", field.name));
    prompt
}

/// Prompts for every field the schema uses, starting from `application`.
///
/// An empty answer keeps the current value. Invalid answers are reported
/// and asked again; end of input keeps the remaining values.
///
/// # Errors
///
/// Returns an error if reading or writing the terminal fails.
pub fn prompt<R: BufRead, W: Write>(
    application: &mut LoanApplication,
    schema: FeatureSchema,
    universe: &CategoryUniverse,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    for field in form_fields(schema) {
        loop {
            let current = match field.kind {
                FieldKind::Number { .. } => application.number(field.name).unwrap_or_default().to_string(),
                FieldKind::Choice { .. } => application.choice(field.name).unwrap_or_default().to_string(),
            };
            write!(output, "{}", describe(field, universe, &current))?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                return Ok(());
            }
            let answer = line.trim();
            if answer.is_empty() {
                break;
            }

            let checked = application.set(field.name, answer).map_err(anyhow::Error::from).and_then(|()| {
                if let Some(value) = application.number(field.name) {
                    field.check(value)?;
                } else if let Err(e) = field.check_choice(answer, universe) {
                    anyhow::bail!("{answer:?} is not one of the listed options: {e}");
                }
                Ok(())
            });
            match checked {
                Ok(()) => break,
                Err(e) => {
                    writeln!(output, "  {e}")?;
                    // Restore the previous value before asking again.
                    application.set(field.name, &current)?;
                }
            }
        }
    }
    Ok(())
}
