//! Terminal rendering of an assessment.

use colored::{ColoredString, Colorize};

use crate::context::Assessment;

/// Number of cells in the probability gauge.
pub const GAUGE_WIDTH: usize = 40;

/// Colour band of the probability gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeBand {
    /// Up to and including 40 %.
    Low,
    /// Above 40 % up to and including 70 %.
    Medium,
    /// Above 70 %.
    High,
}

impl GaugeBand {
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent <= 40.0 {
            Self::Low
        } else if percent <= 70.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    fn paint(self, text: &str) -> ColoredString {
        match self {
            Self::Low => text.green(),
            Self::Medium => text.truecolor(255, 165, 0),
            Self::High => text.red(),
        }
    }
}

/// Probability as a percentage in `[0, 100]`.
#[must_use]
pub fn percent(probability: f64) -> f64 {
    (probability * 100.0).clamp(0.0, 100.0)
}

/// Uncoloured gauge bar, e.g. `[##########..............................]`.
#[must_use]
pub fn gauge_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// Human label of the binary decision.
#[must_use]
pub const fn decision_label(assessment: &Assessment) -> &'static str {
    if assessment.is_default() {
        "DEFAULT"
    } else {
        "NO DEFAULT"
    }
}

/// Renders an assessment as a multi-line report.
#[must_use]
pub fn render(assessment: &Assessment) -> String {
    let pct = percent(assessment.probability);
    let band = GaugeBand::from_percent(pct);

    let decision = if assessment.is_default() {
        decision_label(assessment).red().bold()
    } else {
        decision_label(assessment).green().bold()
    };

    let mut out = String::new();
    out.push_str(&format!("{}\n", "=== Credit Assessment ===".cyan().bold()));
    out.push_str(&format!(
        "  {}: {}\n",
        "Default probability".white().bold(),
        band.paint(&format!("{pct:.2}%"))
    ));
    out.push_str(&format!("  {}\n", band.paint(&gauge_bar(pct, GAUGE_WIDTH))));
    out.push_str(&format!(
        "  {}: {decision} (threshold {:.2})\n",
        "Decision".white().bold(),
        assessment.threshold
    ));
    out.push_str(&format!(
        "  {}: {:.0}\n",
        "Credit score".white().bold(),
        assessment.score
    ));
    out.push_str(&format!(
        "  {}: {}\n",
        "Risk category".white().bold(),
        assessment.category
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_bands() {
        assert_eq!(GaugeBand::from_percent(0.0), GaugeBand::Low);
        assert_eq!(GaugeBand::from_percent(39.99), GaugeBand::Low);
        assert_eq!(GaugeBand::from_percent(40.0), GaugeBand::Low);
        assert_eq!(GaugeBand::from_percent(40.01), GaugeBand::Medium);
        assert_eq!(GaugeBand::from_percent(70.0), GaugeBand::Medium);
        assert_eq!(GaugeBand::from_percent(70.01), GaugeBand::High);
    }

    #[test]
    fn test_gauge_bar() {
        assert_eq!(gauge_bar(0.0, 4), "[....]");
        assert_eq!(gauge_bar(50.0, 4), "[##..]");
        assert_eq!(gauge_bar(100.0, 4), "[####]");
        assert_eq!(gauge_bar(250.0, 4), "[####]");
    }

    #[test]
    fn test_render_contains_fields() {
        colored::control::set_override(false);
        let text = render(&Assessment::from_probability(0.1234, 0.5));
        assert!(text.contains("12.34%"));
        assert!(text.contains("NO DEFAULT"));
        assert!(text.contains("Excellent"));

        let text = render(&Assessment::from_probability(0.9, 0.5));
        assert!(text.contains("DEFAULT"));
        assert!(text.contains("Poor"));
    }
}
