//! Scalar encodings shared by the training deriver and the serving assembler.

use loan_structs::SubGrade;

use crate::EncodingError;

/// Loan terms and their encoded value.
pub const TERM_VALUES: [(&str, f64); 2] = [("36 months", 0.0), ("60 months", 1.0)];

/// Verification statuses and their encoded value.
///
/// `Source Verified` shares the code of `Not Verified`; the deployed model
/// was fitted with these exact codes.
pub const VERIFICATION_STATUS_VALUES: [(&str, f64); 3] = [
    ("Not Verified", 0.0),
    ("Source Verified", 0.0),
    ("Verified", 2.0),
];

/// Parses an employment length into years.
///
/// Missing text counts as zero years, `"10+ years"` as ten, and any other
/// text is reduced to its first run of digits (`"< 1 year"` is one year).
/// Text without digits yields `None`.
#[must_use]
pub fn parse_emp_length(text: Option<&str>) -> Option<f64> {
    let Some(text) = text else {
        return Some(0.0);
    };

    let text = text.trim();
    if text == "10+ years" {
        return Some(10.0);
    }

    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();

    digits.parse::<f64>().ok()
}

/// Encodes a sub-grade label such as `"B3"` into its ordinal value.
///
/// # Errors
///
/// Returns [`EncodingError::SubGrade`] if the label is not `A1`..`G5`.
pub fn encode_sub_grade(label: &str) -> Result<f64, EncodingError> {
    Ok(label.parse::<SubGrade>()?.ordinal())
}

/// Encodes a loan term.
///
/// # Errors
///
/// Returns [`EncodingError::Term`] for terms outside [`TERM_VALUES`].
pub fn encode_term(term: &str) -> Result<f64, EncodingError> {
    lookup(&TERM_VALUES, term).ok_or_else(|| EncodingError::Term(term.to_string()))
}

/// Encodes a verification status.
///
/// # Errors
///
/// Returns [`EncodingError::VerificationStatus`] for statuses outside
/// [`VERIFICATION_STATUS_VALUES`].
pub fn encode_verification_status(status: &str) -> Result<f64, EncodingError> {
    lookup(&VERIFICATION_STATUS_VALUES, status)
        .ok_or_else(|| EncodingError::VerificationStatus(status.to_string()))
}

fn lookup(table: &[(&str, f64)], value: &str) -> Option<f64> {
    let value = value.trim();
    table.iter().find(|(name, _)| *name == value).map(|&(_, code)| code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emp_length() {
        assert_eq!(parse_emp_length(Some("10+ years")), Some(10.0));
        assert_eq!(parse_emp_length(None), Some(0.0));
        assert_eq!(parse_emp_length(Some("3 years")), Some(3.0));
        assert_eq!(parse_emp_length(Some("< 1 year")), Some(1.0));
        assert_eq!(parse_emp_length(Some("1 year")), Some(1.0));
        assert_eq!(parse_emp_length(Some("unknown")), None);
    }

    #[test]
    fn test_sub_grade_encoding() {
        assert!((encode_sub_grade("A1").expect("valid") - 7.0).abs() < 1e-9);
        assert!((encode_sub_grade("A5").expect("valid") - 7.8).abs() < 1e-9);
        assert!((encode_sub_grade("G1").expect("valid") - 1.0).abs() < 1e-9);
        assert!((encode_sub_grade("D3").expect("valid") - 4.4).abs() < 1e-9);
        assert!(matches!(encode_sub_grade("Z9"), Err(EncodingError::SubGrade(_))));
    }

    #[test]
    fn test_term_encoding() {
        assert_eq!(encode_term("36 months"), Ok(0.0));
        assert_eq!(encode_term(" 60 months"), Ok(1.0));
        assert!(encode_term("12 months").is_err());
    }

    #[test]
    fn test_verification_status_encoding() {
        assert_eq!(encode_verification_status("Not Verified"), Ok(0.0));
        assert_eq!(encode_verification_status("Source Verified"), Ok(0.0));
        assert_eq!(encode_verification_status("Verified"), Ok(2.0));
        assert!(encode_verification_status("verified").is_err());
    }
}
