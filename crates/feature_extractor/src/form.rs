//! The loan application form collected at serving time.

use loan_structs::SubGrade;
use serde::{Deserialize, Serialize};

use crate::{
    AssemblyError, BoundsError, CategoricalField, CategoryUniverse, EXPANDED_LEADING_COLUMNS,
    EXPANDED_TRAILING_COLUMNS, EncodingError, FeatureSchema, RAW_COLUMNS, TERM_VALUES,
    VERIFICATION_STATUS_VALUES, encode_sub_grade, encode_term, encode_verification_status,
};

/// Input widget behind a form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Free numeric input within `[min, max]`; `max` of `None` is unbounded.
    Number {
        min: f64,
        max: Option<f64>,
        default: f64,
    },
    /// Selection from a closed list of options.
    Choice { default: &'static str },
}

/// Declaration of a single form field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub help: Option<&'static str>,
    pub kind: FieldKind,
}

const fn number(name: &'static str, label: &'static str, min: f64, max: Option<f64>, default: f64) -> FormField {
    FormField {
        name,
        label,
        help: None,
        kind: FieldKind::Number { min, max, default },
    }
}

const fn choice(name: &'static str, label: &'static str, default: &'static str) -> FormField {
    FormField {
        name,
        label,
        help: None,
        kind: FieldKind::Choice { default },
    }
}

/// Every field any schema may ask for.
pub const FORM_FIELDS: [FormField; 18] = [
    number("loan_amnt", "Loan amount", 0.0, None, 10_000.0),
    number("int_rate", "Interest rate (%)", 0.0, Some(100.0), 10.0),
    number("installment", "Monthly installment", 0.01, None, 250.0),
    number("annual_inc", "Annual income", 0.01, None, 60_000.0),
    FormField {
        help: Some("Monthly debt payments divided by monthly income, in percent"),
        ..number("dti", "Debt-to-income ratio", 0.0, Some(100.0), 25.0)
    },
    number("delinq_2yrs", "30+ day delinquencies in the last 2 years", 0.0, None, 0.0),
    number("inq_last_6mths", "Credit inquiries in the last 6 months", 0.0, None, 0.0),
    number("open_acc", "Open credit lines", 0.0, None, 0.0),
    FormField {
        help: Some("Derogatory public records such as bankruptcies or liens"),
        ..number("pub_rec", "Derogatory public records", 0.0, None, 0.0)
    },
    number("revol_bal", "Revolving balance", 0.0, None, 0.0),
    number("revol_util", "Revolving utilization (%)", 0.0, None, 0.0),
    number("total_acc", "Total credit lines", 0.0, None, 0.0),
    number("emp_length", "Employment length (years)", 0.0, Some(100.0), 0.0),
    choice("sub_grade", "Sub grade", "A1"),
    choice("home_ownership", "Home ownership", "ANY"),
    choice("purpose", "Loan purpose", "car"),
    choice("term", "Loan term", "36 months"),
    choice("verification_status", "Income verification status", "Not Verified"),
];

/// Looks up a field declaration by name.
#[must_use]
pub fn form_field(name: &str) -> Option<&'static FormField> {
    FORM_FIELDS.iter().find(|f| f.name == name)
}

/// Fields the form asks for under a schema, in model order.
#[must_use]
pub fn form_fields(schema: FeatureSchema) -> Vec<&'static FormField> {
    let names: Vec<&str> = match schema {
        FeatureSchema::Raw => RAW_COLUMNS.to_vec(),
        FeatureSchema::Expanded => EXPANDED_LEADING_COLUMNS
            .into_iter()
            .chain(["home_ownership", "purpose"])
            .chain(EXPANDED_TRAILING_COLUMNS)
            .collect(),
    };

    names.into_iter().filter_map(form_field).collect()
}

impl FormField {
    /// Options offered by a choice field; empty for numeric fields.
    #[must_use]
    pub fn options(&self, universe: &CategoryUniverse) -> Vec<String> {
        match (self.kind, self.name) {
            (FieldKind::Number { .. }, _) => Vec::new(),
            (_, "sub_grade") => SubGrade::all().map(|s| s.to_string()).collect(),
            (_, "home_ownership") => universe.values(CategoricalField::HomeOwnership).to_vec(),
            (_, "purpose") => universe.values(CategoricalField::Purpose).to_vec(),
            (_, "term") => TERM_VALUES.iter().map(|(name, _)| (*name).to_string()).collect(),
            (_, "verification_status") => VERIFICATION_STATUS_VALUES
                .iter()
                .map(|(name, _)| (*name).to_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Checks a choice answer with the same encoder the assembler applies,
    /// so `"b3"` passes here exactly when it would encode. Numeric fields
    /// accept anything.
    ///
    /// # Errors
    ///
    /// Returns the [`EncodingError`] the assembler would raise for the value.
    pub fn check_choice(&self, value: &str, universe: &CategoryUniverse) -> Result<(), EncodingError> {
        match (self.kind, self.name) {
            (FieldKind::Number { .. }, _) => Ok(()),
            (_, "sub_grade") => encode_sub_grade(value).map(drop),
            (_, "term") => encode_term(value).map(drop),
            (_, "verification_status") => encode_verification_status(value).map(drop),
            (_, "home_ownership") => universe.index_of(CategoricalField::HomeOwnership, value).map(drop),
            (_, "purpose") => universe.index_of(CategoricalField::Purpose, value).map(drop),
            _ => Ok(()),
        }
    }

    /// Checks a numeric value against the declared bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`BoundsError`] if the value lies outside the bounds or is not finite.
    pub fn check(&self, value: f64) -> Result<(), BoundsError> {
        let FieldKind::Number { min, max, .. } = self.kind else {
            return Ok(());
        };

        let upper = max.unwrap_or(f64::INFINITY);
        if value.is_finite() && value >= min && value <= upper {
            Ok(())
        } else {
            Err(BoundsError {
                field: self.name,
                value,
                min,
                max: upper,
            })
        }
    }
}

/// A loan application as entered in the form.
///
/// Unspecified fields keep the form defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoanApplication {
    pub loan_amnt: f64,
    pub int_rate: f64,
    pub installment: f64,
    pub annual_inc: f64,
    pub dti: f64,
    pub delinq_2yrs: f64,
    pub inq_last_6mths: f64,
    pub open_acc: f64,
    pub pub_rec: f64,
    pub revol_bal: f64,
    pub revol_util: f64,
    pub total_acc: f64,
    pub emp_length: f64,
    pub sub_grade: String,
    pub home_ownership: String,
    pub purpose: String,
    pub term: String,
    pub verification_status: String,
}

impl Default for LoanApplication {
    fn default() -> Self {
        let mut application = Self {
            loan_amnt: 0.0,
            int_rate: 0.0,
            installment: 0.0,
            annual_inc: 0.0,
            dti: 0.0,
            delinq_2yrs: 0.0,
            inq_last_6mths: 0.0,
            open_acc: 0.0,
            pub_rec: 0.0,
            revol_bal: 0.0,
            revol_util: 0.0,
            total_acc: 0.0,
            emp_length: 0.0,
            sub_grade: String::new(),
            home_ownership: String::new(),
            purpose: String::new(),
            term: String::new(),
            verification_status: String::new(),
        };

        for field in &FORM_FIELDS {
            match field.kind {
                FieldKind::Number { default, .. } => {
                    if let Some(slot) = application.number_mut(field.name) {
                        *slot = default;
                    }
                }
                FieldKind::Choice { default } => {
                    if let Some(slot) = application.choice_mut(field.name) {
                        *slot = default.to_string();
                    }
                }
            }
        }

        application
    }
}

impl LoanApplication {
    /// Returns a numeric field by name.
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        Some(match name {
            "loan_amnt" => self.loan_amnt,
            "int_rate" => self.int_rate,
            "installment" => self.installment,
            "annual_inc" => self.annual_inc,
            "dti" => self.dti,
            "delinq_2yrs" => self.delinq_2yrs,
            "inq_last_6mths" => self.inq_last_6mths,
            "open_acc" => self.open_acc,
            "pub_rec" => self.pub_rec,
            "revol_bal" => self.revol_bal,
            "revol_util" => self.revol_util,
            "total_acc" => self.total_acc,
            "emp_length" => self.emp_length,
            _ => return None,
        })
    }

    /// Returns a choice field by name.
    #[must_use]
    pub fn choice(&self, name: &str) -> Option<&str> {
        Some(match name {
            "sub_grade" => &self.sub_grade,
            "home_ownership" => &self.home_ownership,
            "purpose" => &self.purpose,
            "term" => &self.term,
            "verification_status" => &self.verification_status,
            _ => return None,
        })
    }

    fn number_mut(&mut self, name: &str) -> Option<&mut f64> {
        Some(match name {
            "loan_amnt" => &mut self.loan_amnt,
            "int_rate" => &mut self.int_rate,
            "installment" => &mut self.installment,
            "annual_inc" => &mut self.annual_inc,
            "dti" => &mut self.dti,
            "delinq_2yrs" => &mut self.delinq_2yrs,
            "inq_last_6mths" => &mut self.inq_last_6mths,
            "open_acc" => &mut self.open_acc,
            "pub_rec" => &mut self.pub_rec,
            "revol_bal" => &mut self.revol_bal,
            "revol_util" => &mut self.revol_util,
            "total_acc" => &mut self.total_acc,
            "emp_length" => &mut self.emp_length,
            _ => return None,
        })
    }

    fn choice_mut(&mut self, name: &str) -> Option<&mut String> {
        Some(match name {
            "sub_grade" => &mut self.sub_grade,
            "home_ownership" => &mut self.home_ownership,
            "purpose" => &mut self.purpose,
            "term" => &mut self.term,
            "verification_status" => &mut self.verification_status,
            _ => return None,
        })
    }

    /// Sets a field from its textual form input.
    ///
    /// Numeric fields are parsed but not range-checked here; bounds are
    /// enforced when the application is assembled.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown field names or non-numeric input to a
    /// numeric field.
    pub fn set(&mut self, name: &str, raw: &str) -> Result<(), AssemblyError> {
        let field = form_field(name).ok_or_else(|| AssemblyError::UnknownField(name.to_string()))?;

        match field.kind {
            FieldKind::Number { .. } => {
                let value: f64 = raw.trim().parse().map_err(|_| AssemblyError::NotANumber {
                    field: field.name,
                    value: raw.to_string(),
                })?;
                if let Some(slot) = self.number_mut(field.name) {
                    *slot = value;
                }
            }
            FieldKind::Choice { .. } => {
                if let Some(slot) = self.choice_mut(field.name) {
                    *slot = raw.trim().to_string();
                }
            }
        }

        Ok(())
    }

    /// Checks every numeric field the schema uses against its bounds.
    ///
    /// # Errors
    ///
    /// Returns the first [`BoundsError`] encountered in model order.
    pub fn check_bounds(&self, schema: FeatureSchema) -> Result<(), BoundsError> {
        for field in form_fields(schema) {
            if let Some(value) = self.number(field.name) {
                field.check(value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let application = LoanApplication::default();
        assert!((application.annual_inc - 60_000.0).abs() < f64::EPSILON);
        assert!((application.dti - 25.0).abs() < f64::EPSILON);
        assert!((application.int_rate - 10.0).abs() < f64::EPSILON);
        assert!((application.installment - 250.0).abs() < f64::EPSILON);
        assert_eq!(application.sub_grade, "A1");
        assert_eq!(application.home_ownership, "ANY");
        assert_eq!(application.purpose, "car");
        assert_eq!(application.term, "36 months");
        assert_eq!(application.verification_status, "Not Verified");
        assert!(application.check_bounds(FeatureSchema::Raw).is_ok());
        assert!(application.check_bounds(FeatureSchema::Expanded).is_ok());
    }

    #[test]
    fn test_form_fields_per_schema() {
        let raw: Vec<&str> = form_fields(FeatureSchema::Raw).iter().map(|f| f.name).collect();
        assert_eq!(raw, RAW_COLUMNS.to_vec());

        let expanded = form_fields(FeatureSchema::Expanded);
        assert_eq!(expanded.len(), 14);
        assert_eq!(expanded[2].name, "sub_grade");
        assert_eq!(expanded[13].name, "installment");
    }

    #[test]
    fn test_set_fields() {
        let mut application = LoanApplication::default();
        application.set("dti", "17.5").expect("numeric field");
        application.set("purpose", " wedding ").expect("choice field");

        assert!((application.dti - 17.5).abs() < f64::EPSILON);
        assert_eq!(application.purpose, "wedding");

        assert!(matches!(
            application.set("salary", "1"),
            Err(AssemblyError::UnknownField(_))
        ));
        assert!(matches!(
            application.set("dti", "lots"),
            Err(AssemblyError::NotANumber { field: "dti", .. })
        ));
    }

    #[test]
    fn test_bounds() {
        let mut application = LoanApplication::default();
        application.dti = 150.0;
        let err = application
            .check_bounds(FeatureSchema::Expanded)
            .expect_err("dti above 100");
        assert_eq!(err.field, "dti");

        let mut application = LoanApplication::default();
        application.annual_inc = 0.0;
        assert!(application.check_bounds(FeatureSchema::Raw).is_err());

        let mut application = LoanApplication::default();
        application.open_acc = -1.0;
        assert!(application.check_bounds(FeatureSchema::Raw).is_err());
    }

    #[test]
    fn test_choice_options() {
        let universe = CategoryUniverse::default();
        let sub_grade = form_field("sub_grade").expect("declared");
        assert_eq!(sub_grade.options(&universe).len(), 35);

        let purpose = form_field("purpose").expect("declared");
        assert_eq!(purpose.options(&universe).len(), 14);

        let dti = form_field("dti").expect("declared");
        assert!(dti.options(&universe).is_empty());
    }

    #[test]
    fn test_choice_check_matches_encoders() {
        let universe = CategoryUniverse::default();
        let sub_grade = form_field("sub_grade").expect("declared");
        assert!(sub_grade.check_choice("B3", &universe).is_ok());
        assert!(sub_grade.check_choice("b3", &universe).is_ok());
        assert!(sub_grade.check_choice("H1", &universe).is_err());

        let term = form_field("term").expect("declared");
        assert!(term.check_choice(" 60 months ", &universe).is_ok());
        assert!(term.check_choice("48 months", &universe).is_err());

        let purpose = form_field("purpose").expect("declared");
        assert!(purpose.check_choice("medical", &universe).is_ok());
        assert!(matches!(
            purpose.check_choice("yacht", &universe),
            Err(EncodingError::UnknownCategory { .. })
        ));

        let dti = form_field("dti").expect("declared");
        assert!(dti.check_choice("anything", &universe).is_ok());
    }

    #[test]
    fn test_partial_json_form_uses_defaults() {
        let application: LoanApplication =
            serde_json::from_str(r#"{"annual_inc": 85000, "purpose": "medical"}"#).expect("valid form");
        assert!((application.annual_inc - 85_000.0).abs() < f64::EPSILON);
        assert_eq!(application.purpose, "medical");
        assert_eq!(application.home_ownership, "ANY");

        let unknown = serde_json::from_str::<LoanApplication>(r#"{"salary": 1}"#);
        assert!(unknown.is_err());
    }
}
