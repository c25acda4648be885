use serde::{Deserialize, Serialize};

/// Numeric columns of the historical loan export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NumericColumn {
    LoanAmount,
    InterestRate,
    Installment,
    AnnualIncome,
    DebtToIncome,
    Delinquencies2Yr,
    Inquiries6Mo,
    OpenAccounts,
    PublicRecords,
    RevolvingBalance,
    RevolvingUtilization,
    TotalAccounts,
}

impl NumericColumn {
    pub const ALL: [Self; 12] = [
        Self::LoanAmount,
        Self::InterestRate,
        Self::Installment,
        Self::AnnualIncome,
        Self::DebtToIncome,
        Self::Delinquencies2Yr,
        Self::Inquiries6Mo,
        Self::OpenAccounts,
        Self::PublicRecords,
        Self::RevolvingBalance,
        Self::RevolvingUtilization,
        Self::TotalAccounts,
    ];

    /// Returns the CSV header name for this column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LoanAmount => "loan_amnt",
            Self::InterestRate => "int_rate",
            Self::Installment => "installment",
            Self::AnnualIncome => "annual_inc",
            Self::DebtToIncome => "dti",
            Self::Delinquencies2Yr => "delinq_2yrs",
            Self::Inquiries6Mo => "inq_last_6mths",
            Self::OpenAccounts => "open_acc",
            Self::PublicRecords => "pub_rec",
            Self::RevolvingBalance => "revol_bal",
            Self::RevolvingUtilization => "revol_util",
            Self::TotalAccounts => "total_acc",
        }
    }
}

/// Free-text columns of the historical loan export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextColumn {
    EmploymentLength,
    LoanStatus,
    SubGrade,
    HomeOwnership,
    Purpose,
    Term,
    VerificationStatus,
}

impl TextColumn {
    pub const ALL: [Self; 7] = [
        Self::EmploymentLength,
        Self::LoanStatus,
        Self::SubGrade,
        Self::HomeOwnership,
        Self::Purpose,
        Self::Term,
        Self::VerificationStatus,
    ];

    /// Returns the CSV header name for this column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmploymentLength => "emp_length",
            Self::LoanStatus => "loan_status",
            Self::SubGrade => "sub_grade",
            Self::HomeOwnership => "home_ownership",
            Self::Purpose => "purpose",
            Self::Term => "term",
            Self::VerificationStatus => "verification_status",
        }
    }
}

/// One historical loan observation.
///
/// Every cell is optional: missing values are imputed downstream, never here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub loan_amnt: Option<f64>,
    pub int_rate: Option<f64>,
    pub installment: Option<f64>,
    pub annual_inc: Option<f64>,
    pub dti: Option<f64>,
    pub delinq_2yrs: Option<f64>,
    pub inq_last_6mths: Option<f64>,
    pub open_acc: Option<f64>,
    pub pub_rec: Option<f64>,
    pub revol_bal: Option<f64>,
    pub revol_util: Option<f64>,
    pub total_acc: Option<f64>,

    /// Raw employment length text, e.g. `"10+ years"` or `"< 1 year"`.
    pub emp_length: Option<String>,
    /// Raw loan status; only present in training data.
    pub loan_status: Option<String>,

    pub sub_grade: Option<String>,
    pub home_ownership: Option<String>,
    pub purpose: Option<String>,
    pub term: Option<String>,
    pub verification_status: Option<String>,
}

impl LoanRecord {
    /// Returns the value of a numeric column.
    #[must_use]
    pub const fn numeric(&self, column: NumericColumn) -> Option<f64> {
        match column {
            NumericColumn::LoanAmount => self.loan_amnt,
            NumericColumn::InterestRate => self.int_rate,
            NumericColumn::Installment => self.installment,
            NumericColumn::AnnualIncome => self.annual_inc,
            NumericColumn::DebtToIncome => self.dti,
            NumericColumn::Delinquencies2Yr => self.delinq_2yrs,
            NumericColumn::Inquiries6Mo => self.inq_last_6mths,
            NumericColumn::OpenAccounts => self.open_acc,
            NumericColumn::PublicRecords => self.pub_rec,
            NumericColumn::RevolvingBalance => self.revol_bal,
            NumericColumn::RevolvingUtilization => self.revol_util,
            NumericColumn::TotalAccounts => self.total_acc,
        }
    }

    /// Sets the value of a numeric column.
    pub fn set_numeric(&mut self, column: NumericColumn, value: Option<f64>) {
        let slot = match column {
            NumericColumn::LoanAmount => &mut self.loan_amnt,
            NumericColumn::InterestRate => &mut self.int_rate,
            NumericColumn::Installment => &mut self.installment,
            NumericColumn::AnnualIncome => &mut self.annual_inc,
            NumericColumn::DebtToIncome => &mut self.dti,
            NumericColumn::Delinquencies2Yr => &mut self.delinq_2yrs,
            NumericColumn::Inquiries6Mo => &mut self.inq_last_6mths,
            NumericColumn::OpenAccounts => &mut self.open_acc,
            NumericColumn::PublicRecords => &mut self.pub_rec,
            NumericColumn::RevolvingBalance => &mut self.revol_bal,
            NumericColumn::RevolvingUtilization => &mut self.revol_util,
            NumericColumn::TotalAccounts => &mut self.total_acc,
        };
        *slot = value;
    }

    /// Returns the value of a text column.
    #[must_use]
    pub fn text(&self, column: TextColumn) -> Option<&str> {
        match column {
            TextColumn::EmploymentLength => self.emp_length.as_deref(),
            TextColumn::LoanStatus => self.loan_status.as_deref(),
            TextColumn::SubGrade => self.sub_grade.as_deref(),
            TextColumn::HomeOwnership => self.home_ownership.as_deref(),
            TextColumn::Purpose => self.purpose.as_deref(),
            TextColumn::Term => self.term.as_deref(),
            TextColumn::VerificationStatus => self.verification_status.as_deref(),
        }
    }

    /// Sets the value of a text column.
    pub fn set_text(&mut self, column: TextColumn, value: Option<String>) {
        let slot = match column {
            TextColumn::EmploymentLength => &mut self.emp_length,
            TextColumn::LoanStatus => &mut self.loan_status,
            TextColumn::SubGrade => &mut self.sub_grade,
            TextColumn::HomeOwnership => &mut self.home_ownership,
            TextColumn::Purpose => &mut self.purpose,
            TextColumn::Term => &mut self.term,
            TextColumn::VerificationStatus => &mut self.verification_status,
        };
        *slot = value;
    }

    /// Binary default label derived from the loan status.
    #[must_use]
    pub fn default_label(&self) -> u8 {
        crate::default_label(self.loan_status.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_accessors_cover_every_column() {
        let mut record = LoanRecord::default();
        for (i, column) in NumericColumn::ALL.into_iter().enumerate() {
            record.set_numeric(column, Some(i as f64));
        }
        for (i, column) in NumericColumn::ALL.into_iter().enumerate() {
            assert_eq!(record.numeric(column), Some(i as f64), "{}", column.as_str());
        }
    }

    #[test]
    fn test_text_accessors() {
        let mut record = LoanRecord::default();
        record.set_text(TextColumn::EmploymentLength, Some("3 years".to_string()));
        assert_eq!(record.text(TextColumn::EmploymentLength), Some("3 years"));
        assert_eq!(record.text(TextColumn::Purpose), None);
    }

    #[test]
    fn test_record_label() {
        let charged_off = LoanRecord {
            loan_status: Some("Charged Off".to_string()),
            ..LoanRecord::default()
        };
        assert_eq!(charged_off.default_label(), 1);

        let paid = LoanRecord {
            loan_status: Some("Fully Paid".to_string()),
            ..LoanRecord::default()
        };
        assert_eq!(paid.default_label(), 0);
    }
}
