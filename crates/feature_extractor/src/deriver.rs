//! Training-time derivation of the feature matrix and default labels.

use loan_structs::{LoanRecord, NumericColumn};
use tracing::{debug, info, warn};

use crate::{
    CategoricalField, CategoryUniverse, DeriveError, EncodingError, FeatureSchema, encode_sub_grade,
    encode_term, encode_verification_status, parse_emp_length,
};

/// Feature matrix and labels ready for splitting and scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedDataset {
    pub schema: FeatureSchema,
    pub feature_names: Vec<String>,
    /// One row per usable record, each `schema.width(universe)` wide.
    pub features: Vec<Vec<f64>>,
    /// Binary default label per row.
    pub labels: Vec<u8>,
    /// Column means used to fill missing cells.
    pub column_means: Vec<f64>,
    /// Records dropped because a categorical cell was missing or unknown.
    pub skipped_rows: usize,
    /// Number of cells filled with their column mean.
    pub imputed_cells: usize,
}

impl DerivedDataset {
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Number of rows labelled as default.
    #[must_use]
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l == 1).count()
    }
}

/// Why a record could not be turned into a row.
#[derive(Debug)]
enum RowRejection {
    Missing(&'static str),
    Encoding(EncodingError),
}

impl From<EncodingError> for RowRejection {
    fn from(e: EncodingError) -> Self {
        Self::Encoding(e)
    }
}

/// Derives the training matrix for a schema.
///
/// Missing numeric cells are filled with the mean of the non-missing values of
/// their column across all usable records. The means are computed once here,
/// before any split, so train and test rows are imputed identically.
///
/// # Arguments
///
/// * `records` - Loan records as read from the export.
/// * `schema` - Feature layout to derive.
/// * `universe` - Allowed categorical values for the one-hot blocks.
///
/// # Errors
///
/// Returns [`DeriveError::EmptyDataset`] if no record survives cleaning.
pub fn derive_training_set(
    records: &[LoanRecord],
    schema: FeatureSchema,
    universe: &CategoryUniverse,
) -> Result<DerivedDataset, DeriveError> {
    let width = schema.width(universe);

    let mut partial_rows: Vec<Vec<Option<f64>>> = Vec::with_capacity(records.len());
    let mut labels = Vec::with_capacity(records.len());
    let mut skipped_rows = 0;

    for (idx, record) in records.iter().enumerate() {
        match derive_row(record, schema, universe) {
            Ok(row) => {
                debug_assert_eq!(row.len(), width);
                partial_rows.push(row);
                labels.push(record.default_label());
            }
            Err(RowRejection::Missing(column)) => {
                debug!(row = idx, column, "Skipping record with missing categorical value");
                skipped_rows += 1;
            }
            Err(RowRejection::Encoding(e)) => {
                debug!(row = idx, error = %e, "Skipping record with unencodable value");
                skipped_rows += 1;
            }
        }
    }

    if partial_rows.is_empty() {
        return Err(DeriveError::EmptyDataset { skipped: skipped_rows });
    }
    if skipped_rows > 0 {
        warn!(skipped = skipped_rows, "Dropped records that could not be encoded");
    }

    let column_means = column_means(&partial_rows, width);

    let mut imputed_cells = 0;
    let features: Vec<Vec<f64>> = partial_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&column_means)
                .map(|(cell, &mean)| {
                    cell.unwrap_or_else(|| {
                        imputed_cells += 1;
                        mean
                    })
                })
                .collect()
        })
        .collect();

    info!(
        schema = %schema,
        rows = features.len(),
        features = width,
        imputed_cells,
        skipped_rows,
        "Derived training set"
    );

    Ok(DerivedDataset {
        schema,
        feature_names: schema.feature_names(universe),
        features,
        labels,
        column_means,
        skipped_rows,
        imputed_cells,
    })
}

/// Mean of the present values of each column; 0.0 for all-missing columns.
fn column_means(rows: &[Vec<Option<f64>>], width: usize) -> Vec<f64> {
    let mut sums = vec![0.0; width];
    let mut counts = vec![0usize; width];

    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                sums[col] += value;
                counts[col] += 1;
            }
        }
    }

    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| if count == 0 { 0.0 } else { sum / count as f64 })
        .collect()
}

fn derive_row(
    record: &LoanRecord,
    schema: FeatureSchema,
    universe: &CategoryUniverse,
) -> Result<Vec<Option<f64>>, RowRejection> {
    match schema {
        FeatureSchema::Raw => {
            // Raw column order is the numeric column order followed by emp_length.
            let mut row: Vec<Option<f64>> =
                NumericColumn::ALL.into_iter().map(|c| record.numeric(c)).collect();
            row.push(parse_emp_length(record.emp_length.as_deref()));
            Ok(row)
        }
        FeatureSchema::Expanded => {
            let sub_grade = required(record.sub_grade.as_deref(), "sub_grade")?;
            let home_ownership = required(record.home_ownership.as_deref(), "home_ownership")?;
            let purpose = required(record.purpose.as_deref(), "purpose")?;
            let term = required(record.term.as_deref(), "term")?;
            let verification = required(record.verification_status.as_deref(), "verification_status")?;

            let mut row = vec![
                record.annual_inc,
                record.dti,
                Some(encode_sub_grade(sub_grade)?),
                record.open_acc,
                record.total_acc,
                record.inq_last_6mths,
                record.delinq_2yrs,
                record.int_rate,
                record.pub_rec,
            ];
            row.extend(
                universe
                    .one_hot(CategoricalField::HomeOwnership, home_ownership)?
                    .into_iter()
                    .map(Some),
            );
            row.extend(
                universe
                    .one_hot(CategoricalField::Purpose, purpose)?
                    .into_iter()
                    .map(Some),
            );
            row.push(Some(encode_term(term)?));
            row.push(Some(encode_verification_status(verification)?));
            row.push(record.installment);
            Ok(row)
        }
    }
}

fn required<'a>(value: Option<&'a str>, column: &'static str) -> Result<&'a str, RowRejection> {
    value.ok_or(RowRejection::Missing(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EXPANDED_FEATURE_COUNT, RAW_FEATURE_COUNT};

    fn raw_record(status: &str, emp_length: Option<&str>, loan_amnt: Option<f64>) -> LoanRecord {
        LoanRecord {
            loan_amnt,
            int_rate: Some(12.0),
            installment: Some(300.0),
            annual_inc: Some(50_000.0),
            dti: Some(18.0),
            delinq_2yrs: Some(0.0),
            inq_last_6mths: Some(1.0),
            open_acc: Some(7.0),
            pub_rec: Some(0.0),
            revol_bal: Some(4_000.0),
            revol_util: Some(40.0),
            total_acc: Some(15.0),
            emp_length: emp_length.map(str::to_string),
            loan_status: Some(status.to_string()),
            ..LoanRecord::default()
        }
    }

    fn expanded_record(home_ownership: &str) -> LoanRecord {
        LoanRecord {
            sub_grade: Some("B3".to_string()),
            home_ownership: Some(home_ownership.to_string()),
            purpose: Some("debt_consolidation".to_string()),
            term: Some("60 months".to_string()),
            verification_status: Some("Verified".to_string()),
            ..raw_record("Fully Paid", Some("5 years"), Some(1_000.0))
        }
    }

    #[test]
    fn test_labels_follow_status() {
        let records = vec![
            raw_record("Charged Off", Some("3 years"), Some(1_000.0)),
            raw_record("Fully Paid", Some("3 years"), Some(2_000.0)),
        ];
        let derived =
            derive_training_set(&records, FeatureSchema::Raw, &CategoryUniverse::default()).expect("derives");

        assert_eq!(derived.labels, vec![1, 0]);
        assert_eq!(derived.positive_count(), 1);
    }

    #[test]
    fn test_raw_rows_and_imputation() {
        let records = vec![
            raw_record("Fully Paid", Some("10+ years"), Some(1_000.0)),
            raw_record("Fully Paid", None, Some(3_000.0)),
            raw_record("Fully Paid", Some("no digits"), None),
        ];
        let derived =
            derive_training_set(&records, FeatureSchema::Raw, &CategoryUniverse::default()).expect("derives");

        assert_eq!(derived.len(), 3);
        assert!(derived.features.iter().all(|row| row.len() == RAW_FEATURE_COUNT));

        // emp_length: "10+ years" -> 10, missing -> 0, no digits -> mean of (10, 0).
        assert!((derived.features[0][12] - 10.0).abs() < f64::EPSILON);
        assert!(derived.features[1][12].abs() < f64::EPSILON);
        assert!((derived.features[2][12] - 5.0).abs() < f64::EPSILON);

        // loan_amnt missing -> mean of (1000, 3000).
        assert!((derived.features[2][0] - 2_000.0).abs() < f64::EPSILON);
        assert_eq!(derived.imputed_cells, 2);
    }

    #[test]
    fn test_all_missing_column_imputes_zero() {
        let records = vec![
            raw_record("Fully Paid", None, None),
            raw_record("Charged Off", None, None),
        ];
        let derived =
            derive_training_set(&records, FeatureSchema::Raw, &CategoryUniverse::default()).expect("derives");
        assert!(derived.features.iter().all(|row| row[0].abs() < f64::EPSILON));
    }

    #[test]
    fn test_expanded_rows() {
        let records = vec![expanded_record("RENT"), expanded_record("CASTLE")];
        let derived = derive_training_set(&records, FeatureSchema::Expanded, &CategoryUniverse::default())
            .expect("derives");

        assert_eq!(derived.len(), 1);
        assert_eq!(derived.skipped_rows, 1);

        let row = &derived.features[0];
        assert_eq!(row.len(), EXPANDED_FEATURE_COUNT);
        assert!((row[2] - 6.4).abs() < 1e-9);
        assert!((row[14] - 1.0).abs() < f64::EPSILON, "RENT is the last home ownership flag");
        assert!((row[9..15].iter().sum::<f64>() - 1.0).abs() < f64::EPSILON);
        assert!((row[15..29].iter().sum::<f64>() - 1.0).abs() < f64::EPSILON);
        assert!((row[29] - 1.0).abs() < f64::EPSILON);
        assert!((row[30] - 2.0).abs() < f64::EPSILON);
        assert!((row[31] - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_after_cleaning() {
        let mut record = expanded_record("RENT");
        record.sub_grade = None;

        let err = derive_training_set(&[record], FeatureSchema::Expanded, &CategoryUniverse::default())
            .expect_err("nothing usable");
        assert_eq!(err, DeriveError::EmptyDataset { skipped: 1 });

        let err = derive_training_set(&[], FeatureSchema::Raw, &CategoryUniverse::default())
            .expect_err("no records");
        assert_eq!(err, DeriveError::EmptyDataset { skipped: 0 });
    }
}
