//! Serving-time assembly of a feature vector from an application form.

use crate::{
    AssemblyError, CategoricalField, CategoryUniverse, FeatureSchema, FeatureVector, LoanApplication,
    encode_sub_grade, encode_term, encode_verification_status,
};

/// Builds feature vectors in the exact column order of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAssembler {
    schema: FeatureSchema,
    universe: CategoryUniverse,
}

impl FeatureAssembler {
    #[must_use]
    pub const fn new(schema: FeatureSchema, universe: CategoryUniverse) -> Self {
        Self { schema, universe }
    }

    #[must_use]
    pub const fn schema(&self) -> FeatureSchema {
        self.schema
    }

    #[must_use]
    pub const fn universe(&self) -> &CategoryUniverse {
        &self.universe
    }

    /// Number of features produced per application.
    #[must_use]
    pub fn width(&self) -> usize {
        self.schema.width(&self.universe)
    }

    /// Assembles the feature vector for an application.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric field is out of bounds or a categorical
    /// value is outside its encoding table. Unknown categories are rejected
    /// rather than encoded as an all-zero block.
    pub fn assemble(&self, application: &LoanApplication) -> Result<FeatureVector, AssemblyError> {
        application.check_bounds(self.schema)?;

        let values = match self.schema {
            FeatureSchema::Raw => vec![
                application.loan_amnt,
                application.int_rate,
                application.installment,
                application.annual_inc,
                application.dti,
                application.delinq_2yrs,
                application.inq_last_6mths,
                application.open_acc,
                application.pub_rec,
                application.revol_bal,
                application.revol_util,
                application.total_acc,
                application.emp_length,
            ],
            FeatureSchema::Expanded => {
                let mut values = vec![
                    application.annual_inc,
                    application.dti,
                    encode_sub_grade(&application.sub_grade)?,
                    application.open_acc,
                    application.total_acc,
                    application.inq_last_6mths,
                    application.delinq_2yrs,
                    application.int_rate,
                    application.pub_rec,
                ];
                values.extend(
                    self.universe
                        .one_hot(CategoricalField::HomeOwnership, &application.home_ownership)?,
                );
                values.extend(self.universe.one_hot(CategoricalField::Purpose, &application.purpose)?);
                values.push(encode_term(&application.term)?);
                values.push(encode_verification_status(&application.verification_status)?);
                values.push(application.installment);
                values
            }
        };

        let expected = self.width();
        if values.len() != expected {
            return Err(AssemblyError::Width {
                schema: self.schema.id(),
                expected,
                actual: values.len(),
            });
        }

        Ok(FeatureVector {
            schema: self.schema,
            values,
        })
    }
}
