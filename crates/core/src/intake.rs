//! Patient intake data as received from a caller.

use crate::{TriageError, TriageResult};
use quackhub_types::NonEmptyText;

/// Unvalidated intake: every field may be missing.
///
/// API layers build this from whatever the caller sent; [`IntakeForm::validate`] is the only
/// way to obtain an [`Intake`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntakeForm {
    pub symptoms: Option<String>,
    pub age: Option<i64>,
    pub sex: Option<String>,
    /// Pounds.
    pub weight: Option<f64>,
    /// Inches.
    pub height: Option<f64>,
    pub duration: Option<String>,
    /// Self-reported 1-10, not range checked.
    pub severity: Option<i64>,
}

impl IntakeForm {
    pub fn new(symptoms: impl Into<String>) -> Self {
        Self {
            symptoms: Some(symptoms.into()),
            ..Self::default()
        }
    }

    /// Checks that symptom text is present.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidInput` if symptoms are absent, empty or whitespace-only.
    pub fn validate(self) -> TriageResult<Intake> {
        let symptoms = self
            .symptoms
            .ok_or_else(|| TriageError::InvalidInput("symptoms are required".into()))
            .and_then(|s| {
                NonEmptyText::new(s)
                    .map_err(|_| TriageError::InvalidInput("symptoms cannot be empty".into()))
            })?;

        Ok(Intake {
            symptoms,
            age: self.age,
            sex: self.sex,
            weight: self.weight,
            height: self.height,
            duration: self.duration,
            severity: self.severity,
        })
    }
}

/// Validated intake with non-empty symptoms.
#[derive(Clone, Debug, PartialEq)]
pub struct Intake {
    pub symptoms: NonEmptyText,
    pub age: Option<i64>,
    pub sex: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub duration: Option<String>,
    pub severity: Option<i64>,
}

impl Intake {
    pub fn new(symptoms: NonEmptyText) -> Self {
        Self {
            symptoms,
            age: None,
            sex: None,
            weight: None,
            height: None,
            duration: None,
            severity: None,
        }
    }
}
