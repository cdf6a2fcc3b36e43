//! Outcomes of non-atomic multi-step operations

use crate::error::ApiError;
use serde::Serialize;
use std::fmt;

/// Primitive step of an emulated operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    Download,
    Upload,
    /// Removing the source after a successful upload; failure leaves a duplicate
    DeleteSource,
    Delete,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Step::Download => "download",
            Step::Upload => "upload",
            Step::DeleteSource => "delete source",
            Step::Delete => "delete",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedStep {
    pub key: String,
    pub step: Step,
    pub reason: String,
}

impl FailedStep {
    pub fn new(key: impl Into<String>, step: Step, reason: impl ToString) -> Self {
        Self {
            key: key.into(),
            step,
            reason: reason.to_string(),
        }
    }
}

/// Result of an operation that ran to completion
///
/// Nothing is rolled back: a `PartialFailure` describes the intermediate
/// state left in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum Outcome {
    #[default]
    Success,
    PartialFailure { failed_steps: Vec<FailedStep> },
}

impl Outcome {
    pub fn from_failures(failed_steps: Vec<FailedStep>) -> Self {
        if failed_steps.is_empty() {
            Outcome::Success
        } else {
            Outcome::PartialFailure { failed_steps }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn failed_steps(&self) -> &[FailedStep] {
        match self {
            Outcome::Success => &[],
            Outcome::PartialFailure { failed_steps } => failed_steps,
        }
    }

    pub fn merge(self, other: Outcome) -> Outcome {
        let mut steps = self.into_failed_steps();
        steps.extend(other.into_failed_steps());
        Outcome::from_failures(steps)
    }

    pub fn into_failed_steps(self) -> Vec<FailedStep> {
        match self {
            Outcome::Success => Vec::new(),
            Outcome::PartialFailure { failed_steps } => failed_steps,
        }
    }

    /// Sources whose copy landed but which could not be removed afterwards
    pub fn duplicated_keys(&self) -> Vec<&str> {
        self.failed_steps()
            .iter()
            .filter(|step| step.step == Step::DeleteSource)
            .map(|step| step.key.as_str())
            .collect()
    }

    /// Collapse to a plain result listing the failed keys
    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            Outcome::Success => Ok(()),
            Outcome::PartialFailure { failed_steps } => Err(ApiError::PartialBatchFailure {
                failed: failed_steps.into_iter().map(|step| step.key).collect(),
            }),
        }
    }
}
