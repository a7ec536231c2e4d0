use serde::{Deserialize, Serialize};
use std::fmt;

/// Single structured error shape used across the pipeline, its ports and the CLI shell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
    pub retryable: bool,
}

impl AppError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            retryable: false,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MalformedReason {
    Missing,
    NotNumeric,
    WrongType,
    OutOfRange,
    /// `endDate` is set but `resolutionStatus` is not.
    ClosedWithoutResolution,
    /// Another record already holds this key; the first one is kept.
    DuplicateKey,
}

impl MalformedReason {
    fn describe(self) -> &'static str {
        match self {
            MalformedReason::Missing => "required field is missing",
            MalformedReason::NotNumeric => "expected epoch milliseconds",
            MalformedReason::WrongType => "expected a string or number",
            MalformedReason::OutOfRange => "timestamp is out of range",
            MalformedReason::ClosedWithoutResolution => "closed case has no resolutionStatus",
            MalformedReason::DuplicateKey => "key already used by an earlier record",
        }
    }
}

/// A single raw case record that could not be normalized.
///
/// Carries the ingestion index so the caller can decide whether to skip the
/// record or abort the batch. The pipeline never fabricates a value in its place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MalformedRecord {
    pub index: usize,
    pub field: String,
    pub reason: MalformedReason,
}

impl MalformedRecord {
    pub fn new(index: usize, field: impl Into<String>, reason: MalformedReason) -> Self {
        Self {
            index,
            field: field.into(),
            reason,
        }
    }
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record {}: {}: {}",
            self.index,
            self.field,
            self.reason.describe()
        )
    }
}

impl std::error::Error for MalformedRecord {}

impl From<MalformedRecord> for AppError {
    fn from(err: MalformedRecord) -> Self {
        AppError::new("CASE_RECORD_MALFORMED", "Case record is malformed")
            .with_details(err.to_string())
    }
}
