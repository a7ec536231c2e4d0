use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A case exactly as the case-management service returned it.
///
/// The pipeline only ever borrows these; field extraction lives in `normalize`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RawCaseRecord(Map<String, Value>);

impl RawCaseRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Field lookup treating JSON `null` the same as an absent key.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }
}

impl From<Map<String, Value>> for RawCaseRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Close-out data of a case. Both halves come from the same `endDate` so they
/// are either present together or absent together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseClosure {
    pub closed: String,
    pub resolution: String,
}

/// Canonical case record used by the window buckets, the summary and the case sheets.
///
/// Notes:
/// - `created` and `closed` are UTC, formatted `MM/DD/YYYY HH:MM:SS`.
/// - `created_ms` keeps the source epoch milliseconds for window classification.
/// - `severity` is opaque; numeric severities are rendered in decimal, with
///   integral floats (`2.0`) written as integers so they match the `"2"` row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseRecord {
    pub name: String,
    pub owner: String,
    pub severity: String,
    pub created: String,
    pub created_ms: i64,
    pub closure: Option<CaseClosure>,
}

impl CaseRecord {
    pub fn closed(&self) -> Option<&str> {
        self.closure.as_ref().map(|c| c.closed.as_str())
    }

    pub fn resolution(&self) -> Option<&str> {
        self.closure.as_ref().map(|c| c.resolution.as_str())
    }

    pub fn is_closed(&self) -> bool {
        self.closure.is_some()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Window {
    Within30,
    Within60,
    /// Everything older than the 60-day cutoff. Despite the name there is no
    /// 90-day upper bound.
    Within90,
}

impl Window {
    pub const ALL: [Window; 3] = [Window::Within30, Window::Within60, Window::Within90];
}

/// Records of one window keyed by ingestion index.
pub type WindowBucket = BTreeMap<usize, CaseRecord>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}
