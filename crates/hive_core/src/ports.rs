//! Capabilities the pipeline depends on but does not implement.
//!
//! Adapters live outside the core (`hive_io`); tests use in-memory fakes.

use serde::{Deserialize, Serialize};

use crate::domain::RawCaseRecord;
use crate::error::AppError;
use crate::report::ExportPayload;

pub trait CaseSource {
    /// Fetch the full, materialized case list.
    fn fetch_cases(&self) -> Result<Vec<RawCaseRecord>, AppError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub attachments: Vec<Attachment>,
}

impl RenderedArtifact {
    pub fn total_bytes(&self) -> u64 {
        self.attachments.iter().map(|a| a.bytes.len() as u64).sum()
    }
}

pub trait WorkbookRenderer {
    fn render(&self, payload: &ExportPayload) -> Result<RenderedArtifact, AppError>;
}

/// Recipient list parsed from a comma-separated string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recipients(Vec<String>);

impl Recipients {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let list = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if list.is_empty() {
            return Err(AppError::new(
                "MAIL_NO_RECIPIENTS",
                "Recipient list is empty",
            )
            .with_details(format!("raw={raw}")));
        }
        Ok(Self(list))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Comma-joined header form.
    pub fn header_value(&self) -> String {
        self.0.join(",")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub recipients: usize,
}

pub trait MailTransport {
    fn deliver(
        &self,
        artifact: &RenderedArtifact,
        recipients: &Recipients,
        server: &str,
    ) -> Result<DeliveryReceipt, AppError>;
}
