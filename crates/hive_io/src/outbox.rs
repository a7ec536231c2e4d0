use std::fs;
use std::path::{Path, PathBuf};

use hive_core::error::AppError;
use hive_core::ports::{DeliveryReceipt, MailTransport, Recipients, RenderedArtifact};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

pub const ENVELOPE_FILE_NAME: &str = "envelope.json";
pub const ENVELOPE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageTemplate {
    pub from: String,
    pub subject: String,
    pub body: String,
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self {
            from: "SIRP-Reminders@company.com".to_string(),
            subject: "The Hive Case Metrics".to_string(),
            body: "Attached are the requested case metrics.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvelopeAttachment {
    pub file_name: String,
    pub content_type: String,
    pub sha256: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    pub envelope_version: u32,
    pub message_id: String,
    pub server: String,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<EnvelopeAttachment>,
}

/// Spools messages into a pickup directory; a relay on `server` does the sending.
///
/// Layout: `<outbox>/<message_id>/envelope.json` next to the attachment files.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    root: PathBuf,
    template: MessageTemplate,
}

impl OutboxTransport {
    pub fn new(root: impl Into<PathBuf>, template: MessageTemplate) -> Self {
        Self {
            root: root.into(),
            template,
        }
    }

    pub fn message_dir(&self, message_id: &str) -> PathBuf {
        self.root.join(message_id)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Message id derived from the envelope contents, so re-spooling the same report
/// to the same people lands in the same directory.
fn message_id(server: &str, template: &MessageTemplate, to: &[String], atts: &[EnvelopeAttachment]) -> String {
    let mut hasher = Sha256::new();
    for part in [server, template.from.as_str(), template.subject.as_str(), template.body.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    for addr in to {
        hasher.update(addr.as_bytes());
        hasher.update([0u8]);
    }
    for a in atts {
        hasher.update(a.file_name.as_bytes());
        hasher.update([0u8]);
        hasher.update(a.sha256.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())[..32].to_string()
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    fs::write(path, bytes).map_err(|e| {
        AppError::new("OUTBOX_WRITE_FAILED", "Failed to write outbox file")
            .with_details(format!("path={}: {}", path.display(), e))
    })
}

impl MailTransport for OutboxTransport {
    fn deliver(
        &self,
        artifact: &RenderedArtifact,
        recipients: &Recipients,
        server: &str,
    ) -> Result<DeliveryReceipt, AppError> {
        for a in &artifact.attachments {
            let name = a.file_name.as_str();
            if name.is_empty() || name == ".." || name == ENVELOPE_FILE_NAME || name.contains(['/', '\\']) {
                return Err(AppError::new(
                    "OUTBOX_WRITE_FAILED",
                    "Attachment name is not usable in the outbox",
                )
                .with_details(format!("file_name={}", a.file_name)));
            }
        }

        let to = recipients.as_slice().to_vec();
        let attachments = artifact
            .attachments
            .iter()
            .map(|a| EnvelopeAttachment {
                file_name: a.file_name.clone(),
                content_type: a.content_type.clone(),
                sha256: sha256_hex(&a.bytes),
                bytes: a.bytes.len() as u64,
            })
            .collect::<Vec<_>>();
        let id = message_id(server, &self.template, &to, &attachments);

        let dir = self.message_dir(&id);
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::new("OUTBOX_WRITE_FAILED", "Failed to create outbox message directory")
                .with_details(format!("path={}: {}", dir.display(), e))
        })?;

        for a in &artifact.attachments {
            write_file(&dir.join(&a.file_name), &a.bytes)?;
        }

        let envelope = Envelope {
            envelope_version: ENVELOPE_VERSION,
            message_id: id.clone(),
            server: server.to_string(),
            from: self.template.from.clone(),
            to,
            subject: self.template.subject.clone(),
            body: self.template.body.clone(),
            attachments,
        };
        let json = serde_json::to_vec_pretty(&envelope).map_err(|e| {
            AppError::new("OUTBOX_WRITE_FAILED", "Failed to encode envelope")
                .with_details(e.to_string())
        })?;
        // Envelope last: a relay only picks up directories that have one.
        write_file(&dir.join(ENVELOPE_FILE_NAME), &json)?;

        info!(message_id = %id, to = %recipients.header_value(), dir = %dir.display(), "spooled report message");
        Ok(DeliveryReceipt {
            message_id: id,
            recipients: envelope.to.len(),
        })
    }
}
