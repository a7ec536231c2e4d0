use std::fs;
use std::path::{Path, PathBuf};

use hive_core::bucket::RejectPolicy;
use hive_core::error::AppError;
use hive_core::pipeline::ReportSettings;
use hive_core::ports::Recipients;
use hive_core::summary::SummaryLayout;
use hive_io::outbox::MessageTemplate;
use serde::Deserialize;

/// On-disk TOML config. Every key is optional; CLI flags and env vars win.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub hive: HiveSection,
    pub mail: MailSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HiveSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MailSection {
    pub server: Option<String>,
    /// Comma-separated addresses.
    pub recipients: Option<String>,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub outbox_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSection {
    pub team_members: Option<Vec<String>>,
    pub on_malformed: Option<RejectPolicy>,
    pub output_dir: Option<PathBuf>,
    pub artifact_name: Option<String>,
}

/// Values that came from flags or the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub hive_url: Option<String>,
    pub api_key: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub strict: bool,
    pub no_mail: bool,
    pub demo: bool,
}

#[derive(Debug, Clone)]
pub struct HiveSettings {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub server: String,
    pub recipients: Recipients,
    pub template: MessageTemplate,
    pub outbox_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Settings {
    /// `None` in demo mode.
    pub hive: Option<HiveSettings>,
    /// `None` when mail is disabled or not configured.
    pub mail: Option<MailSettings>,
    pub report: ReportSettings,
    pub output_dir: PathBuf,
    pub artifact_name: String,
}

pub fn parse(text: &str) -> Result<FileConfig, AppError> {
    toml::from_str(text).map_err(|e| {
        AppError::new("CONFIG_INVALID", "Failed to parse config file").with_details(e.to_string())
    })
}

pub fn load(path: &Path) -> Result<FileConfig, AppError> {
    let text = fs::read_to_string(path).map_err(|e| {
        AppError::new("CONFIG_READ_FAILED", "Failed to read config file")
            .with_details(format!("path={}: {}", path.display(), e))
    })?;
    parse(&text)
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn resolve_hive(file: HiveSection, ov: &Overrides) -> Result<Option<HiveSettings>, AppError> {
    if ov.demo {
        return Ok(None);
    }
    let base_url = non_empty(ov.hive_url.clone())
        .or_else(|| non_empty(file.base_url))
        .ok_or_else(|| {
            AppError::new(
                "CONFIG_INVALID",
                "TheHive base URL is required (hive.base_url or --hive-url) unless --demo",
            )
        })?;
    Ok(Some(HiveSettings {
        base_url,
        api_key: non_empty(ov.api_key.clone()).or_else(|| non_empty(file.api_key)),
    }))
}

fn resolve_mail(file: MailSection, ov: &Overrides) -> Result<Option<MailSettings>, AppError> {
    if ov.no_mail {
        return Ok(None);
    }
    let server = non_empty(file.server);
    let recipients = non_empty(file.recipients);
    let (server, recipients) = match (server, recipients) {
        (None, None) => return Ok(None),
        (Some(s), Some(r)) => (s, Recipients::parse(&r)?),
        (Some(_), None) => {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "mail.server is set but mail.recipients is missing",
            ))
        }
        (None, Some(_)) => {
            return Err(AppError::new(
                "CONFIG_INVALID",
                "mail.recipients is set but mail.server is missing",
            ))
        }
    };

    let defaults = MessageTemplate::default();
    Ok(Some(MailSettings {
        server,
        recipients,
        template: MessageTemplate {
            from: non_empty(file.from).unwrap_or(defaults.from),
            subject: non_empty(file.subject).unwrap_or(defaults.subject),
            body: non_empty(file.body).unwrap_or(defaults.body),
        },
        outbox_dir: file.outbox_dir.unwrap_or_else(|| PathBuf::from("outbox")),
    }))
}

pub fn resolve(file: FileConfig, ov: &Overrides) -> Result<Settings, AppError> {
    let layout = match file.report.team_members {
        Some(members) => SummaryLayout::new(members)?,
        None => SummaryLayout::default(),
    };
    let on_malformed = if ov.strict {
        RejectPolicy::Abort
    } else {
        file.report.on_malformed.unwrap_or_default()
    };

    Ok(Settings {
        hive: resolve_hive(file.hive, ov)?,
        mail: resolve_mail(file.mail, ov)?,
        report: ReportSettings {
            layout,
            on_malformed,
        },
        output_dir: ov
            .output_dir
            .clone()
            .or(file.report.output_dir)
            .unwrap_or_else(|| PathBuf::from("hive-metrics")),
        artifact_name: non_empty(file.report.artifact_name)
            .unwrap_or_else(|| "Hive Metrics".to_string()),
    })
}
