use serde::{Deserialize, Serialize};
use time::Date;
use tracing::{debug, info};

use crate::bucket::{bucket, RejectPolicy, WindowedCases};
use crate::domain::{RawCaseRecord, ValidationWarning};
use crate::error::{AppError, MalformedRecord};
use crate::ports::{
    CaseSource, DeliveryReceipt, MailTransport, Recipients, RenderedArtifact, WorkbookRenderer,
};
use crate::report::{assemble, ExportPayload};
use crate::summary::{aggregate, CountsSummary, SummaryLayout};

/// Knobs the core accepts from the surrounding shell.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportSettings {
    pub layout: SummaryLayout,
    pub on_malformed: RejectPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltReport {
    pub cases: WindowedCases,
    pub summary: CountsSummary,
    pub payload: ExportPayload,
    pub warnings: Vec<ValidationWarning>,
}

/// Pure core: normalize, bucket, aggregate the newest window, assemble the payload.
pub fn build_report(
    raw: &[RawCaseRecord],
    today: Date,
    settings: &ReportSettings,
) -> Result<BuiltReport, AppError> {
    let cases = bucket(raw.iter().enumerate(), today, settings.on_malformed).map_err(|e| {
        AppError::new("PIPELINE_ABORTED", "Report aborted on malformed case record")
            .with_details(e.to_string())
    })?;

    let summary = aggregate(&cases.within30, &settings.layout);
    let payload = assemble(&cases.within30, &cases.within60, &cases.within90, &summary);
    let warnings = summary.warnings();

    debug!(
        sheets = payload.sheets.len(),
        charts = payload.charts.len(),
        warnings = warnings.len(),
        "assembled export payload"
    );

    Ok(BuiltReport {
        cases,
        summary,
        payload,
        warnings,
    })
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WindowCounts {
    pub within30: usize,
    pub within60: usize,
    pub within90: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub windows: WindowCounts,
    pub rejected: Vec<MalformedRecord>,
    pub warnings: Vec<ValidationWarning>,
    pub attachments: Vec<String>,
    pub receipt: Option<DeliveryReceipt>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub report: RunReport,
    pub artifact: RenderedArtifact,
}

/// Where and how to mail the rendered artifact.
pub struct Delivery<'a> {
    pub transport: &'a dyn MailTransport,
    pub recipients: &'a Recipients,
    pub server: &'a str,
}

/// Fetch, build, render and (optionally) deliver one report.
pub fn run_report(
    source: &dyn CaseSource,
    renderer: &dyn WorkbookRenderer,
    delivery: Option<Delivery<'_>>,
    today: Date,
    settings: &ReportSettings,
) -> Result<RunOutcome, AppError> {
    let raw = source.fetch_cases()?;
    info!(count = raw.len(), "fetched case records");

    let built = build_report(&raw, today, settings)?;
    let artifact = renderer.render(&built.payload)?;
    info!(
        attachments = artifact.attachments.len(),
        bytes = artifact.total_bytes(),
        "rendered report"
    );

    let receipt = match delivery {
        None => None,
        Some(d) => {
            let receipt = d.transport.deliver(&artifact, d.recipients, d.server)?;
            info!(
                message_id = %receipt.message_id,
                recipients = receipt.recipients,
                "delivered report"
            );
            Some(receipt)
        }
    };

    let report = RunReport {
        fetched: raw.len(),
        windows: WindowCounts {
            within30: built.cases.within30.len(),
            within60: built.cases.within60.len(),
            within90: built.cases.within90.len(),
        },
        rejected: built.cases.rejected,
        warnings: built.warnings,
        attachments: artifact
            .attachments
            .iter()
            .map(|a| a.file_name.clone())
            .collect(),
        receipt,
    };

    Ok(RunOutcome { report, artifact })
}
