use std::cell::RefCell;

use hive_core::bucket::RejectPolicy;
use hive_core::demo::demo_cases;
use hive_core::domain::RawCaseRecord;
use hive_core::error::AppError;
use hive_core::pipeline::{build_report, run_report, Delivery, ReportSettings};
use hive_core::ports::{
    Attachment, CaseSource, DeliveryReceipt, MailTransport, Recipients, RenderedArtifact,
    WorkbookRenderer,
};
use hive_core::report::ExportPayload;
use hive_core::summary::{SummaryColumn, TOTALS_LABEL};
use serde_json::json;
use time::{Date, Month};

fn today() -> Date {
    Date::from_calendar_date(2026, Month::October, 19).expect("date")
}

struct FakeSource {
    cases: Vec<RawCaseRecord>,
}

impl CaseSource for FakeSource {
    fn fetch_cases(&self) -> Result<Vec<RawCaseRecord>, AppError> {
        Ok(self.cases.clone())
    }
}

struct FailingSource;

impl CaseSource for FailingSource {
    fn fetch_cases(&self) -> Result<Vec<RawCaseRecord>, AppError> {
        Err(AppError::new("HIVE_REQUEST_FAILED", "unreachable").with_retryable(true))
    }
}

/// Renders each sheet name into one attachment so tests can see what was passed in.
struct FakeRenderer;

impl WorkbookRenderer for FakeRenderer {
    fn render(&self, payload: &ExportPayload) -> Result<RenderedArtifact, AppError> {
        Ok(RenderedArtifact {
            attachments: payload
                .sheets
                .iter()
                .map(|s| Attachment {
                    file_name: format!("{}.txt", s.name),
                    content_type: "text/plain".to_string(),
                    bytes: format!("{} rows", s.rows.len()).into_bytes(),
                })
                .collect(),
        })
    }
}

#[derive(Default)]
struct RecordingTransport {
    sent: RefCell<Vec<(Vec<String>, String, usize)>>,
}

impl MailTransport for RecordingTransport {
    fn deliver(
        &self,
        artifact: &RenderedArtifact,
        recipients: &Recipients,
        server: &str,
    ) -> Result<DeliveryReceipt, AppError> {
        self.sent.borrow_mut().push((
            recipients.as_slice().to_vec(),
            server.to_string(),
            artifact.attachments.len(),
        ));
        Ok(DeliveryReceipt {
            message_id: "msg-1".to_string(),
            recipients: recipients.as_slice().len(),
        })
    }
}

#[test]
fn demo_dataset_reconciles_across_windows() {
    let raw = demo_cases(today());
    let built = build_report(&raw, today(), &ReportSettings::default()).expect("build");

    assert_eq!(built.cases.within30.len(), 11);
    assert_eq!(built.cases.within60.len(), 10);
    assert_eq!(built.cases.within90.len(), 19);
    assert_eq!(built.cases.accepted_count(), raw.len());
    assert!(built.cases.rejected.is_empty());
    assert!(built.warnings.is_empty(), "{:?}", built.warnings);

    let s = &built.summary;
    assert_eq!(s.cell(TOTALS_LABEL, SummaryColumn::Created), 11);
    assert_eq!(s.cell(TOTALS_LABEL, SummaryColumn::Closed), 5);
    assert_eq!(s.cell("Team.Member", SummaryColumn::Owner), 2);
    assert_eq!(s.cell("Team.Member6", SummaryColumn::Owner), 1);
    assert_eq!(s.cell("Duplicated", SummaryColumn::Resolution), 2);
    assert_eq!(s.cell("TruePositive", SummaryColumn::Resolution), 2);
    assert_eq!(s.cell("FalsePositive", SummaryColumn::Resolution), 1);
    assert_eq!(s.cell("1", SummaryColumn::Severity), 4);
    assert_eq!(s.cell("2", SummaryColumn::Severity), 4);
    assert_eq!(s.cell("3", SummaryColumn::Severity), 3);
}

#[test]
fn run_report_fetches_renders_and_delivers() {
    let mut cases = demo_cases(today());
    cases.push(serde_json::from_value(json!({ "title": "broken", "owner": "x", "severity": 1 })).expect("raw"));
    let source = FakeSource { cases };
    let transport = RecordingTransport::default();
    let recipients = Recipients::parse("soc@example.com, ciso@example.com").expect("recipients");

    let outcome = run_report(
        &source,
        &FakeRenderer,
        Some(Delivery {
            transport: &transport,
            recipients: &recipients,
            server: "smtp.example.com:25",
        }),
        today(),
        &ReportSettings::default(),
    )
    .expect("run");

    let report = &outcome.report;
    assert_eq!(report.fetched, 41);
    assert_eq!(
        (report.windows.within30, report.windows.within60, report.windows.within90),
        (11, 10, 19)
    );
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].index, 40);
    assert_eq!(report.attachments.len(), 5);
    assert_eq!(outcome.artifact.attachments.len(), 5);
    assert_eq!(report.receipt.as_ref().map(|r| r.recipients), Some(2));

    let sent = transport.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0],
        (
            vec!["soc@example.com".to_string(), "ciso@example.com".to_string()],
            "smtp.example.com:25".to_string(),
            5
        )
    );
}

#[test]
fn run_without_delivery_only_renders() {
    let source = FakeSource {
        cases: demo_cases(today()),
    };
    let outcome = run_report(&source, &FakeRenderer, None, today(), &ReportSettings::default())
        .expect("run");
    assert!(outcome.report.receipt.is_none());
}

#[test]
fn abort_policy_surfaces_pipeline_error() {
    let source = FakeSource {
        cases: vec![serde_json::from_value(json!({ "title": "t", "owner": "o" })).expect("raw")],
    };
    let settings = ReportSettings {
        on_malformed: RejectPolicy::Abort,
        ..ReportSettings::default()
    };
    let err = run_report(&source, &FakeRenderer, None, today(), &settings).unwrap_err();
    assert_eq!(err.code, "PIPELINE_ABORTED");
    assert_eq!(err.details.as_deref(), Some("record 0: severity: required field is missing"));
}

#[test]
fn source_errors_propagate_unchanged() {
    let err = run_report(&FailingSource, &FakeRenderer, None, today(), &ReportSettings::default())
        .unwrap_err();
    assert_eq!(err.code, "HIVE_REQUEST_FAILED");
    assert!(err.retryable);
}

#[test]
fn quiet_month_yields_zero_summary() {
    let built = build_report(&[], today(), &ReportSettings::default()).expect("build");
    assert_eq!(built.summary.cell(TOTALS_LABEL, SummaryColumn::Created), 0);
    assert_eq!(built.payload.sheets.len(), 5);
    assert_eq!(built.payload.charts.len(), 4);
}
