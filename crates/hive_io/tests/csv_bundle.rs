use hive_core::demo::demo_cases;
use hive_core::pipeline::{build_report, ReportSettings};
use hive_core::ports::WorkbookRenderer;
use hive_core::report::{ChartSpec, SeriesData};
use hive_io::render::{write_artifact, CsvBundleRenderer, CHARTS_FILE_NAME};
use pretty_assertions::assert_eq;
use time::{Date, Month};

fn today() -> Date {
    Date::from_calendar_date(2026, Month::October, 19).expect("date")
}

fn rendered() -> hive_core::ports::RenderedArtifact {
    let built = build_report(&demo_cases(today()), today(), &ReportSettings::default()).expect("build");
    CsvBundleRenderer::default().render(&built.payload).expect("render")
}

#[test]
fn one_csv_per_sheet_plus_charts() {
    let artifact = rendered();
    let names = artifact
        .attachments
        .iter()
        .map(|a| a.file_name.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        names,
        vec![
            "hive_metrics_cases_newer_than_30_days.csv",
            "hive_metrics_cases_30_to_60_days.csv",
            "hive_metrics_cases_older_than_60_days.csv",
            "hive_metrics_tracking.csv",
            CHARTS_FILE_NAME,
        ]
    );
}

#[test]
fn case_csv_has_header_and_blank_open_cells() {
    let artifact = rendered();
    let text = String::from_utf8(artifact.attachments[0].bytes.clone()).expect("utf8");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Name,Owner,Severity,Created,Closed,Resolution"));

    let first = lines.next().expect("first row");
    assert!(first.starts_with("Demo case 1,Team.Member,1,10/19/2026 12:00:00,"));
    assert!(first.ends_with(",,"), "open case should end with two empty cells: {first}");
    assert_eq!(text.lines().count(), 1 + 11);
}

#[test]
fn tracking_csv_lists_every_row_label() {
    let artifact = rendered();
    let text = String::from_utf8(artifact.attachments[3].bytes.clone()).expect("utf8");
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(lines[0], ",Created,Closed,Owner,Resolution,Severity");
    assert_eq!(lines[1], "totals,11,5,0,0,0");
    assert_eq!(lines.len(), 15);
    assert_eq!(lines[14], "3,0,0,0,0,3");
}

#[test]
fn charts_json_holds_literal_series() {
    let artifact = rendered();
    let charts: Vec<ChartSpec> =
        serde_json::from_slice(&artifact.attachments[4].bytes).expect("charts json");
    assert_eq!(charts.len(), 4);
    match &charts[0].data {
        SeriesData::Literal { categories, values } => {
            assert_eq!(categories, &vec!["Created".to_string(), "Closed".to_string()]);
            assert_eq!(values, &vec![11, 5]);
        }
        other => panic!("expected literal series, got {other:?}"),
    }
}

#[test]
fn write_artifact_persists_all_attachments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let artifact = rendered();
    let out = dir.path().join("report");
    let written = write_artifact(&out, &artifact).expect("write");
    assert_eq!(written.len(), artifact.attachments.len());
    for (path, a) in written.iter().zip(&artifact.attachments) {
        assert_eq!(std::fs::read(path).expect("read"), a.bytes);
    }
}
