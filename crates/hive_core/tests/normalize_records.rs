use hive_core::domain::RawCaseRecord;
use hive_core::error::MalformedReason;
use hive_core::normalize::normalize;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn raw(v: Value) -> RawCaseRecord {
    serde_json::from_value(v).expect("raw record")
}

// 2026-01-02T03:04:05Z
const CREATED_MS: i64 = 1_767_323_045_000;
// 2026-01-03T10:00:00Z
const END_MS: i64 = 1_767_434_400_000;

#[test]
fn open_case_has_no_closure() {
    let rec = normalize(
        0,
        &raw(json!({
            "title": "Phishing report",
            "owner": "alice",
            "severity": 2,
            "createdAt": CREATED_MS,
        })),
    )
    .expect("normalize");

    assert_eq!(rec.name, "Phishing report");
    assert_eq!(rec.owner, "alice");
    assert_eq!(rec.severity, "2");
    assert_eq!(rec.created, "01/02/2026 03:04:05");
    assert_eq!(rec.created_ms, CREATED_MS);
    assert_eq!(rec.closed(), None);
    assert_eq!(rec.resolution(), None);
}

#[test]
fn closed_case_carries_closed_time_and_resolution() {
    let rec = normalize(
        3,
        &raw(json!({
            "title": "Malware beacon",
            "owner": "bob",
            "severity": "3",
            "createdAt": CREATED_MS,
            "endDate": END_MS,
            "resolutionStatus": "TruePositive",
        })),
    )
    .expect("normalize");

    assert_eq!(rec.closed(), Some("01/03/2026 10:00:00"));
    assert_eq!(rec.resolution(), Some("TruePositive"));
    assert!(rec.is_closed());
}

#[test]
fn null_end_date_means_open() {
    let rec = normalize(
        0,
        &raw(json!({
            "title": "t",
            "owner": "o",
            "severity": 1,
            "createdAt": CREATED_MS,
            "endDate": null,
            "resolutionStatus": null,
        })),
    )
    .expect("normalize");
    assert!(!rec.is_closed());
}

#[test]
fn empty_strings_pass_through_verbatim() {
    let rec = normalize(
        0,
        &raw(json!({ "title": "", "owner": "", "severity": "", "createdAt": CREATED_MS })),
    )
    .expect("normalize");
    assert_eq!(rec.name, "");
    assert_eq!(rec.owner, "");
    assert_eq!(rec.severity, "");
}

#[test]
fn missing_created_at_is_malformed() {
    let err = normalize(
        5,
        &raw(json!({ "title": "t", "owner": "o", "severity": 1 })),
    )
    .unwrap_err();
    assert_eq!(err.index, 5);
    assert_eq!(err.field, "createdAt");
    assert_eq!(err.reason, MalformedReason::Missing);
}

#[test]
fn non_numeric_created_at_is_malformed() {
    let err = normalize(
        1,
        &raw(json!({ "title": "t", "owner": "o", "severity": 1, "createdAt": "yesterday" })),
    )
    .unwrap_err();
    assert_eq!(err.field, "createdAt");
    assert_eq!(err.reason, MalformedReason::NotNumeric);
}

#[test]
fn end_date_without_resolution_is_malformed() {
    let err = normalize(
        2,
        &raw(json!({
            "title": "t",
            "owner": "o",
            "severity": 1,
            "createdAt": CREATED_MS,
            "endDate": END_MS,
        })),
    )
    .unwrap_err();
    assert_eq!(err.field, "resolutionStatus");
    assert_eq!(err.reason, MalformedReason::ClosedWithoutResolution);
}

#[test]
fn missing_or_structured_text_fields_are_malformed() {
    let err = normalize(0, &raw(json!({ "title": "t", "severity": 1, "createdAt": CREATED_MS })))
        .unwrap_err();
    assert_eq!((err.field.as_str(), err.reason), ("owner", MalformedReason::Missing));

    let err = normalize(
        0,
        &raw(json!({ "title": "t", "owner": {"login": "o"}, "severity": 1, "createdAt": CREATED_MS })),
    )
    .unwrap_err();
    assert_eq!((err.field.as_str(), err.reason), ("owner", MalformedReason::WrongType));
}

#[test]
fn normalization_does_not_touch_the_raw_record() {
    let input = raw(json!({
        "title": "t",
        "owner": "o",
        "severity": 1,
        "createdAt": CREATED_MS,
        "extra": [1, 2, 3],
    }));
    let before = input.clone();
    normalize(0, &input).expect("normalize");
    assert_eq!(input, before);
}

#[test]
fn integral_float_severity_reads_as_integer() {
    let rec = normalize(
        0,
        &raw(json!({ "title": 7, "owner": "o", "severity": 2.0, "createdAt": CREATED_MS })),
    )
    .expect("normalize");
    assert_eq!(rec.severity, "2");
    assert_eq!(rec.name, "7");

    let rec = normalize(
        0,
        &raw(json!({ "title": "t", "owner": "o", "severity": 2.5, "createdAt": CREATED_MS })),
    )
    .expect("normalize");
    assert_eq!(rec.severity, "2.5");
}
