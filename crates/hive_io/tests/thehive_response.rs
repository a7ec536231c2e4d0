use hive_io::thehive::parse_case_list;
use serde_json::json;

#[test]
fn parses_array_of_case_objects() {
    let body = json!([
        { "title": "a", "owner": "o", "severity": 2, "createdAt": 1_767_323_045_000i64 },
        { "title": "b", "owner": "p", "severity": 1, "createdAt": 1_767_323_046_000i64, "endDate": null },
    ]);
    let cases = parse_case_list(body).expect("parse");
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].get("title"), Some(&json!("a")));
    // null reads as absent
    assert_eq!(cases[1].get("endDate"), None);
}

#[test]
fn empty_array_is_a_valid_quiet_response() {
    assert!(parse_case_list(json!([])).expect("parse").is_empty());
}

#[test]
fn rejects_non_array_body() {
    let err = parse_case_list(json!({ "type": "AuthenticationError" })).unwrap_err();
    assert_eq!(err.code, "HIVE_RESPONSE_INVALID");
}

#[test]
fn rejects_non_object_entries_with_index() {
    let err = parse_case_list(json!([{ "title": "ok" }, 42])).unwrap_err();
    assert_eq!(err.code, "HIVE_RESPONSE_INVALID");
    assert_eq!(err.details.as_deref(), Some("index=1; value=42"));
}
