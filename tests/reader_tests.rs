use pov_recorder::reader::{parse_latest_document, TelemetryReader, MIN_MAX_AGE_MS};

const NOW_MS: i64 = 1_700_000_000_000;

fn doc(ts: i64, label: &str) -> String {
    format!(r#"{{"timestampMs":{},"action":{{"label":"{}"}}}}"#, ts, label)
}

#[test]
fn test_parse_whole_document() {
    let parsed = parse_latest_document(&doc(5, "EAT")).unwrap();
    assert_eq!(parsed["action"]["label"], "EAT");
}

#[test]
fn test_parse_falls_back_to_last_object_line() {
    let text = format!("{}\n{}\nnot json\n\n", doc(1, "EAT"), doc(2, "ATTACK"));
    let parsed = parse_latest_document(&text).unwrap();
    assert_eq!(parsed["timestampMs"], 2);
}

#[test]
fn test_parse_rejects_non_objects() {
    assert!(parse_latest_document("").is_none());
    assert!(parse_latest_document("[1,2,3]").is_none());
    assert!(parse_latest_document("garbage").is_none());
}

#[test]
fn test_missing_file_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut reader = TelemetryReader::new(dir.path().join("latest.json"), 1000);
    assert!(reader.latest(NOW_MS).is_none());
}

#[test]
fn test_fresh_document_is_returned_and_stale_one_is_not() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    std::fs::write(&path, doc(NOW_MS, "BREAK_BLOCK")).unwrap();

    let mut reader = TelemetryReader::new(&path, 1000);
    assert_eq!(reader.latest(NOW_MS + 1000).unwrap()["action"]["label"], "BREAK_BLOCK");
    assert!(reader.latest(NOW_MS + 1001).is_none());
}

#[test]
fn test_freshness_window_has_a_floor() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    std::fs::write(&path, doc(NOW_MS, "EAT")).unwrap();

    let mut reader = TelemetryReader::new(&path, 10);
    assert!(reader.latest(NOW_MS + MIN_MAX_AGE_MS).is_some());
    assert!(reader.latest(NOW_MS + MIN_MAX_AGE_MS + 1).is_none());
}

#[test]
fn test_document_without_timestamp_is_always_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    std::fs::write(&path, r#"{"action":{"label":"EAT"}}"#).unwrap();

    let mut reader = TelemetryReader::new(&path, 1000);
    assert!(reader.latest(i64::MAX).is_some());
}

#[test]
fn test_unparseable_rewrite_keeps_cached_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latest.json");
    std::fs::write(&path, doc(NOW_MS, "EAT")).unwrap();

    let mut reader = TelemetryReader::new(&path, 1000);
    assert!(reader.latest(NOW_MS).is_some());

    std::fs::write(&path, "{ truncated").unwrap();
    assert_eq!(reader.latest(NOW_MS).unwrap()["action"]["label"], "EAT");
}
