use toolstream::config::Config;
use toolstream::logging;
use toolstream::payload::normalize;

#[test]
fn test_init_writes_payload_failures_to_log_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let log_path = dir.path().join("toolstream.log");
    let config = Config {
        debug_payload: true,
        log_path: Some(log_path.clone()),
        log_filter: "toolstream=debug".to_string(),
        ..Config::default()
    };

    logging::init(&config).expect("install subscriber");
    assert!(logging::debug_payload_enabled());

    let normalized = normalize("{\"broken\": ");
    assert!(normalized.is_parse_failure());

    let written = std::fs::read_to_string(&log_path).expect("read log");
    assert!(written.contains("payload not recognized"), "{written}");
    assert!(written.contains("{\\\"broken\\\": ") || written.contains("{\"broken\": "), "{written}");

    assert!(logging::init(&config).is_err());
}
