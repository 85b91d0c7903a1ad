use std::time::{Duration, Instant};

use focus_fill::browser::session::{BrowserRequest, BrowserResponse, BrowserSession, SessionOptions};
use focus_fill::browser::surface::{BrowserSurface, Key};
use focus_fill::error::FillError;

// ============================================================================
// Wire format
// ============================================================================

#[test]
fn requests_serialize_as_flat_json_lines() {
    let json = serde_json::to_string(&BrowserRequest::navigate("file:///tmp/form.html")).unwrap();
    assert_eq!(json, r#"{"cmd":"navigate","url":"file:///tmp/form.html"}"#);

    let json = serde_json::to_string(&BrowserRequest::press(Key::ShiftTab)).unwrap();
    assert_eq!(json, r#"{"cmd":"press","key":"Shift+Tab"}"#);

    let json = serde_json::to_string(&BrowserRequest::type_text("Jane", 25)).unwrap();
    assert_eq!(json, r#"{"cmd":"type","text":"Jane","delay_ms":25}"#);

    let json = serde_json::to_string(&BrowserRequest::click_option("Yes", 1000)).unwrap();
    assert_eq!(json, r#"{"cmd":"click_option","name":"Yes","timeout_ms":1000}"#);

    let json = serde_json::to_string(&BrowserRequest::screenshot(true)).unwrap();
    assert_eq!(json, r#"{"cmd":"screenshot","full_page":true}"#);

    let json = serde_json::to_string(&BrowserRequest::snapshot()).unwrap();
    assert_eq!(json, r#"{"cmd":"snapshot"}"#);
}

#[test]
fn key_names_match_the_bridge() {
    assert_eq!(Key::Tab.as_str(), "Tab");
    assert_eq!(Key::SelectAll.as_str(), "Control+A");
    assert_eq!(Key::ArrowDown.to_string(), "ArrowDown");
}

#[test]
fn responses_tolerate_missing_fields() {
    let ready: BrowserResponse = serde_json::from_str(r#"{"ok":true,"ready":true}"#).unwrap();
    assert!(ready.ok);
    assert_eq!(ready.ready, Some(true));
    assert!(ready.data.is_none());

    let failed: BrowserResponse =
        serde_json::from_str(r#"{"ok":false,"error":"Timeout 1000ms exceeded"}"#).unwrap();
    assert!(!failed.ok);
    assert_eq!(failed.error.as_deref(), Some("Timeout 1000ms exceeded"));

    let text: BrowserResponse = serde_json::from_str(r#"{"ok":true,"text":"Thanks","id":4}"#).unwrap();
    assert_eq!(text.text.as_deref(), Some("Thanks"));
    assert_eq!(text.id, Some(4));
}

// ============================================================================
// Launch
// ============================================================================

#[test]
fn default_options_are_headless_with_one_second_clicks() {
    let options = SessionOptions::default();
    assert!(options.headless);
    assert_eq!(options.click_timeout_ms, 1000);
    assert_eq!(options.op_timeout_ms, 30_000);
    assert!(options.server_script.ends_with("ax_server.js"));
}

#[test]
fn missing_bridge_script_fails_to_launch() {
    let options = SessionOptions {
        server_script: "does/not/exist/ax_server.js".into(),
        ..SessionOptions::default()
    };
    // Either node is absent (spawn error) or it exits without a ready line
    match BrowserSession::launch(&options) {
        Err(FillError::SubprocessSpawn { .. })
        | Err(FillError::SessionIO(_))
        | Err(FillError::JsonParse { .. })
        | Err(FillError::SessionProtocol { .. }) => {}
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("launch should fail"),
    }
}

// ============================================================================
// Deadlines (a shell script stands in for the node bridge)
// ============================================================================

#[cfg(unix)]
fn scripted_bridge(dir: &std::path::Path, body: &str, op_timeout_ms: u64) -> SessionOptions {
    let script = dir.join("bridge.sh");
    std::fs::write(&script, format!("echo '{{\"ok\":true,\"ready\":true}}'\n{}", body)).unwrap();
    SessionOptions {
        node_binary: "sh".into(),
        server_script: script,
        op_timeout_ms,
        ..SessionOptions::default()
    }
}

#[cfg(unix)]
#[test]
fn stalled_bridge_times_out_instead_of_hanging() {
    let dir = tempfile::tempdir().unwrap();
    let options = scripted_bridge(dir.path(), "exec sleep 10\n", 200);
    let mut session = BrowserSession::launch(&options).unwrap();

    let started = Instant::now();
    match session.snapshot() {
        Err(FillError::SessionIO(msg)) => assert!(msg.contains("snapshot"), "{}", msg),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("snapshot should time out"),
    }
    assert!(session.press_key(Key::Tab).is_err());
    assert!(started.elapsed() < Duration::from_secs(3));

    // Quit is bounded too and kills the stuck process
    session.quit().unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[cfg(unix)]
#[test]
fn late_response_is_not_taken_for_the_next_request() {
    let dir = tempfile::tempdir().unwrap();
    let body = "read first\nsleep 2\necho '{\"ok\":true,\"id\":1,\"text\":\"stale\"}'\n\
                read second\necho '{\"ok\":true,\"id\":2,\"text\":\"fresh\"}'\n\
                exec sleep 10\n";
    let options = scripted_bridge(dir.path(), body, 1200);
    let mut session = BrowserSession::launch(&options).unwrap();

    assert!(session.read_page_text().is_err());
    assert_eq!(session.read_page_text().unwrap(), "fresh");
}
