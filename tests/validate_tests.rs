use rpc_loadgen::{
    RpcResponse,
    validate::{EXCERPT_BYTES, body_excerpt, body_has_no_error, check_response, has_no_error},
};
use serde_json::json;
use std::{io, sync::Arc};

#[derive(Clone, Default)]
struct CapturedLogs(Arc<parking_lot::Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

/// Runs `f` with a fmt subscriber writing into the returned buffer.
fn with_captured_logs(f: impl FnOnce()) -> CapturedLogs {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    logs
}

fn response(status: u16, body: &str) -> RpcResponse {
    RpcResponse { status, body: body.to_string(), request_body: "{}".to_string() }
}

#[test]
fn test_clean_response_passes_both_checks() {
    let report = check_response(&response(200, r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#));
    assert!(report.status_ok);
    assert!(report.no_error);
    assert!(report.passed());
}

#[test]
fn test_null_error_is_not_an_error() {
    assert!(has_no_error(&response(200, r#"{"jsonrpc":"2.0","id":1,"result":null,"error":null}"#)));
}

#[test]
fn test_error_object_fails_semantic_check_only() {
    let report = check_response(&response(
        200,
        r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"header not found"}}"#,
    ));
    assert!(report.status_ok);
    assert!(!report.no_error);
    assert!(!report.passed());
}

#[test]
fn test_non_200_with_clean_body() {
    let report = check_response(&response(429, r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#));
    assert!(!report.status_ok);
    assert!(report.no_error);
}

#[test]
fn test_malformed_bodies_fail_without_panicking() {
    for body in ["", "not json", "{\"result\":", "<html>502 Bad Gateway</html>"] {
        assert!(!has_no_error(&response(200, body)), "body {body:?} should fail");
    }
}

#[test]
fn test_falsy_bodies_fail() {
    assert!(!body_has_no_error(&json!(null)));
    assert!(!body_has_no_error(&json!(false)));
    assert!(!body_has_no_error(&json!(0)));
    assert!(body_has_no_error(&json!([])));
    // any non-null error counts, even falsy ones
    assert!(!body_has_no_error(&json!({"error": false})));
    assert!(!body_has_no_error(&json!({"error": ""})));
}

#[test]
fn test_large_body_is_still_validated() {
    let padding = "a".repeat(1_200_000);
    let body = format!(r#"{{"jsonrpc":"2.0","id":1,"result":"{padding}"}}"#);
    assert!(has_no_error(&response(200, &body)));
}

#[test]
fn test_excerpt_keeps_both_ends() {
    let short = "x".repeat(100);
    assert_eq!(body_excerpt(&short), short);

    let body = format!("{}{}{}", "h".repeat(EXCERPT_BYTES), "m".repeat(20_000), "t".repeat(EXCERPT_BYTES));
    let excerpt = body_excerpt(&body);
    assert_eq!(excerpt.len(), EXCERPT_BYTES * 2 + 3);
    assert!(excerpt.starts_with(&"h".repeat(EXCERPT_BYTES)));
    assert!(excerpt.ends_with(&"t".repeat(EXCERPT_BYTES)));
    assert!(!excerpt.contains('m'));
}

#[test]
fn test_malformed_body_logs_bounded_diagnostic() {
    let body = format!("<html>{}</html>", "x".repeat(30_000));
    let logs = with_captured_logs(|| {
        let mut response = response(200, &body);
        response.request_body = r#"{"method":"eth_getLogs"}"#.to_string();
        assert!(!has_no_error(&response));
    });

    let text = logs.text();
    let lines: Vec<&str> = text.lines().filter(|l| l.contains("unmarshal error")).collect();
    assert_eq!(lines.len(), 1, "logs: {text}");
    let line = lines[0];
    assert!(line.contains("ERROR"));
    assert!(line.contains("eth_getLogs"));
    assert!(line.contains("<html>") && line.contains("</html>") && line.contains("..."));
    assert!(line.len() < 2 * EXCERPT_BYTES + 1_000, "line is {} bytes", line.len());
}

#[test]
fn test_small_malformed_body_logged_whole() {
    let logs = with_captured_logs(|| {
        assert!(!has_no_error(&response(502, "bad gateway")));
    });
    assert!(logs.text().contains("bad gateway"));
}
