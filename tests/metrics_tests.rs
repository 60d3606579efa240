use std::time::Duration;

use rpc_loadgen::{
    metrics::{CHECK_NO_ERROR, CHECK_STATUS_200, PROMETHEUS_METRIC},
    validate::CheckReport,
    *,
};

fn populated() -> Metrics {
    let metrics = Metrics::new();
    metrics.record_iteration(TrafficPattern::RandomHistoricalBlocks);
    metrics.record_iteration(TrafficPattern::RandomHistoricalBlocks);
    metrics.record_iteration(TrafficPattern::LatestBlockReceipts);
    metrics.record_checks(&CheckReport { status_ok: true, no_error: true });
    metrics.record_checks(&CheckReport { status_ok: true, no_error: false });
    metrics.record_error(false);
    metrics.record_error(false);
    metrics.record_skip();
    metrics.record_http(Duration::from_millis(10), 100, 1000, false);
    metrics.record_http(Duration::from_millis(30), 120, 50, true);
    metrics
}

#[test]
fn test_summary_aggregates() {
    let summary = populated().summary();

    assert_eq!(summary.checks[CHECK_STATUS_200].passes, 2);
    assert_eq!(summary.checks[CHECK_NO_ERROR].passes, 1);
    assert_eq!(summary.checks[CHECK_NO_ERROR].fails, 1);
    assert_eq!(summary.errors.rate, 0.0);
    assert_eq!(summary.errors.total, 2);
    assert_eq!(summary.http_reqs, 2);
    assert_eq!(summary.http_req_failed.rate, 0.5);
    assert_eq!(summary.http_req_duration.avg, Some(20.0));
    assert_eq!(summary.data_sent, 220);
    assert_eq!(summary.data_received, 1050);
    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.skipped_iterations, 1);
    assert_eq!(summary.patterns["RANDOM_HISTORICAL_BLOCKS"], 2);
    assert_eq!(summary.patterns["LATEST_BLOCK_RECEIPTS"], 1);
}

#[test]
fn test_prometheus_lines() {
    let lines = populated().summary().to_prometheus("with-cache", 1_700_000_000_000);

    assert_eq!(lines.len(), 5);
    assert_eq!(
        lines[0],
        format!("{PROMETHEUS_METRIC}{{variant=\"with-cache\",metric=\"http_req_duration\"}} 20 1700000000000")
    );
    assert!(lines.contains(&"rpc_loadgen{variant=\"with-cache\",metric=\"http_reqs\"} 2 1700000000000".to_string()));
    assert!(lines.contains(&"rpc_loadgen{variant=\"with-cache\",metric=\"data_sent\"} 220 1700000000000".to_string()));
}

#[test]
fn test_prometheus_without_requests_omits_duration() {
    let lines = Metrics::new().summary().to_prometheus("a\"b", 1);
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| l.starts_with("rpc_loadgen{variant=\"a\\\"b\"")));
}

#[test]
fn test_text_report_mentions_headline_metrics() {
    let text = populated().summary().render_text();
    for needle in [CHECK_STATUS_200, CHECK_NO_ERROR, "errors", "http_req_duration", "iterations", "RANDOM_HISTORICAL_BLOCKS"] {
        assert!(text.contains(needle), "missing {needle}");
    }
}

#[test]
fn test_summary_serializes() {
    let json = serde_json::to_value(populated().summary()).unwrap();
    assert_eq!(json["http_reqs"], 2);
    assert_eq!(json["checks"]["status is 200"]["passes"], 2);
}
