pub mod summary;

pub use summary::{CheckSummary, PROMETHEUS_METRIC, RateSummary, Summary, TrendSummary};

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use dashmap::DashMap;

use crate::{traffic::TrafficPattern, validate::CheckReport};

pub const CHECK_STATUS_200: &str = "status is 200";
pub const CHECK_NO_ERROR: &str = "response has no error";

/// Pass/fail counter. Rates reuse it with `true` samples counted as passes.
#[derive(Debug, Default)]
pub struct Tally {
    passes: AtomicU64,
    fails: AtomicU64,
}

impl Tally {
    pub fn add(&self, ok: bool) {
        if ok {
            self.passes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.fails.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }

    pub fn fails(&self) -> u64 {
        self.fails.load(Ordering::Relaxed)
    }
}

/// Registry shared by every virtual user of a run.
///
/// `errors` follows the final response of each iteration that issued a request,
/// while the `http_*` and `data_*` series cover every request on the wire,
/// preparatory ones included.
#[derive(Debug, Default)]
pub struct Metrics {
    checks: DashMap<&'static str, Tally>,
    /// Samples are `true` when the answered status was not 200
    errors: Tally,
    http_reqs: AtomicU64,
    http_req_failed: Tally,
    http_req_duration_ms: parking_lot::Mutex<Vec<f64>>,
    data_sent: AtomicU64,
    data_received: AtomicU64,
    iterations: AtomicU64,
    skipped_iterations: AtomicU64,
    dropped_iterations: AtomicU64,
    patterns: DashMap<TrafficPattern, AtomicU64>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_check(&self, name: &'static str, ok: bool) {
        self.checks.entry(name).or_default().add(ok);
    }

    pub fn record_checks(&self, report: &CheckReport) {
        self.record_check(CHECK_STATUS_200, report.status_ok);
        self.record_check(CHECK_NO_ERROR, report.no_error);
    }

    pub fn record_error(&self, is_error: bool) {
        self.errors.add(is_error);
    }

    pub fn record_http(&self, duration: Duration, sent: usize, received: usize, failed: bool) {
        self.http_reqs.fetch_add(1, Ordering::Relaxed);
        self.http_req_failed.add(failed);
        self.http_req_duration_ms.lock().push(duration.as_nanos() as f64 / 1_000_000.0);
        self.data_sent.fetch_add(sent as u64, Ordering::Relaxed);
        self.data_received.fetch_add(received as u64, Ordering::Relaxed);
    }

    pub fn record_iteration(&self, pattern: TrafficPattern) {
        self.iterations.fetch_add(1, Ordering::Relaxed);
        self.patterns
            .entry(pattern)
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skip(&self) {
        self.skipped_iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped_iteration(&self) {
        self.record_dropped_iterations(1);
    }

    pub fn record_dropped_iterations(&self, count: u64) {
        self.dropped_iterations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn check(&self, name: &str) -> (u64, u64) {
        self.checks
            .get(name)
            .map(|t| (t.passes(), t.fails()))
            .unwrap_or((0, 0))
    }

    pub fn http_reqs(&self) -> u64 {
        self.http_reqs.load(Ordering::Relaxed)
    }

    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    pub fn dropped_iterations(&self) -> u64 {
        self.dropped_iterations.load(Ordering::Relaxed)
    }

    pub fn skipped_iterations(&self) -> u64 {
        self.skipped_iterations.load(Ordering::Relaxed)
    }

    pub fn pattern_count(&self, pattern: TrafficPattern) -> u64 {
        self.patterns
            .get(&pattern)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn summary(&self) -> Summary {
        let checks = self
            .checks
            .iter()
            .map(|entry| {
                let tally = entry.value();
                (
                    entry.key().to_string(),
                    CheckSummary { passes: tally.passes(), fails: tally.fails() },
                )
            })
            .collect();

        let patterns = self
            .patterns
            .iter()
            .map(|entry| (entry.key().name().to_string(), entry.value().load(Ordering::Relaxed)))
            .collect();

        let durations = self.http_req_duration_ms.lock().clone();

        Summary {
            checks,
            errors: RateSummary::from_tally(&self.errors),
            http_reqs: self.http_reqs(),
            http_req_failed: RateSummary::from_tally(&self.http_req_failed),
            http_req_duration: TrendSummary::from_samples(durations),
            data_sent: self.data_sent.load(Ordering::Relaxed),
            data_received: self.data_received.load(Ordering::Relaxed),
            iterations: self.iterations(),
            skipped_iterations: self.skipped_iterations(),
            dropped_iterations: self.dropped_iterations(),
            patterns,
        }
    }
}
