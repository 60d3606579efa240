use std::collections::BTreeMap;

use serde::Serialize;

use crate::metrics::Tally;

/// Prefix of every exported Prometheus sample.
pub const PROMETHEUS_METRIC: &str = "rpc_loadgen";

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub checks: BTreeMap<String, CheckSummary>,
    pub errors: RateSummary,
    pub http_reqs: u64,
    pub http_req_failed: RateSummary,
    pub http_req_duration: TrendSummary,
    pub data_sent: u64,
    pub data_received: u64,
    pub iterations: u64,
    pub skipped_iterations: u64,
    pub dropped_iterations: u64,
    pub patterns: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CheckSummary {
    pub passes: u64,
    pub fails: u64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RateSummary {
    pub rate: f64,
    pub hits: u64,
    pub total: u64,
}

impl RateSummary {
    pub(crate) fn from_tally(tally: &Tally) -> Self {
        let hits = tally.passes();
        let total = hits + tally.fails();
        let rate = if total == 0 { 0.0 } else { hits as f64 / total as f64 };
        Self { rate, hits, total }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TrendSummary {
    pub count: usize,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub med: Option<f64>,
    pub p90: Option<f64>,
    pub p95: Option<f64>,
    pub max: Option<f64>,
}

impl TrendSummary {
    pub fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let count = samples.len();
        let avg = samples.iter().sum::<f64>() / count as f64;
        let med = if count % 2 == 1 {
            samples[count / 2]
        } else {
            (samples[count / 2 - 1] + samples[count / 2]) / 2.0
        };
        Self {
            count,
            avg: Some(avg),
            min: samples.first().copied(),
            med: Some(med),
            p90: Some(percentile(&samples, 90)),
            p95: Some(percentile(&samples, 95)),
            max: samples.last().copied(),
        }
    }
}

fn percentile(sorted: &[f64], pct: usize) -> f64 {
    let idx = sorted.len() * pct / 100;
    sorted[idx.min(sorted.len() - 1)]
}

impl Summary {
    /// Human-readable end-of-test report.
    pub fn render_text(&self) -> String {
        let fmt_ms = |v: Option<f64>| v.map(|n| format!("{n:.2}ms")).unwrap_or_else(|| "NaN".into());
        let mut out = String::new();

        out.push_str("checks\n");
        for (name, check) in &self.checks {
            let total = check.passes + check.fails;
            let pct = if total == 0 { 0.0 } else { check.passes as f64 * 100.0 / total as f64 };
            out.push_str(&format!(
                "  {name:<24} {pct:>6.2}%  ✓ {}  ✗ {}\n",
                check.passes, check.fails
            ));
        }

        out.push_str(&format!(
            "errors.....................: {:.2}% {} of {}\n",
            self.errors.rate * 100.0,
            self.errors.hits,
            self.errors.total
        ));
        out.push_str(&format!("http_reqs..................: {}\n", self.http_reqs));
        out.push_str(&format!(
            "http_req_failed............: {:.2}% {} of {}\n",
            self.http_req_failed.rate * 100.0,
            self.http_req_failed.hits,
            self.http_req_failed.total
        ));
        let d = &self.http_req_duration;
        out.push_str(&format!(
            "http_req_duration..........: avg={} min={} med={} p(90)={} p(95)={} max={}\n",
            fmt_ms(d.avg),
            fmt_ms(d.min),
            fmt_ms(d.med),
            fmt_ms(d.p90),
            fmt_ms(d.p95),
            fmt_ms(d.max)
        ));
        out.push_str(&format!("data_sent..................: {} B\n", self.data_sent));
        out.push_str(&format!("data_received..............: {} B\n", self.data_received));
        out.push_str(&format!("iterations.................: {}\n", self.iterations));
        out.push_str(&format!("skipped_iterations.........: {}\n", self.skipped_iterations));
        out.push_str(&format!("dropped_iterations.........: {}\n", self.dropped_iterations));

        out.push_str("patterns\n");
        for (name, count) in &self.patterns {
            out.push_str(&format!("  {name:<28} {count}\n"));
        }
        out
    }

    /// Prometheus text samples with an explicit timestamp, one per headline metric.
    pub fn to_prometheus(&self, variant: &str, timestamp_ms: i64) -> Vec<String> {
        let variant = variant.replace('\\', "\\\\").replace('"', "\\\"");
        let mut values: Vec<(&str, f64)> = Vec::new();
        if let Some(avg) = self.http_req_duration.avg {
            values.push(("http_req_duration", avg));
        }
        values.push(("http_reqs", self.http_reqs as f64));
        values.push(("iterations", self.iterations as f64));
        values.push(("data_received", self.data_received as f64));
        values.push(("data_sent", self.data_sent as f64));

        values
            .into_iter()
            .map(|(metric, value)| {
                format!(
                    "{PROMETHEUS_METRIC}{{variant=\"{variant}\",metric=\"{metric}\"}} {value} {timestamp_ms}"
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_of_empty_samples_has_no_values() {
        let t = TrendSummary::from_samples(vec![]);
        assert_eq!(t.count, 0);
        assert!(t.avg.is_none() && t.p95.is_none());
    }

    #[test]
    fn test_trend_percentiles() {
        let t = TrendSummary::from_samples((1..=100).rev().map(|n| n as f64).collect());
        assert_eq!(t.count, 100);
        assert_eq!(t.min, Some(1.0));
        assert_eq!(t.max, Some(100.0));
        assert_eq!(t.med, Some(50.5));
        assert_eq!(t.p90, Some(91.0));
        assert_eq!(t.p95, Some(96.0));
        assert_eq!(t.avg, Some(50.5));
    }
}
