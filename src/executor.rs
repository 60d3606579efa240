use std::{
    future::Future,
    pin::pin,
    sync::Arc,
    time::{Duration, Instant},
};

use futures::{FutureExt, StreamExt, stream::FuturesUnordered};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{config::ScenarioConfig, metrics::Metrics};

/// Something a virtual user runs once per scheduled start.
pub trait Iteration: Send + 'static {
    fn iterate(&mut self) -> impl Future<Output = ()> + Send;
}

impl<R> Iteration for crate::TrafficGenerator<R>
where
    R: rand::Rng + Send + 'static,
{
    async fn iterate(&mut self) {
        self.run_iteration().await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    pub started: u64,
    pub dropped: u64,
    pub vus_allocated: usize,
    /// Iterations still running after the graceful stop window, aborted
    pub interrupted: usize,
    pub elapsed: Duration,
}

/// Starts iterations at a fixed rate regardless of how long each one takes.
///
/// Each start borrows an idle virtual user from the pool, allocating a new one
/// up to `max_vus`. When every virtual user is busy the start is dropped, and so
/// is every start the scheduler itself was too late for.
pub struct ConstantArrivalRate {
    scenario: ScenarioConfig,
    metrics: Arc<Metrics>,
}

impl ConstantArrivalRate {
    pub fn new(scenario: ScenarioConfig, metrics: Arc<Metrics>) -> Self {
        Self { scenario, metrics }
    }

    pub async fn run<V, F>(&self, mut make_vu: F, cancel: CancellationToken) -> ExecutionReport
    where
        V: Iteration,
        F: FnMut(usize) -> V,
    {
        let started_at = Instant::now();
        let pool: Arc<parking_lot::Mutex<Vec<V>>> = Arc::new(parking_lot::Mutex::new(
            (0..self.scenario.pre_allocated_vus).map(&mut make_vu).collect(),
        ));
        let mut vus_allocated = self.scenario.pre_allocated_vus;
        let mut in_flight: FuturesUnordered<JoinHandle<()>> = FuturesUnordered::new();
        let mut started = 0u64;
        let mut dropped = 0u64;

        tracing::info!(
            rate = self.scenario.rate,
            time_unit_ms = self.scenario.time_unit.as_millis() as u64,
            duration_s = self.scenario.duration.as_secs(),
            pre_allocated_vus = self.scenario.pre_allocated_vus,
            max_vus = self.scenario.max_vus,
            "starting constant arrival rate scenario"
        );

        let period = self.scenario.start_interval();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick: Option<tokio::time::Instant> = None;
        let mut deadline = pin!(tokio::time::sleep(self.scenario.duration));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("scenario cancelled");
                    break;
                }
                _ = &mut deadline => break,
                at = ticker.tick() => {
                    let missed = last_tick.map_or(0, |prev| missed_starts(at - prev, period));
                    last_tick = Some(at);
                    if missed > 0 {
                        dropped += missed;
                        self.metrics.record_dropped_iterations(missed);
                        tracing::warn!(missed, "scheduler fell behind, starts dropped");
                    }

                    // reap finished iterations so the set does not grow for the whole run
                    while let Some(Some(_)) = in_flight.next().now_or_never() {}

                    let idle = pool.lock().pop();
                    let vu = match idle {
                        Some(vu) => Some(vu),
                        None if vus_allocated < self.scenario.max_vus => {
                            vus_allocated += 1;
                            tracing::debug!(vus_allocated, "allocating virtual user");
                            Some(make_vu(vus_allocated - 1))
                        }
                        None => None,
                    };

                    match vu {
                        Some(mut vu) => {
                            started += 1;
                            let pool = Arc::clone(&pool);
                            in_flight.push(tokio::spawn(async move {
                                vu.iterate().await;
                                pool.lock().push(vu);
                            }));
                        }
                        None => {
                            dropped += 1;
                            self.metrics.record_dropped_iteration();
                            tracing::warn!(max_vus = self.scenario.max_vus, "no idle virtual user, iteration dropped");
                        }
                    }
                }
            }
        }

        let interrupted = self.drain(in_flight).await;

        ExecutionReport {
            started,
            dropped,
            vus_allocated,
            interrupted,
            elapsed: started_at.elapsed(),
        }
    }

    /// Waits up to `graceful_stop` for running iterations, then aborts the rest.
    async fn drain(&self, mut in_flight: FuturesUnordered<JoinHandle<()>>) -> usize {
        let graceful = tokio::time::timeout(self.scenario.graceful_stop, async {
            while let Some(joined) = in_flight.next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "iteration task failed");
                }
            }
        })
        .await;

        if graceful.is_ok() {
            return 0;
        }

        let interrupted = in_flight.len();
        for handle in in_flight.iter() {
            handle.abort();
        }
        tracing::warn!(interrupted, "graceful stop elapsed, aborting iterations");
        interrupted
    }
}

/// Starts skipped between two ticks `gap` apart.
fn missed_starts(gap: Duration, period: Duration) -> u64 {
    (gap.as_nanos() / period.as_nanos()).saturating_sub(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missed_starts() {
        let period = Duration::from_millis(50);
        assert_eq!(missed_starts(period, period), 0);
        assert_eq!(missed_starts(Duration::from_millis(99), period), 0);
        assert_eq!(missed_starts(Duration::from_millis(200), period), 3);
    }
}
