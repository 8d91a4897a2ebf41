use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use crate::suggestions::types::EvaluatorKind;

/// Runs slower than this are logged with a warning.
const SLOW_RUN: Duration = Duration::from_secs(2);

#[derive(Default)]
struct EvaluatorStats {
    runs: AtomicU64,
    failures: AtomicU64,
    candidates: AtomicU64,
}

/// Process-wide counters for the suggestion engine. Cheap to bump from the
/// hot path, snapshotted on demand for the metrics endpoint.
pub struct EngineMetrics {
    runs_started: AtomicU64,
    runs_completed: AtomicU64,
    runs_failed: AtomicU64,
    suggestions_persisted: AtomicU64,
    suggestions_resolved: AtomicU64,
    upsert_retries: AtomicU64,
    total_run_us: AtomicU64,
    slowest_run_us: AtomicU64,
    evaluators: [EvaluatorStats; EvaluatorKind::ALL.len()],
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            runs_started: AtomicU64::new(0),
            runs_completed: AtomicU64::new(0),
            runs_failed: AtomicU64::new(0),
            suggestions_persisted: AtomicU64::new(0),
            suggestions_resolved: AtomicU64::new(0),
            upsert_retries: AtomicU64::new(0),
            total_run_us: AtomicU64::new(0),
            slowest_run_us: AtomicU64::new(0),
            evaluators: std::array::from_fn(|_| EvaluatorStats::default()),
        }
    }

    /// Starts a timer for one engine run; duration is recorded when the
    /// returned guard drops, whichever way the run ends.
    pub fn start_run(self: &Arc<Self>) -> RunTimer {
        self.runs_started.fetch_add(1, Ordering::Relaxed);
        RunTimer {
            metrics: Arc::clone(self),
            started: Instant::now(),
        }
    }

    pub fn record_run_completed(&self) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_run_failed(&self) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evaluator(&self, kind: EvaluatorKind, candidates: u64) {
        let stats = &self.evaluators[kind as usize];
        stats.runs.fetch_add(1, Ordering::Relaxed);
        stats.candidates.fetch_add(candidates, Ordering::Relaxed);
    }

    pub fn record_evaluator_failure(&self, kind: EvaluatorKind) {
        self.evaluators[kind as usize]
            .failures
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self, count: u64) {
        self.suggestions_persisted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_resolved(&self, count: u64) {
        self.suggestions_resolved.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_upsert_retry(&self) {
        self.upsert_retries.fetch_add(1, Ordering::Relaxed);
    }

    fn record_duration(&self, elapsed: Duration) {
        let us = elapsed.as_micros() as u64;
        self.total_run_us.fetch_add(us, Ordering::Relaxed);
        self.slowest_run_us.fetch_max(us, Ordering::Relaxed);
        if elapsed > SLOW_RUN {
            tracing::warn!(elapsed_ms = elapsed.as_millis() as u64, "slow suggestion run");
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let started = self.runs_started.load(Ordering::Relaxed);
        let total_us = self.total_run_us.load(Ordering::Relaxed);
        let avg_run_ms = if started > 0 {
            total_us as f64 / started as f64 / 1000.0
        } else {
            0.0
        };

        MetricsSummary {
            runs_started: started,
            runs_completed: self.runs_completed.load(Ordering::Relaxed),
            runs_failed: self.runs_failed.load(Ordering::Relaxed),
            suggestions_persisted: self.suggestions_persisted.load(Ordering::Relaxed),
            suggestions_resolved: self.suggestions_resolved.load(Ordering::Relaxed),
            upsert_retries: self.upsert_retries.load(Ordering::Relaxed),
            avg_run_ms,
            slowest_run_ms: self.slowest_run_us.load(Ordering::Relaxed) as f64 / 1000.0,
            evaluators: EvaluatorKind::ALL
                .iter()
                .map(|kind| {
                    let stats = &self.evaluators[*kind as usize];
                    EvaluatorSummary {
                        evaluator: kind.as_str().to_string(),
                        runs: stats.runs.load(Ordering::Relaxed),
                        failures: stats.failures.load(Ordering::Relaxed),
                        candidates: stats.candidates.load(Ordering::Relaxed),
                    }
                })
                .collect(),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Records the run duration when dropped.
pub struct RunTimer {
    metrics: Arc<EngineMetrics>,
    started: Instant,
}

impl Drop for RunTimer {
    fn drop(&mut self) {
        self.metrics.record_duration(self.started.elapsed());
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub runs_started: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
    pub suggestions_persisted: u64,
    pub suggestions_resolved: u64,
    pub upsert_retries: u64,
    pub avg_run_ms: f64,
    pub slowest_run_ms: f64,
    pub evaluators: Vec<EvaluatorSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EvaluatorSummary {
    pub evaluator: String,
    pub runs: u64,
    pub failures: u64,
    pub candidates: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = EngineMetrics::new();
        metrics.record_persisted(3);
        metrics.record_persisted(2);
        metrics.record_resolved(1);
        metrics.record_upsert_retry();
        metrics.record_run_completed();

        let summary = metrics.summary();
        assert_eq!(summary.suggestions_persisted, 5);
        assert_eq!(summary.suggestions_resolved, 1);
        assert_eq!(summary.upsert_retries, 1);
        assert_eq!(summary.runs_completed, 1);
    }

    #[test]
    fn timer_records_duration_on_drop() {
        let metrics = Arc::new(EngineMetrics::new());
        {
            let _timer = metrics.start_run();
            std::thread::sleep(Duration::from_millis(2));
        }

        let summary = metrics.summary();
        assert_eq!(summary.runs_started, 1);
        assert!(summary.avg_run_ms > 0.0);
        assert!(summary.slowest_run_ms > 0.0);
    }

    #[test]
    fn evaluator_stats_track_per_kind() {
        let metrics = EngineMetrics::new();
        metrics.record_evaluator(EvaluatorKind::Reorder, 4);
        metrics.record_evaluator(EvaluatorKind::Reorder, 1);
        metrics.record_evaluator_failure(EvaluatorKind::PaymentDue);

        let summary = metrics.summary();
        let reorder = summary
            .evaluators
            .iter()
            .find(|e| e.evaluator == "reorder")
            .unwrap();
        assert_eq!(reorder.runs, 2);
        assert_eq!(reorder.candidates, 5);

        let payment = summary
            .evaluators
            .iter()
            .find(|e| e.evaluator == "payment_due")
            .unwrap();
        assert_eq!(payment.failures, 1);
        assert_eq!(payment.runs, 0);
    }
}
