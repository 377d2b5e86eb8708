use chrono::{DateTime, Utc};
use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncMetrics {
    pub api_requests: u64,
    pub failed_api_requests: u64,
    pub avg_response_time_ms: f64,
    pub rows_updated: u64,
    pub rows_inserted: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub last_error: Option<String>,
    pub last_error_time: Option<DateTime<Utc>>,
}

/// Shared, cloneable handle. One collector is shared by every job in the
/// process.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    metrics: Arc<Mutex<SyncMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request_start(&self) -> RequestTracker {
        RequestTracker {
            start_time: Instant::now(),
            collector: self.clone(),
        }
    }

    pub fn record_rows_updated(&self, rows: u64) {
        self.metrics.lock().unwrap().rows_updated += rows;
    }

    pub fn record_rows_inserted(&self, rows: u64) {
        self.metrics.lock().unwrap().rows_inserted += rows;
    }

    pub fn record_cycle_success(&self) {
        self.metrics.lock().unwrap().cycles_completed += 1;
    }

    pub fn record_cycle_failure(&self, error: String) {
        let mut metrics = self.metrics.lock().unwrap();
        metrics.cycles_failed += 1;
        metrics.last_error = Some(error);
        metrics.last_error_time = Some(Utc::now());
    }

    pub fn get_metrics(&self) -> SyncMetrics {
        self.metrics.lock().unwrap().clone()
    }

    pub fn log_summary(&self) {
        let m = self.get_metrics();
        info!(
            "Metrics: {} api requests ({} failed, avg {:.1} ms), {} rows updated, {} rows inserted, {} cycles ok, {} failed",
            m.api_requests,
            m.failed_api_requests,
            m.avg_response_time_ms,
            m.rows_updated,
            m.rows_inserted,
            m.cycles_completed,
            m.cycles_failed
        );
    }
}

pub struct RequestTracker {
    start_time: Instant,
    collector: MetricsCollector,
}

impl RequestTracker {
    pub fn finish(self, success: bool) {
        let duration = self.start_time.elapsed();
        let mut metrics = self.collector.metrics.lock().unwrap();

        metrics.api_requests += 1;
        if !success {
            metrics.failed_api_requests += 1;
        }

        // Exponential moving average, seeded by the first sample.
        let sample = duration.as_secs_f64() * 1000.0;
        metrics.avg_response_time_ms = if metrics.api_requests == 1 {
            sample
        } else {
            let alpha = 0.1;
            metrics.avg_response_time_ms * (1.0 - alpha) + sample * alpha
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_request_tracking() {
        let collector = MetricsCollector::new();

        let tracker = collector.record_request_start();
        std::thread::sleep(Duration::from_millis(5));
        tracker.finish(true);
        collector.record_request_start().finish(false);

        let metrics = collector.get_metrics();
        assert_eq!(metrics.api_requests, 2);
        assert_eq!(metrics.failed_api_requests, 1);
        assert!(metrics.avg_response_time_ms > 0.0);
    }

    #[test]
    fn test_row_and_cycle_counters() {
        let collector = MetricsCollector::new();
        collector.record_rows_updated(3);
        collector.record_rows_inserted(2);
        collector.record_rows_inserted(1);
        collector.record_cycle_success();
        collector.record_cycle_failure("boom".to_string());

        let metrics = collector.get_metrics();
        assert_eq!(metrics.rows_updated, 3);
        assert_eq!(metrics.rows_inserted, 3);
        assert_eq!(metrics.cycles_completed, 1);
        assert_eq!(metrics.cycles_failed, 1);
        assert_eq!(metrics.last_error.as_deref(), Some("boom"));
        assert!(metrics.last_error_time.is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let collector = MetricsCollector::new();
        let other = collector.clone();
        other.record_rows_updated(7);
        assert_eq!(collector.get_metrics().rows_updated, 7);
    }
}
