//! Performance metrics and statistics tracking for the prediction service.

use crate::error::ErrorKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Width of one predicted-days histogram bucket
const BUCKET_DAYS: f64 = 15.0;
const BUCKETS: usize = 10;

/// Metrics collector for the prediction service
pub struct ServiceMetrics {
    /// Total predictions served
    pub predictions_served: AtomicU64,
    /// Total failed requests
    pub failures: AtomicU64,
    /// Failures by kind
    failures_by_kind: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Predicted-days distribution buckets
    day_buckets: RwLock<[u64; BUCKETS]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ServiceMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_served: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            failures_by_kind: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            day_buckets: RwLock::new([0; BUCKETS]),
            start_time: Instant::now(),
        }
    }

    /// Record a served prediction
    pub fn record_prediction(&self, processing_time: Duration, predicted_days: f64) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
        self.record_latency(processing_time);

        let bucket = ((predicted_days.max(0.0) / BUCKET_DAYS) as usize).min(BUCKETS - 1);
        if let Ok(mut buckets) = self.day_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a failed request
    pub fn record_failure(&self, processing_time: Duration, kind: ErrorKind) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.record_latency(processing_time);

        let label = format!("{:?}", kind);
        if let Ok(mut by_kind) = self.failures_by_kind.write() {
            *by_kind.entry(label).or_insert(0) += 1;
        }
    }

    fn record_latency(&self, processing_time: Duration) {
        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => {
                let mut sorted = times.clone();
                sorted.sort_unstable();
                sorted
            }
            _ => return ProcessingStats::default(),
        };

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();
        let percentile = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: percentile(0.95),
            p99_us: percentile(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (requests per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let handled = self.predictions_served.load(Ordering::Relaxed) + self.failures.load(Ordering::Relaxed);
        if elapsed > 0.0 {
            handled as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get the predicted-days histogram
    pub fn get_day_distribution(&self) -> [u64; BUCKETS] {
        self.day_buckets.read().map(|b| *b).unwrap_or([0; BUCKETS])
    }

    /// Get failure counts keyed by error kind
    pub fn get_failures_by_kind(&self) -> HashMap<String, u64> {
        self.failures_by_kind
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let served = self.predictions_served.load(Ordering::Relaxed);
        let failed = self.failures.load(Ordering::Relaxed);
        let processing = self.get_processing_stats();

        info!(
            served,
            failed,
            throughput = format!("{:.1} req/s", self.get_throughput()),
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "Prediction service summary"
        );

        for (kind, count) in self.get_failures_by_kind() {
            info!(kind = %kind, count, "Failures by kind");
        }

        let distribution = self.get_day_distribution();
        let total: u64 = distribution.iter().sum();
        for (i, &count) in distribution.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = (count as f64 / total as f64) * 100.0;
            let low = i as f64 * BUCKET_DAYS;
            let range = if i == BUCKETS - 1 {
                format!("{:>3}+ days", low)
            } else {
                format!("{:>3}-{:<3} days", low, low + BUCKET_DAYS)
            };
            info!(
                "  {}: {:>6} ({:>5.1}%) {}",
                range,
                count,
                pct,
                "█".repeat(((pct / 5.0) as usize).min(20))
            );
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    /// Create a new reporter
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs.max(1)));
        // First tick fires immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ServiceMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), 12.0);
        metrics.record_prediction(Duration::from_micros(300), 400.0);
        metrics.record_failure(Duration::from_micros(50), ErrorKind::MissingArtifact);

        assert_eq!(metrics.predictions_served.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_failures_by_kind().get("MissingArtifact"), Some(&1));

        let distribution = metrics.get_day_distribution();
        assert_eq!(distribution[0], 1);
        assert_eq!(distribution[BUCKETS - 1], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = ServiceMetrics::new();
        assert_eq!(metrics.get_processing_stats().count, 0);

        for us in [100, 200, 300, 400] {
            metrics.record_prediction(Duration::from_micros(us), 10.0);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
        assert_eq!(stats.p99_us, 400);
    }
}
