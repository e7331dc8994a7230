//! Reduction of sample records into the benchmark result.

use hdrhistogram::Histogram;
use std::time::Duration;

use super::handler::BenchmarkTarget;
use super::report::BenchmarkResult;
use super::sample::SampleRecord;
use crate::error::{BenchError, Result};

/// Latency diagnostics that are not part of the result record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub p50_ms: f64,
    pub p99_ms: f64,
}

/// Computes the result record from successful samples
pub struct StatisticsAggregator;

impl StatisticsAggregator {
    /// Build the result for `target` from its successful samples
    pub fn aggregate(
        target: &BenchmarkTarget,
        records: &[SampleRecord],
        duplication_factor: f64,
    ) -> Result<BenchmarkResult> {
        if records.is_empty() {
            return Err(BenchError::NoSamples);
        }

        let count = records.len() as f64;
        let total_latency: Duration = records.iter().map(|r| r.latency).sum();
        let total_secs = total_latency.as_secs_f64();
        let total_bytes: usize = records.iter().map(SampleRecord::body_len).sum();

        let ops_per_sec = count / total_secs;
        let avg_latency_ms = total_secs * 1000.0 / count;
        let body_size_kb = total_bytes as f64 / count / 1024.0;

        // Zero total latency gives an infinite rate
        if !ops_per_sec.is_finite() || ops_per_sec <= 0.0 {
            return Err(BenchError::NonFinite("ssrOpsPerSec"));
        }
        if !duplication_factor.is_finite() || duplication_factor < 1.0 {
            return Err(BenchError::NonFinite("ssrDuplicationFactor"));
        }

        Ok(BenchmarkResult {
            name: target.name.clone(),
            display_name: target.display_name.clone(),
            package: target.package.clone(),
            ssr_ops_per_sec: ops_per_sec,
            ssr_avg_latency_ms: avg_latency_ms,
            ssr_samples: records.len(),
            ssr_body_size_kb: body_size_kb,
            ssr_duplication_factor: duplication_factor,
        })
    }

    /// Min/max and percentile latencies, `None` when there are no samples
    pub fn latency_summary(records: &[SampleRecord]) -> Option<LatencySummary> {
        if records.is_empty() {
            return None;
        }

        // Microsecond resolution, up to 10 minutes with 3 significant figures
        let mut histogram = Histogram::<u64>::new_with_bounds(1, 600_000_000, 3).ok()?;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;

        for record in records {
            histogram.saturating_record((record.latency.as_micros() as u64).max(1));
            min = min.min(record.latency);
            max = max.max(record.latency);
        }

        Some(LatencySummary {
            min_ms: min.as_secs_f64() * 1000.0,
            max_ms: max.as_secs_f64() * 1000.0,
            p50_ms: histogram.value_at_percentile(50.0) as f64 / 1000.0,
            p99_ms: histogram.value_at_percentile(99.0) as f64 / 1000.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::handler::handler_fn;
    use bytes::Bytes;

    fn target() -> BenchmarkTarget {
        BenchmarkTarget::new(
            "demo-ssr",
            "Demo SSR",
            "app-demo",
            handler_fn(|_req, _res| async { Ok(()) }),
        )
    }

    fn record(latency_ms: u64, body: &'static str) -> SampleRecord {
        SampleRecord {
            latency: Duration::from_millis(latency_ms),
            status: 200,
            body: Bytes::from_static(body.as_bytes()),
            violations: Vec::new(),
        }
    }

    #[test]
    fn test_fixed_latency_ops_per_sec() {
        let records: Vec<_> = (0..7).map(|_| record(4, "<p>x</p>")).collect();
        let result = StatisticsAggregator::aggregate(&target(), &records, 1.0).unwrap();

        assert!((result.ssr_ops_per_sec - 250.0).abs() < 1e-6);
        assert!((result.ssr_avg_latency_ms - 4.0).abs() < 1e-9);
        assert_eq!(result.ssr_samples, 7);
    }

    #[test]
    fn test_means() {
        let records = vec![record(2, "abcd"), record(6, "abcdefghijkl")];
        let result = StatisticsAggregator::aggregate(&target(), &records, 1.0).unwrap();

        assert!((result.ssr_avg_latency_ms - 4.0).abs() < 1e-9);
        // 2 samples over 8ms total
        assert!((result.ssr_ops_per_sec - 250.0).abs() < 1e-6);
        assert!((result.ssr_body_size_kb - 8.0 / 1024.0).abs() < 1e-12);
        assert_eq!(result.name, "demo-ssr");
        assert_eq!(result.display_name, "Demo SSR");
        assert_eq!(result.package, "app-demo");
    }

    #[test]
    fn test_no_samples_is_an_error() {
        let err = StatisticsAggregator::aggregate(&target(), &[], 1.0).unwrap_err();
        assert!(matches!(err, BenchError::NoSamples));
    }

    #[test]
    fn test_zero_latency_rejected() {
        let records = vec![record(0, "x")];
        let err = StatisticsAggregator::aggregate(&target(), &records, 1.0).unwrap_err();
        assert!(matches!(err, BenchError::NonFinite("ssrOpsPerSec")));
    }

    #[test]
    fn test_duplication_factor_passed_through() {
        let records = vec![record(1, "x")];
        let result = StatisticsAggregator::aggregate(&target(), &records, 2.0).unwrap();
        assert_eq!(result.ssr_duplication_factor, 2.0);

        let err = StatisticsAggregator::aggregate(&target(), &records, f64::NAN).unwrap_err();
        assert!(matches!(err, BenchError::NonFinite(_)));
    }

    #[test]
    fn test_latency_summary() {
        let records = vec![record(1, ""), record(2, ""), record(3, ""), record(10, "")];
        let summary = StatisticsAggregator::latency_summary(&records).unwrap();

        assert_eq!(summary.min_ms, 1.0);
        assert_eq!(summary.max_ms, 10.0);
        assert!(summary.p50_ms >= 1.9 && summary.p50_ms <= 2.1);
        assert!(summary.p99_ms >= 9.9 && summary.p99_ms <= 10.1);
        assert!(StatisticsAggregator::latency_summary(&[]).is_none());
    }
}
