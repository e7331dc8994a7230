//! Sequential warm-up and measurement loop for one target.

use std::collections::BTreeMap;

use super::config::BenchmarkConfig;
use super::handler::BenchmarkTarget;
use super::integrity::IntegrityAnalyzer;
use super::metrics::{LatencySummary, StatisticsAggregator};
use super::report::BenchmarkResult;
use super::sample::{SampleRecord, SampleRunner};
use crate::error::{BenchError, Result, SampleError};

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    WarmingUp,
    Measuring,
    Done,
}

/// What a finished run produced besides the result record
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: BenchmarkResult,
    /// Measurement samples that failed, by failure kind
    pub failures: BTreeMap<&'static str, usize>,
    /// Successful samples that carried a protocol anomaly
    pub samples_with_violations: usize,
    pub latency: Option<LatencySummary>,
}

impl RunOutcome {
    pub fn failed_samples(&self) -> usize {
        self.failures.values().sum()
    }
}

/// Drives one target through warm-up and measurement.
///
/// Samples run strictly one after another so latency is never mixed with
/// queueing delay. Records never outlive a call to [`BenchmarkLoop::run`].
pub struct BenchmarkLoop {
    config: BenchmarkConfig,
    phase: Phase,
}

impl BenchmarkLoop {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Benchmark `target` and return its result
    pub async fn run(&mut self, target: &BenchmarkTarget) -> Result<RunOutcome> {
        self.phase = Phase::Idle;
        self.config.validate().map_err(BenchError::ConfigError)?;

        let sampler = SampleRunner::new(target.handler.clone(), self.config.sample_timeout());

        self.phase = Phase::WarmingUp;
        tracing::info!(
            "Warming up {} with {} samples...",
            target.display_name,
            self.config.warmup_samples
        );
        for i in 0..self.config.warmup_samples {
            if let Err(e) = sampler.run().await {
                tracing::warn!("Warm-up sample {} for {} failed: {}", i + 1, target.name, e);
            }
        }

        self.phase = Phase::Measuring;
        tracing::info!(
            "Measuring {} with {} samples...",
            target.display_name,
            self.config.sample_count
        );
        let mut records: Vec<SampleRecord> = Vec::with_capacity(self.config.sample_count);
        let mut failures: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut last_error: Option<SampleError> = None;

        for i in 0..self.config.sample_count {
            match sampler.run().await {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Sample {} for {} failed: {}", i + 1, target.name, e);
                    *failures.entry(e.kind()).or_insert(0) += 1;
                    last_error = Some(e);
                }
            }
        }

        self.phase = Phase::Done;

        if records.is_empty() {
            return Err(match last_error {
                Some(last_error) => BenchError::AllSamplesFailed {
                    target: target.name.clone(),
                    attempted: self.config.sample_count,
                    last_error,
                },
                None => BenchError::NoSamples,
            });
        }

        let duplication_factor =
            IntegrityAnalyzer::new(self.config.min_repeat_width).analyze(&records);
        let result = StatisticsAggregator::aggregate(target, &records, duplication_factor)?;

        let samples_with_violations = records.iter().filter(|r| !r.violations.is_empty()).count();
        if samples_with_violations > 0 {
            tracing::warn!(
                "{} of {} samples for {} had protocol anomalies",
                samples_with_violations,
                records.len(),
                target.name
            );
        }

        let outcome = RunOutcome {
            latency: StatisticsAggregator::latency_summary(&records),
            result,
            failures,
            samples_with_violations,
        };

        tracing::info!(
            "{}: {:.1} ops/sec, {:.3}ms avg, {} samples ({} failed)",
            target.display_name,
            outcome.result.ssr_ops_per_sec,
            outcome.result.ssr_avg_latency_ms,
            outcome.result.ssr_samples,
            outcome.failed_samples()
        );

        Ok(outcome)
    }
}
