//! Result records and report generation for benchmark runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final record for one benchmarked target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub name: String,
    pub display_name: String,
    pub package: String,
    pub ssr_ops_per_sec: f64,
    pub ssr_avg_latency_ms: f64,
    pub ssr_samples: usize,
    pub ssr_body_size_kb: f64,
    pub ssr_duplication_factor: f64,
}

impl BenchmarkResult {
    /// Per-package CI record stamped with the current time
    pub fn to_ci_stats(&self, runner: &str, framework_version: Option<String>) -> CiStats {
        CiStats {
            timing_measured_at: Utc::now(),
            runner: runner.to_string(),
            framework_version,
            ssr_ops_per_sec: self.ssr_ops_per_sec,
            ssr_avg_latency_ms: self.ssr_avg_latency_ms,
            ssr_samples: self.ssr_samples,
            ssr_body_size_kb: self.ssr_body_size_kb,
            ssr_duplication_factor: self.ssr_duplication_factor,
        }
    }

    /// Stats entry in the shape the docs site consumes
    pub fn to_ssr_stats(&self) -> SsrStats {
        SsrStats {
            name: self.display_name.clone(),
            package: self.package.clone(),
            kind: "ssr-app".to_string(),
            ssr_ops_per_sec: self.ssr_ops_per_sec,
            ssr_avg_latency_ms: self.ssr_avg_latency_ms,
            ssr_samples: self.ssr_samples,
            ssr_body_size_kb: self.ssr_body_size_kb,
            ssr_duplication_factor: self.ssr_duplication_factor,
        }
    }

    /// Whether the integrity check flagged duplicated output
    pub fn is_duplicated(&self) -> bool {
        self.ssr_duplication_factor > 1.0
    }
}

/// CI timing record for one package
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CiStats {
    pub timing_measured_at: DateTime<Utc>,
    pub runner: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_version: Option<String>,
    pub ssr_ops_per_sec: f64,
    pub ssr_avg_latency_ms: f64,
    pub ssr_samples: usize,
    pub ssr_body_size_kb: f64,
    pub ssr_duplication_factor: f64,
}

/// Stats entry keyed by display name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SsrStats {
    pub name: String,
    pub package: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub ssr_ops_per_sec: f64,
    pub ssr_avg_latency_ms: f64,
    pub ssr_samples: usize,
    pub ssr_body_size_kb: f64,
    pub ssr_duplication_factor: f64,
}

/// A target whose run failed outright
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTarget {
    pub package: String,
    pub error: String,
}

/// Results across all benchmarked targets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub results: Vec<BenchmarkResult>,
    pub failures: Vec<FailedTarget>,
    /// CI records, present only when requested
    #[serde(rename = "ciStats", default, skip_serializing_if = "Vec::is_empty")]
    pub ci_stats: Vec<CiStats>,
}

impl BenchmarkReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    pub fn push_failure(&mut self, package: &str, error: impl std::fmt::Display) {
        self.failures.push(FailedTarget {
            package: package.to_string(),
            error: error.to_string(),
        });
    }

    pub fn push_ci_stats(&mut self, stats: CiStats) {
        self.ci_stats.push(stats);
    }

    /// Fastest target by ops/sec
    pub fn fastest(&self) -> Option<&BenchmarkResult> {
        self.results.iter().max_by(|a, b| {
            a.ssr_ops_per_sec
                .partial_cmp(&b.ssr_ops_per_sec)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Print the report as an ASCII table
    pub fn print_table(&self) {
        println!();
        println!("╔══════════════════════════════════════════════════════════════════════════════════╗");
        println!("║                             SSR BENCHMARK RESULTS                                ║");
        println!("╚══════════════════════════════════════════════════════════════════════════════════╝");
        println!();
        println!("┌──────────────────────┬────────────┬──────────────┬─────────┬────────────┬─────────┐");
        println!("│ Framework            │   ops/sec  │ avg lat (ms) │ samples │ body (KB)  │  dup x  │");
        println!("├──────────────────────┼────────────┼──────────────┼─────────┼────────────┼─────────┤");

        for result in &self.results {
            println!(
                "│ {:<20} │ {:>10.1} │ {:>12.3} │ {:>7} │ {:>10.2} │ {:>6.2}{} │",
                truncate(&result.display_name, 20),
                result.ssr_ops_per_sec,
                result.ssr_avg_latency_ms,
                result.ssr_samples,
                result.ssr_body_size_kb,
                result.ssr_duplication_factor,
                if result.is_duplicated() { "!" } else { " " }
            );
        }

        println!("└──────────────────────┴────────────┴──────────────┴─────────┴────────────┴─────────┘");
        println!();

        if let Some(fastest) = self.fastest() {
            println!(
                "Fastest: {} ({:.1} ops/sec)",
                fastest.display_name, fastest.ssr_ops_per_sec
            );
        }

        for failure in &self.failures {
            println!("Failed: {} ({})", failure.package, failure.error);
        }
        println!();
    }

    /// Export the report as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).chain(std::iter::once('…')).collect()
    }
}
