//! In-process SSR benchmarking engine.
//!
//! This module provides:
//! - Mock HTTP transport captured entirely in memory
//! - Per-sample runner with timeout and failure classification
//! - Sequential warm-up and measurement loop
//! - Duplicated-output detection and result aggregation

pub mod config;
pub mod handler;
pub mod integrity;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod sample;
pub mod transport;

pub use config::BenchmarkConfig;
pub use handler::{handler_fn, Adapter, BenchmarkTarget, Handler};
pub use integrity::IntegrityAnalyzer;
pub use metrics::StatisticsAggregator;
pub use report::{BenchmarkReport, BenchmarkResult};
pub use runner::{BenchmarkLoop, Phase, RunOutcome};
pub use sample::{SampleRecord, SampleRunner};
pub use transport::{MockRequest, MockResponse, MockTransport, ProtocolViolation};
