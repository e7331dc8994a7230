//! Configuration structs for benchmarking.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of measured samples
pub const DEFAULT_SAMPLE_COUNT: usize = 100;
/// Default number of discarded warm-up samples
pub const DEFAULT_WARMUP_SAMPLES: usize = 10;
/// Default per-sample timeout in milliseconds
pub const DEFAULT_SAMPLE_TIMEOUT_MS: u64 = 10_000;
/// Default minimum repeat width for duplication detection
pub const DEFAULT_MIN_REPEAT_WIDTH: usize = 64;

/// Configuration for a benchmark run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Measurement phase size
    pub sample_count: usize,
    /// Warm-up invocations before measuring
    pub warmup_samples: usize,
    /// Per-sample timeout in milliseconds
    pub sample_timeout_ms: u64,
    /// Smallest repeating unit (bytes) the integrity analyzer will accept
    pub min_repeat_width: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            sample_count: DEFAULT_SAMPLE_COUNT,
            warmup_samples: DEFAULT_WARMUP_SAMPLES,
            sample_timeout_ms: DEFAULT_SAMPLE_TIMEOUT_MS,
            min_repeat_width: DEFAULT_MIN_REPEAT_WIDTH,
        }
    }
}

impl BenchmarkConfig {
    /// Per-sample timeout as a `Duration`
    pub fn sample_timeout(&self) -> Duration {
        Duration::from_millis(self.sample_timeout_ms)
    }

    /// Check the values the engine cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_count == 0 {
            return Err("sample_count must be at least 1".to_string());
        }
        if self.sample_timeout_ms == 0 {
            return Err("sample_timeout_ms must be greater than 0".to_string());
        }
        if self.min_repeat_width == 0 {
            return Err("min_repeat_width must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.sample_count, 100);
        assert_eq!(config.warmup_samples, 10);
        assert_eq!(config.sample_timeout(), Duration::from_secs(10));
        assert_eq!(config.min_repeat_width, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = BenchmarkConfig {
            sample_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BenchmarkConfig {
            sample_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BenchmarkConfig {
            min_repeat_width: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_warmup_is_allowed() {
        let config = BenchmarkConfig {
            warmup_samples: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
