// Error handling module
// Defines transport, per-sample and run-level error types

use std::time::Duration;
use thiserror::Error;

/// Errors returned to a handler when it misuses the mock response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Status or header written after the first body chunk
    #[error("Headers already sent")]
    HeadersAlreadySent,

    /// Body chunk written after completion was signaled
    #[error("Write after end")]
    WriteAfterEnd,

    /// Header name or value that is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Status code outside 100-999
    #[error("Invalid status code: {0}")]
    InvalidStatus(u16),
}

/// Reasons a single sample did not produce a usable record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    /// Handler did not signal completion in time
    #[error("Sample timed out after {0:?}")]
    Timeout(Duration),

    /// Handler returned an error
    #[error("Handler error: {0}")]
    Handler(String),

    /// Handler task panicked
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// Response completed in a malformed state
    #[error("Protocol violation: {0}")]
    Protocol(String),
}

impl SampleError {
    /// Short label used when tallying failures
    pub fn kind(&self) -> &'static str {
        match self {
            SampleError::Timeout(_) => "timeout",
            SampleError::Handler(_) => "handler",
            SampleError::Panicked(_) => "panic",
            SampleError::Protocol(_) => "protocol",
        }
    }
}

/// Run-level errors surfaced to the caller
#[derive(Error, Debug)]
pub enum BenchError {
    /// Every measurement sample failed
    #[error("All {attempted} samples failed for {target} (last error: {last_error})")]
    AllSamplesFailed {
        target: String,
        attempted: usize,
        last_error: SampleError,
    },

    /// Aggregation reached with no successful samples
    #[error("No successful samples to aggregate")]
    NoSamples,

    /// Statistics came out NaN or infinite
    #[error("Non-finite statistic: {0}")]
    NonFinite(&'static str),

    /// Package not present in the registry
    #[error("Unknown SSR package: {package}. Available: {}", .available.join(", "))]
    UnknownPackage {
        package: String,
        available: Vec<String>,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Adapter failed to produce a handler
    #[error("Adapter error: {0}")]
    Adapter(#[from] anyhow::Error),
}

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_messages() {
        assert_eq!(
            TransportError::HeadersAlreadySent.to_string(),
            "Headers already sent"
        );
        assert_eq!(TransportError::WriteAfterEnd.to_string(), "Write after end");
        assert_eq!(
            TransportError::InvalidStatus(42).to_string(),
            "Invalid status code: 42"
        );
    }

    #[test]
    fn test_sample_error_kind() {
        assert_eq!(SampleError::Timeout(Duration::from_millis(5)).kind(), "timeout");
        assert_eq!(SampleError::Handler("boom".into()).kind(), "handler");
        assert_eq!(SampleError::Panicked("boom".into()).kind(), "panic");
        assert_eq!(SampleError::Protocol("empty".into()).kind(), "protocol");
    }

    #[test]
    fn test_unknown_package_lists_available() {
        let err = BenchError::UnknownPackage {
            package: "app-foo".to_string(),
            available: vec!["app-a".to_string(), "app-b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unknown SSR package: app-foo. Available: app-a, app-b"
        );
    }

    #[test]
    fn test_all_samples_failed_message() {
        let err = BenchError::AllSamplesFailed {
            target: "demo".to_string(),
            attempted: 3,
            last_error: SampleError::Handler("boom".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "All 3 samples failed for demo (last error: Handler error: boom)"
        );
    }

    #[test]
    fn test_adapter_error_from_anyhow() {
        let err: BenchError = anyhow::anyhow!("missing build").into();
        assert_eq!(err.to_string(), "Adapter error: missing build");
    }
}
