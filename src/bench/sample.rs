//! Single handler invocation against a fresh mock transport.

use bytes::Bytes;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout_at;

use super::handler::Handler;
use super::transport::{MockTransport, ProtocolViolation};
use crate::error::SampleError;

/// One completed invocation
#[derive(Debug, Clone)]
pub struct SampleRecord {
    /// Monotonic time from dispatch to completion
    pub latency: Duration,
    /// HTTP status the handler reported
    pub status: u16,
    /// Concatenated response body
    pub body: Bytes,
    /// Non-fatal protocol anomalies seen during the sample
    pub violations: Vec<ProtocolViolation>,
}

impl SampleRecord {
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.0
    }

    pub fn body_len(&self) -> usize {
        self.body.len()
    }
}

/// Runs one sample at a time with a per-sample timeout
pub struct SampleRunner {
    handler: Arc<dyn Handler>,
    timeout: Duration,
}

impl SampleRunner {
    pub fn new(handler: Arc<dyn Handler>, timeout: Duration) -> Self {
        Self { handler, timeout }
    }

    /// Invoke the handler once and wait for it to end the response.
    ///
    /// Once the response ends, the handler is still awaited for whatever is
    /// left of the sample budget, so anomalies it produces after `end()`
    /// (a second `end()`, a late write) land on the record.
    pub async fn run(&self) -> Result<SampleRecord, SampleError> {
        let (request, response, mut completion) = MockTransport::new().into_parts();

        let start = Instant::now();
        let deadline = tokio::time::Instant::now() + self.timeout;
        // Spawned so an expired sample can be abandoned without blocking the loop
        let mut task = tokio::spawn(self.handler.handle(request, response.clone()));

        let wait = async {
            let mut handler_returned = false;
            loop {
                tokio::select! {
                    biased;
                    completed = completion.receiver() => {
                        return completed
                            .map(|at| (at, handler_returned))
                            .map_err(|_| {
                                SampleError::Handler("response dropped before completion".to_string())
                            });
                    }
                    joined = &mut task, if !handler_returned => {
                        handler_returned = true;
                        match joined {
                            // Completion may still arrive from work the handler spawned
                            Ok(Ok(())) => continue,
                            Ok(Err(e)) => return Err(SampleError::Handler(format!("{:#}", e))),
                            Err(e) => return Err(SampleError::Panicked(e.to_string())),
                        }
                    }
                }
            }
        };

        let (completed_at, handler_returned) = match timeout_at(deadline, wait).await {
            Ok(Ok(done)) => done,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(SampleError::Timeout(self.timeout)),
        };

        if !handler_returned {
            match timeout_at(deadline, &mut task).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => return Err(SampleError::Handler(format!("{:#}", e))),
                Ok(Err(e)) => return Err(SampleError::Panicked(e.to_string())),
                Err(_) => {
                    tracing::debug!("Handler still running after end(), detaching it");
                }
            }
        }

        let violations = response.violations();
        if let Some(fatal) = violations.iter().find(|v| v.is_fatal()) {
            return Err(SampleError::Protocol(fatal.to_string()));
        }

        let record = SampleRecord {
            latency: completed_at.saturating_duration_since(start),
            status: response.status().as_u16(),
            body: response.body(),
            violations,
        };

        tracing::debug!(
            "Sample completed in {:.3}ms ({} bytes, status {})",
            record.latency_ms(),
            record.body_len(),
            record.status
        );

        Ok(record)
    }
}
