//! In-memory HTTP exchange handed to the handler under test.
//!
//! A [`MockTransport`] is built fresh for every sample. The handler receives a
//! [`MockRequest`] describing a canonical home-page `GET` and a [`MockResponse`]
//! that records status, headers and body chunks until the handler calls
//! [`MockResponse::end`]. Nothing here touches the network.

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use bytes::{Bytes, BytesMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::oneshot;

use crate::error::TransportError;

/// Synthetic inbound request
#[derive(Debug, Clone)]
pub struct MockRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
}

impl MockRequest {
    /// The canonical home page request every sample uses
    pub fn home_page() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("ssr-bench"));
        headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));

        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value as a string slice
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Misuse of the response contract observed during a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// `end` called more than once
    DoubleEnd,
    /// Completed without any status, header or body ever written
    HeadersNeverWritten,
    /// Status or header set after the first body chunk
    HeadersAfterBody,
    /// Body chunk written after completion
    WriteAfterEnd,
}

impl ProtocolViolation {
    /// Whether this violation makes the sample unusable
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProtocolViolation::HeadersNeverWritten)
    }
}

impl std::fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolViolation::DoubleEnd => write!(f, "end called twice"),
            ProtocolViolation::HeadersNeverWritten => {
                write!(f, "response completed without headers")
            }
            ProtocolViolation::HeadersAfterBody => write!(f, "headers set after body"),
            ProtocolViolation::WriteAfterEnd => write!(f, "write after end"),
        }
    }
}

struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    chunks: Vec<Bytes>,
    /// Any status, header or body activity
    headers_written: bool,
    /// Flushed by the first body chunk; headers are frozen afterwards
    headers_sent: bool,
    completed_at: Option<Instant>,
    violations: Vec<ProtocolViolation>,
    completion_tx: Option<oneshot::Sender<Instant>>,
}

/// Synthetic outbound response
///
/// Cloning yields another handle to the same response, so a handler may move
/// it into a spawned task and finish from there.
#[derive(Clone)]
pub struct MockResponse {
    state: Arc<Mutex<ResponseState>>,
}

impl std::fmt::Debug for MockResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("MockResponse")
            .field("status", &state.status)
            .field("chunks", &state.chunks.len())
            .field("completed", &state.completed_at.is_some())
            .finish()
    }
}

impl MockResponse {
    fn new(completion_tx: oneshot::Sender<Instant>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResponseState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                chunks: Vec::new(),
                headers_written: false,
                headers_sent: false,
                completed_at: None,
                violations: Vec::new(),
                completion_tx: Some(completion_tx),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ResponseState> {
        // No user code runs under this lock, so a poisoned guard is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the status code
    pub fn set_status(&self, status: u16) -> Result<(), TransportError> {
        let status =
            StatusCode::from_u16(status).map_err(|_| TransportError::InvalidStatus(status))?;
        let mut state = self.state();
        check_headers_open(&mut state)?;
        state.status = status;
        state.headers_written = true;
        Ok(())
    }

    /// Set (replace) a response header
    pub fn set_header(&self, name: &str, value: &str) -> Result<(), TransportError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidHeader(name.to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::InvalidHeader(format!("{}: {}", name, value)))?;
        self.insert_header(name, value)
    }

    /// Set a header from already-typed parts
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) -> Result<(), TransportError> {
        let mut state = self.state();
        check_headers_open(&mut state)?;
        state.headers.insert(name, value);
        state.headers_written = true;
        Ok(())
    }

    /// Write status and headers in one call
    pub fn write_head(&self, status: u16, headers: &HeaderMap) -> Result<(), TransportError> {
        let status =
            StatusCode::from_u16(status).map_err(|_| TransportError::InvalidStatus(status))?;
        let mut state = self.state();
        check_headers_open(&mut state)?;
        state.status = status;
        for (name, value) in headers {
            state.headers.append(name.clone(), value.clone());
        }
        state.headers_written = true;
        Ok(())
    }

    /// Append a body chunk
    pub fn write(&self, chunk: impl Into<Bytes>) -> Result<(), TransportError> {
        let chunk = chunk.into();
        let mut state = self.state();
        if state.completed_at.is_some() {
            tracing::warn!("Handler wrote {} bytes after end", chunk.len());
            state.violations.push(ProtocolViolation::WriteAfterEnd);
            return Err(TransportError::WriteAfterEnd);
        }
        state.headers_written = true;
        state.headers_sent = true;
        if !chunk.is_empty() {
            state.chunks.push(chunk);
        }
        Ok(())
    }

    /// Write a final chunk and signal completion
    pub fn end_with(&self, chunk: impl Into<Bytes>) -> Result<(), TransportError> {
        self.write(chunk)?;
        self.end();
        Ok(())
    }

    /// Signal completion
    ///
    /// Completion is one-way. A second call changes nothing but is recorded as
    /// a [`ProtocolViolation::DoubleEnd`].
    pub fn end(&self) {
        let now = Instant::now();
        let mut state = self.state();

        if state.completed_at.is_some() {
            tracing::warn!("Protocol anomaly: handler called end twice");
            state.violations.push(ProtocolViolation::DoubleEnd);
            return;
        }

        if !state.headers_written {
            tracing::warn!("Protocol anomaly: response ended without headers");
            state.violations.push(ProtocolViolation::HeadersNeverWritten);
        }

        state.headers_sent = true;
        state.completed_at = Some(now);
        if let Some(tx) = state.completion_tx.take() {
            let _ = tx.send(now);
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state().completed_at.is_some()
    }

    pub fn headers_sent(&self) -> bool {
        self.state().headers_sent
    }

    pub fn status(&self) -> StatusCode {
        self.state().status
    }

    pub fn headers(&self) -> HeaderMap {
        self.state().headers.clone()
    }

    /// Get a header value as an owned string
    pub fn header(&self, name: &str) -> Option<String> {
        self.state()
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn chunk_count(&self) -> usize {
        self.state().chunks.len()
    }

    /// Total bytes written so far
    pub fn body_len(&self) -> usize {
        self.state().chunks.iter().map(Bytes::len).sum()
    }

    /// Concatenated body
    pub fn body(&self) -> Bytes {
        let state = self.state();
        match state.chunks.as_slice() {
            [] => Bytes::new(),
            [single] => single.clone(),
            chunks => {
                let mut buf = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
                for chunk in chunks {
                    buf.extend_from_slice(chunk);
                }
                buf.freeze()
            }
        }
    }

    pub fn violations(&self) -> Vec<ProtocolViolation> {
        self.state().violations.clone()
    }
}

fn check_headers_open(state: &mut ResponseState) -> Result<(), TransportError> {
    if state.headers_sent {
        tracing::warn!("Handler tried to modify headers after they were sent");
        state.violations.push(ProtocolViolation::HeadersAfterBody);
        return Err(TransportError::HeadersAlreadySent);
    }
    Ok(())
}

/// Resolves when the paired response is ended
pub struct Completion {
    rx: oneshot::Receiver<Instant>,
}

impl Completion {
    pub(crate) fn receiver(&mut self) -> &mut oneshot::Receiver<Instant> {
        &mut self.rx
    }
}

/// One emulated request/response exchange
pub struct MockTransport {
    request: MockRequest,
    response: MockResponse,
    completion: Completion,
}

impl MockTransport {
    /// Build a fresh exchange for the canonical home page request
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            request: MockRequest::home_page(),
            response: MockResponse::new(tx),
            completion: Completion { rx },
        }
    }

    pub fn request(&self) -> &MockRequest {
        &self.request
    }

    pub fn response(&self) -> &MockResponse {
        &self.response
    }

    pub fn into_parts(self) -> (MockRequest, MockResponse, Completion) {
        (self.request, self.response, self.completion)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_page_request() {
        let request = MockRequest::home_page();
        assert_eq!(request.method(), Method::GET);
        assert_eq!(request.path(), "/");
        assert_eq!(request.header("accept"), Some("text/html"));
        assert_eq!(request.header("host"), Some("localhost"));
    }

    #[test]
    fn test_response_defaults() {
        let transport = MockTransport::new();
        let response = transport.response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.is_completed());
        assert!(!response.headers_sent());
        assert_eq!(response.body_len(), 0);
        assert!(response.violations().is_empty());
    }

    #[test]
    fn test_write_and_end() {
        let transport = MockTransport::new();
        let response = transport.response();

        response.set_status(201).unwrap();
        response.set_header("content-type", "text/html").unwrap();
        response.write("<html>").unwrap();
        response.end_with("</html>").unwrap();

        assert!(response.is_completed());
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.header("content-type").as_deref(), Some("text/html"));
        assert_eq!(response.chunk_count(), 2);
        assert_eq!(response.body(), Bytes::from_static(b"<html></html>"));
        assert!(response.violations().is_empty());
    }

    #[test]
    fn test_headers_frozen_after_first_chunk() {
        let transport = MockTransport::new();
        let response = transport.response();

        response.write("body").unwrap();
        assert_eq!(
            response.set_header("x-late", "1"),
            Err(TransportError::HeadersAlreadySent)
        );
        assert_eq!(response.set_status(500), Err(TransportError::HeadersAlreadySent));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.violations(),
            vec![
                ProtocolViolation::HeadersAfterBody,
                ProtocolViolation::HeadersAfterBody
            ]
        );
    }

    #[test]
    fn test_headers_can_be_rewritten_before_body() {
        let transport = MockTransport::new();
        let response = transport.response();

        response.set_header("x-a", "1").unwrap();
        response.set_header("x-a", "2").unwrap();
        response.set_status(404).unwrap();
        response.set_status(200).unwrap();

        assert_eq!(response.header("x-a").as_deref(), Some("2"));
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.violations().is_empty());
    }

    #[test]
    fn test_write_after_end_rejected() {
        let transport = MockTransport::new();
        let response = transport.response();

        response.end_with("done").unwrap();
        assert_eq!(response.write("more"), Err(TransportError::WriteAfterEnd));
        assert_eq!(response.body(), Bytes::from_static(b"done"));
        assert_eq!(response.violations(), vec![ProtocolViolation::WriteAfterEnd]);
    }

    #[test]
    fn test_double_end_is_idempotent() {
        let transport = MockTransport::new();
        let response = transport.response();

        response.write("x").unwrap();
        response.end();
        response.end();

        assert!(response.is_completed());
        assert_eq!(response.violations(), vec![ProtocolViolation::DoubleEnd]);
        assert!(!ProtocolViolation::DoubleEnd.is_fatal());
    }

    #[test]
    fn test_end_without_headers_is_fatal() {
        let transport = MockTransport::new();
        let response = transport.response();

        response.end();
        let violations = response.violations();
        assert_eq!(violations, vec![ProtocolViolation::HeadersNeverWritten]);
        assert!(violations[0].is_fatal());
    }

    #[test]
    fn test_invalid_header_and_status() {
        let transport = MockTransport::new();
        let response = transport.response();

        assert!(matches!(
            response.set_header("bad header", "x"),
            Err(TransportError::InvalidHeader(_))
        ));
        assert_eq!(response.set_status(42), Err(TransportError::InvalidStatus(42)));
    }

    #[test]
    fn test_write_head_appends_headers() {
        let transport = MockTransport::new();
        let response = transport.response();

        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
        response.write_head(302, &headers).unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);
    }

    #[tokio::test]
    async fn test_completion_carries_end_instant() {
        let transport = MockTransport::new();
        let (_request, response, mut completion) = transport.into_parts();

        let before = Instant::now();
        response.end_with("ok").unwrap();
        let completed_at = completion.receiver().await.unwrap();
        assert!(completed_at >= before);
    }

    #[test]
    fn test_clones_share_state() {
        let transport = MockTransport::new();
        let response = transport.response().clone();
        response.write("shared").unwrap();
        assert_eq!(transport.response().body_len(), 6);
    }
}
