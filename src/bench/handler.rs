//! Handler and adapter interfaces between the engine and framework code.

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;

use super::transport::{MockRequest, MockResponse};

/// Future returned by a handler invocation
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A framework entry point that renders a response for a request.
///
/// The returned future finishing is not what ends a sample: the handler must
/// eventually call [`MockResponse::end`], either before its future resolves or
/// later from work it spawned.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: MockRequest, response: MockResponse) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(MockRequest, MockResponse) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handle(&self, request: MockRequest, response: MockResponse) -> HandlerFuture {
        Box::pin(self(request, response))
    }
}

/// Wrap a closure as a shared handler
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn Handler>
where
    F: Fn(MockRequest, MockResponse) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(f)
}

/// Produces a handler for one framework build
pub trait Adapter: Send + Sync {
    fn build(&self) -> BoxFuture<'_, anyhow::Result<Arc<dyn Handler>>>;
}

/// Adapter over a handler that already exists
pub struct StaticAdapter {
    handler: Arc<dyn Handler>,
}

impl StaticAdapter {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }
}

impl Adapter for StaticAdapter {
    fn build(&self) -> BoxFuture<'_, anyhow::Result<Arc<dyn Handler>>> {
        let handler = Arc::clone(&self.handler);
        Box::pin(async move { Ok::<_, anyhow::Error>(handler) })
    }
}

/// A framework under test
#[derive(Clone)]
pub struct BenchmarkTarget {
    /// Logical name, e.g. `astro-ssr`
    pub name: String,
    /// Human-readable name, e.g. `Astro SSR`
    pub display_name: String,
    /// Package identifier, e.g. `app-astro`
    pub package: String,
    pub handler: Arc<dyn Handler>,
}

impl BenchmarkTarget {
    pub fn new(
        name: impl Into<String>,
        display_name: impl Into<String>,
        package: impl Into<String>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            package: package.into(),
            handler,
        }
    }
}

impl std::fmt::Debug for BenchmarkTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BenchmarkTarget")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("package", &self.package)
            .finish_non_exhaustive()
    }
}
