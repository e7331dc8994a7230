//! Adapter that benchmarks any in-process tower service, such as an axum
//! `Router`, through the mock transport.

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::{Service, ServiceExt};

use crate::bench::handler::{handler_fn, Adapter, Handler};
use crate::bench::transport::{MockRequest, MockResponse};

/// Wrap a service as a handler.
///
/// Each invocation clones the service, replays the mock request into it, then
/// copies status, headers and every body frame onto the mock response before
/// ending it.
pub fn service_handler<S>(service: S) -> Arc<dyn Handler>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + Sync + 'static,
    S::Error: std::error::Error + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    handler_fn(move |req, res| {
        let service = service.clone();
        async move { forward(service, req, res).await }
    })
}

async fn forward<S>(service: S, req: MockRequest, res: MockResponse) -> anyhow::Result<()>
where
    S: Service<Request<Body>, Response = Response> + Send,
    S::Error: std::error::Error + Send + Sync + 'static,
    S::Future: Send,
{
    let mut builder = Request::builder()
        .method(req.method().clone())
        .uri(req.uri().clone());
    for (name, value) in req.headers() {
        builder = builder.header(name, value);
    }
    let request = builder.body(Body::empty())?;

    let response = service.oneshot(request).await?;
    let (parts, mut body) = response.into_parts();

    res.write_head(parts.status.as_u16(), &parts.headers)?;

    while let Some(frame) = body.frame().await {
        if let Ok(data) = frame?.into_data() {
            res.write(data)?;
        }
    }

    res.end();
    Ok(())
}

/// Builds a fresh `Router` for every benchmark run
pub struct RouterAdapter {
    build: Box<dyn Fn() -> Router + Send + Sync>,
}

impl RouterAdapter {
    pub fn new<F>(build: F) -> Self
    where
        F: Fn() -> Router + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
        }
    }
}

impl Adapter for RouterAdapter {
    fn build(&self) -> BoxFuture<'_, anyhow::Result<Arc<dyn Handler>>> {
        let router = (self.build)();
        Box::pin(async move { Ok::<_, anyhow::Error>(service_handler(router)) })
    }
}
