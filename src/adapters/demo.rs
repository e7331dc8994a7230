//! Small axum apps used as built-in benchmark targets.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use std::convert::Infallible;

const ITEMS: &[(&str, &str)] = &[
    ("Routing", "File-based routes resolved at build time"),
    ("Rendering", "Components rendered to HTML on every request"),
    ("Hydration", "Interactive islands picked up by the client bundle"),
    ("Data", "Loaders run before the page template is filled"),
    ("Assets", "Hashed static files served from the build output"),
];

fn page_head(title: &str) -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{title}</title><link rel=\"stylesheet\" href=\"/assets/app.css\"></head><body>"
    )
}

fn page_section(index: usize, name: &str, description: &str) -> String {
    format!(
        "<section id=\"feature-{index}\"><h2>{name}</h2><p>{description}</p></section>"
    )
}

const PAGE_TAIL: &str = "<footer>Rendered on the server</footer></body></html>";

/// Full home page markup
pub fn render_home_page(title: &str) -> String {
    let mut html = page_head(title);
    html.push_str(&format!("<main><h1>{title}</h1>"));
    for (i, (name, description)) in ITEMS.iter().enumerate() {
        html.push_str(&page_section(i, name, description));
    }
    html.push_str("</main>");
    html.push_str(PAGE_TAIL);
    html
}

/// Page rendered in one piece
pub fn static_app() -> Router {
    Router::new().route("/", get(|| async { Html(render_home_page("Axum Static")) }))
}

async fn streamed_page() -> Response {
    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Bytes::from(page_head("Axum Streaming")));
        yield Ok(Bytes::from("<main><h1>Axum Streaming</h1>"));
        for (i, (name, description)) in ITEMS.iter().enumerate() {
            tokio::task::yield_now().await;
            yield Ok(Bytes::from(page_section(i, name, description)));
        }
        yield Ok(Bytes::from_static(b"</main>"));
        yield Ok(Bytes::from_static(PAGE_TAIL.as_bytes()));
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Body::from_stream(stream),
    )
        .into_response()
}

/// Page streamed section by section
pub fn streaming_app() -> Router {
    Router::new().route("/", get(streamed_page))
}

/// Page whose document is serialized twice into the same body
pub fn double_render_app() -> Router {
    Router::new().route(
        "/",
        get(|| async {
            let page = render_home_page("Axum Double Render");
            Html(format!("{page}{page}"))
        }),
    )
}
