// src/serve/server.rs

//! Static file server over the output directory with live reload.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use axum::Router;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tower::ServiceExt;
use tower_http::services::ServeDir;
use tracing::{debug, info};

use crate::serve::reload::ReloadHub;

/// Server-Sent Events stream of reload notifications.
pub const LIVERELOAD_PATH: &str = "/__assetdag/livereload";
/// Browser client for [`LIVERELOAD_PATH`].
pub const CLIENT_PATH: &str = "/__assetdag/livereload.js";

const CLIENT_JS: &str = r#"(function () {
  var source = new EventSource("/__assetdag/livereload");
  source.onmessage = function (event) {
    if (event.data === "css") {
      document.querySelectorAll('link[rel="stylesheet"]').forEach(function (link) {
        var url = new URL(link.href);
        url.searchParams.set("assetdag", Date.now());
        link.href = url.toString();
      });
    } else {
      window.location.reload();
    }
  };
})();
"#;

const CLIENT_TAG: &str = "<script src=\"/__assetdag/livereload.js\"></script>";

#[derive(Debug, Clone)]
struct AppState {
    root: PathBuf,
    hub: ReloadHub,
}

/// Routes: live-reload stream, client script, and files under `root` with
/// the client injected into HTML.
pub fn router(root: PathBuf, hub: ReloadHub) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(events))
        .route(CLIENT_PATH, get(client_script))
        .fallback(static_file)
        .with_state(AppState { root, hub })
}

async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    debug!("live-reload client connected");
    let stream = BroadcastStream::new(state.hub.subscribe()).filter_map(|msg| {
        msg.ok()
            .map(|kind| Ok::<_, Infallible>(Event::default().data(kind.as_event_data())))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn client_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        CLIENT_JS,
    )
}

async fn static_file(State(state): State<AppState>, req: Request) -> Response {
    let Some(rel) = safe_relative(req.uri().path()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let mut path = state.root.join(&rel);
    if path.is_dir() {
        path.push("index.html");
    }

    if is_html(&path) {
        if let Ok(html) = tokio::fs::read_to_string(&path).await {
            return (
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                inject_client(&html),
            )
                .into_response();
        }
    }

    match ServeDir::new(&state.root).oneshot(req).await {
        Ok(res) => res.into_response(),
        Err(never) => match never {},
    }
}

/// Percent-decoded request path as a relative filesystem path; `None` for
/// anything that would escape the served root or is not valid UTF-8.
pub fn safe_relative(uri_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(uri_path).ok()?;
    let rel = Path::new(decoded.trim_start_matches('/'));
    let mut out = PathBuf::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(out)
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

/// Insert the live-reload client before `</body>`, or append it.
pub fn inject_client(html: &str) -> String {
    match html.to_ascii_lowercase().rfind("</body>") {
        Some(idx) => format!("{}{CLIENT_TAG}\n{}", &html[..idx], &html[idx..]),
        None => format!("{html}\n{CLIENT_TAG}\n"),
    }
}

/// A bound, running HTTP server.
#[derive(Debug)]
pub struct RunningServer {
    pub addr: SocketAddr,
    handle: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    /// Bind `host:port` (port 0 picks a free port) and start serving.
    pub async fn bind(host: &str, port: u16, root: PathBuf, hub: ReloadHub) -> Result<Self> {
        let listener = TcpListener::bind((host, port))
            .await
            .with_context(|| format!("binding {host}:{port}"))?;
        let addr = listener.local_addr().context("reading bound address")?;
        let app = router(root, hub);

        let handle = tokio::spawn(async move { axum::serve(listener, app).await });
        info!(%addr, "http server listening");
        Ok(Self { addr, handle })
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Wait for the server to stop. It only stops on error.
    pub async fn wait(self) -> Result<()> {
        match self.handle.await {
            Ok(Ok(())) => bail!("http server stopped"),
            Ok(Err(err)) => Err(err).context("http server failed"),
            Err(err) => Err(err).context("http server task panicked"),
        }
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}
