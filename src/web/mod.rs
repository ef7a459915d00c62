//! Embedded web dashboard for offerdash.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard (offer library, Kanban board, analytics, AI
//!   mentor, settings)
//! - JSON API endpoints for offers, board moves, analytics, CSV, spy, chat
//!   and config management
//!
//! Launched via `offerdash web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::{Cursor, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

pub use api::{ApiError, ApiResponse, Body};

use crate::activity::{ActivityLog, AuditedStore};
use crate::config::{self, OfferdashConfig};
use crate::offers::store::{JsonFileStore, OfferStore};

/// Largest accepted request body (CSV imports included).
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// Everything a request handler can reach.
pub struct WebState {
    pub store: Box<dyn OfferStore>,
    pub config: OfferdashConfig,
    /// File written by `PUT /api/config`. `None` disables config edits.
    pub config_file: Option<PathBuf>,
    /// Layers re-read after a config edit.
    pub config_layers: Vec<Option<PathBuf>>,
    pub activity: ActivityLog,
}

impl WebState {
    /// State backed by the on-disk store under the configured data dir.
    pub fn from_config(config: OfferdashConfig) -> Self {
        let data_dir = config.general.data_dir_path();
        let activity = if config.logging.activity_log {
            ActivityLog::in_dir(&data_dir)
        } else {
            ActivityLog::disabled()
        };
        Self {
            store: Box::new(AuditedStore::new(
                JsonFileStore::in_dir(&data_dir),
                activity.clone(),
            )),
            config,
            config_file: config::global_config_file(),
            config_layers: config::default_layers(),
            activity,
        }
    }

    /// State over an arbitrary store with config edits disabled.
    pub fn with_store(store: impl OfferStore + 'static, config: OfferdashConfig) -> Self {
        Self {
            store: Box::new(store),
            config,
            config_file: None,
            config_layers: Vec::new(),
            activity: ActivityLog::disabled(),
        }
    }

    /// Re-read the config layers after an edit. The store keeps its data dir.
    pub(crate) fn reload_config(&mut self) {
        self.config = config::load_layers(&self.config_layers);
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread. Buffered responses are handled sequentially
/// (sufficient for a local single-user dashboard); streamed chat replies are
/// written from their own thread so the dashboard stays responsive.
pub fn serve(mut state: WebState, addr: &str, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("offerdash dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");
    info!(%addr, "dashboard started");

    if open {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            warn!(error = %e, "could not open browser");
        }
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let declared = request.body_length();
            read_body(request.as_reader(), declared, MAX_BODY_BYTES)
        } else {
            Ok(Vec::new())
        };

        let resp = match body {
            Ok(body) => dispatch(&mut state, &method, &url, &body),
            Err(e) => {
                warn!(%method, %url, status = e.status, error = %e.message, "rejected request body");
                e.into_response()
            }
        };
        let status = resp.status;
        respond(request, resp);

        debug!(%method, %url, status, "request handled");
    }

    Ok(())
}

/// Read a whole request body of at most `limit` bytes.
///
/// A body over the limit is a 413 and is never handed on in part; a read
/// error is a 400.
pub fn read_body(
    reader: impl Read,
    declared: Option<usize>,
    limit: u64,
) -> Result<Vec<u8>, ApiError> {
    if declared.is_some_and(|len| len as u64 > limit) {
        return Err(ApiError::payload_too_large(limit));
    }
    let mut buf = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ApiError::bad_request(format!("failed to read request body: {e}")))?;
    if buf.len() as u64 > limit {
        return Err(ApiError::payload_too_large(limit));
    }
    Ok(buf)
}

/// Hand a response to `tiny_http`.
fn respond(request: Request, resp: ApiResponse) {
    let mut headers = vec![header("Content-Type", resp.content_type)];
    headers.extend(resp.headers.iter().map(|(k, v)| header(k, v)));
    let headers: Vec<Header> = headers.into_iter().flatten().collect();

    match resp.body {
        Body::Bytes(bytes) => {
            let len = bytes.len();
            let response = Response::new(
                StatusCode(resp.status),
                headers,
                Cursor::new(bytes),
                Some(len),
                None,
            );
            if let Err(e) = request.respond(response) {
                debug!(error = %e, "client went away");
            }
        }
        Body::Stream(reader) => {
            // No length: tiny_http switches to chunked transfer encoding.
            // One detached writer per open chat; a local single-user
            // dashboard keeps that count small.
            let response = Response::new(StatusCode(resp.status), headers, reader, None, None);
            std::thread::spawn(move || {
                if let Err(e) = request.respond(response) {
                    debug!(error = %e, "stream aborted");
                }
            });
        }
    }
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch a request to its handler and render failures as JSON errors.
pub fn dispatch(state: &mut WebState, method: &Method, url: &str, body: &[u8]) -> ApiResponse {
    match route(state, method, url, body) {
        Ok(resp) => resp,
        Err(e) => {
            if e.status >= 500 {
                warn!(%method, %url, status = e.status, error = %e.message, "request failed");
            }
            e.into_response()
        }
    }
}

fn route(state: &mut WebState, method: &Method, url: &str, body: &[u8]) -> api::ApiResult {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    if let Some(id) = path.strip_prefix("/api/offers/")
        && !id.is_empty()
        && !id.contains('/')
    {
        return match method {
            Method::Get => api::get_offer(state, id),
            Method::Put => api::update_offer(state, id, body),
            Method::Delete => api::delete_offer(state, id),
            _ => Err(method_not_allowed()),
        };
    }

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: offers
        (&Method::Get, "/api/offers") => api::list_offers(state, url),
        (&Method::Post, "/api/offers") => api::create_offer(state, body),

        // API: board
        (&Method::Get, "/api/board") => api::get_board(state),
        (&Method::Post, "/api/board/move") => api::move_offer(state, body),

        // API: analytics
        (&Method::Get, "/api/analytics") => api::get_analytics(state, url),
        (&Method::Get, "/api/roi") => api::get_roi(url),

        // API: CSV
        (&Method::Get, "/api/export.csv") => api::export_csv(state),
        (&Method::Post, "/api/import") => api::import_csv(state, body),

        // API: tools
        (&Method::Post, "/api/spy") => api::post_spy(state, body),
        (&Method::Post, "/api/chat") => api::post_chat(state, body),

        // API: configuration
        (&Method::Get, "/api/config") => api::get_config(state),
        (&Method::Put, "/api/config") => api::put_config(state, body),
        (&Method::Post, "/api/config/reset") => api::post_config_reset(state),

        // API: health
        (&Method::Get, "/api/health") => api::get_health(state),
        (&Method::Get, "/api/activity") => api::get_activity(state, url),

        _ => Err(ApiError::not_found("not found")),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> ApiResponse {
    ApiResponse::bytes(
        200,
        "text/html; charset=utf-8",
        frontend::INDEX_HTML.as_bytes().to_vec(),
    )
}

fn method_not_allowed() -> ApiError {
    ApiError {
        status: 405,
        message: "method not allowed".to_string(),
    }
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offers::store::MemoryStore;

    fn state() -> WebState {
        WebState::with_store(MemoryStore::new(), OfferdashConfig::default())
    }

    #[test]
    fn serves_frontend() {
        let resp = dispatch(&mut state(), &Method::Get, "/", &[]);
        assert_eq!(resp.status, 200);
        assert!(resp.content_type.starts_with("text/html"));
    }

    #[test]
    fn unknown_route_is_json_404() {
        let resp = dispatch(&mut state(), &Method::Get, "/api/nope", &[]);
        assert_eq!(resp.status, 404);
        assert_eq!(resp.json().unwrap()["error"], "not found");
    }

    #[test]
    fn wrong_method_on_offer_is_405() {
        let resp = dispatch(&mut state(), &Method::Post, "/api/offers/abc", &[]);
        assert_eq!(resp.status, 405);
    }

    #[test]
    fn config_edits_disabled_without_file() {
        let body = br#"{"updates":[{"key":"web.addr","value":"x"}]}"#;
        let resp = dispatch(&mut state(), &Method::Put, "/api/config", body);
        assert_eq!(resp.status, 400);
    }
}
