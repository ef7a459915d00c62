//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns an
//! [`ApiResponse`]; failures become an [`ApiError`] that the router renders
//! as `{"error": "..."}` with a matching status code.

use std::collections::HashMap;
use std::io::Read;

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::activity::ActivityEntry;
use crate::analytics::metrics::{RoiResult, roi_calculator};
use crate::analytics::period::{self, DateRange};
use crate::analytics::{self, AnalyticsQuery, offset_from_minutes};
use crate::chat::{HistoryItem, OpenRouterClient, UpstreamError};
use crate::config::{self, OfferdashConfig};
use crate::error::OfferError;
use crate::offers::board::{self, Board};
use crate::offers::csv_io::{self, ImportReport};
use crate::offers::store::OfferFilter;
use crate::offers::{NewOffer, OfferPatch, ScaleStatus};
use crate::spy;

use super::WebState;

// ---------------------------------------------------------------------------
// Response / error types
// ---------------------------------------------------------------------------

/// Response body: buffered bytes or a live stream.
pub enum Body {
    Bytes(Vec<u8>),
    Stream(Box<dyn Read + Send + 'static>),
}

/// Transport-independent response, converted to `tiny_http` at the edge.
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    /// Extra headers, e.g. `Content-Disposition`.
    pub headers: Vec<(&'static str, String)>,
    pub body: Body,
}

impl ApiResponse {
    pub fn bytes(status: u16, content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            headers: Vec::new(),
            body: Body::Bytes(body),
        }
    }

    /// Buffered body as bytes (`None` for streams).
    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Bytes(b) => Some(b),
            Body::Stream(_) => None,
        }
    }

    /// Buffered body parsed as JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(self.body_bytes()?).ok()
    }
}

pub(crate) const JSON: &str = "application/json; charset=utf-8";
const CSV: &str = "text/csv; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

/// A failed request.
#[derive(Debug)]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: 404,
            message: message.into(),
        }
    }

    pub fn payload_too_large(limit: u64) -> Self {
        Self {
            status: 413,
            message: format!("request body exceeds {limit} bytes"),
        }
    }

    pub fn into_response(self) -> ApiResponse {
        let body = serde_json::json!({ "error": self.message }).to_string();
        ApiResponse::bytes(self.status, JSON, body.into_bytes())
    }
}

impl From<OfferError> for ApiError {
    fn from(e: OfferError) -> Self {
        let status = match &e {
            OfferError::NotFound(_) => 404,
            OfferError::Validation(_) | OfferError::Csv(_) => 400,
            OfferError::Io(_) | OfferError::Json(_) => 500,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        if let Some(upstream) = e.downcast_ref::<UpstreamError>() {
            return Self {
                status: upstream.status,
                message: e.to_string(),
            };
        }
        match e.downcast::<OfferError>() {
            Ok(offer_error) => offer_error.into(),
            Err(e) => Self {
                status: 500,
                message: format!("{e:#}"),
            },
        }
    }
}

pub type ApiResult = Result<ApiResponse, ApiError>;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a JSON response with the given status.
fn json_response<T: Serialize>(status: u16, data: &T) -> ApiResult {
    let body = serde_json::to_vec(data)
        .context("failed to serialize JSON response")
        .map_err(ApiError::from)?;
    Ok(ApiResponse::bytes(status, JSON, body))
}

fn ok<T: Serialize>(data: &T) -> ApiResult {
    json_response(200, data)
}

/// Decoded `?key=value` pairs. `+` is a space; empty values are dropped.
pub(crate) fn query_params(url: &str) -> HashMap<String, String> {
    let Some((_, query)) = url.split_once('?') else {
        return HashMap::new();
    };
    query
        .split('&')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let k = decode(k)?;
            let v = decode(v)?;
            (!k.is_empty() && !v.trim().is_empty()).then(|| (k, v.trim().to_string()))
        })
        .collect()
}

fn decode(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(|s| s.into_owned())
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a [u8], what: &str) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid {what}: {e}")))
}

fn parse_date(params: &HashMap<String, String>, key: &str) -> Result<Option<NaiveDate>, ApiError> {
    params
        .get(key)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ApiError::bad_request(format!("'{key}' must be YYYY-MM-DD, got '{raw}'")))
        })
        .transpose()
}

fn parse_number<T: std::str::FromStr>(
    params: &HashMap<String, String>,
    key: &str,
) -> Result<Option<T>, ApiError> {
    params
        .get(key)
        .map(|raw| {
            raw.replace(',', ".")
                .parse::<T>()
                .map_err(|_| ApiError::bad_request(format!("'{key}' must be a number, got '{raw}'")))
        })
        .transpose()
}

fn offer_filter(params: &HashMap<String, String>) -> Result<OfferFilter, ApiError> {
    let status = params
        .get("status")
        .map(|s| {
            ScaleStatus::parse(s).ok_or_else(|| ApiError::bad_request(format!("unknown status '{s}'")))
        })
        .transpose()?;
    Ok(OfferFilter {
        platform: params.get("platform").cloned(),
        niche: params.get("niche").cloned(),
        status,
        search: params.get("search").cloned(),
    })
}

fn today(config: &OfferdashConfig) -> NaiveDate {
    period::today(&offset_from_minutes(config.analytics.utc_offset_minutes))
}

// ---------------------------------------------------------------------------
// Offers
// ---------------------------------------------------------------------------

/// `GET /api/offers?platform=&niche=&status=&search=`
pub fn list_offers(state: &WebState, url: &str) -> ApiResult {
    let filter = offer_filter(&query_params(url))?;
    ok(&state.store.list(&filter)?)
}

/// `POST /api/offers`
pub fn create_offer(state: &WebState, body: &[u8]) -> ApiResult {
    let input: NewOffer = parse_json(body, "offer")?;
    let offer = state.store.insert(input)?;
    json_response(201, &offer)
}

/// `GET /api/offers/{id}`
pub fn get_offer(state: &WebState, id: &str) -> ApiResult {
    ok(&state.store.get(id)?)
}

/// `PUT /api/offers/{id}`
pub fn update_offer(state: &WebState, id: &str, body: &[u8]) -> ApiResult {
    let patch: OfferPatch = parse_json(body, "offer update")?;
    ok(&state.store.update(id, patch)?)
}

/// `DELETE /api/offers/{id}`
pub fn delete_offer(state: &WebState, id: &str) -> ApiResult {
    ok(&state.store.delete(id)?)
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// `GET /api/board`
pub fn get_board(state: &WebState) -> ApiResult {
    ok(&Board::from_offers(state.store.all()?))
}

#[derive(Debug, Deserialize)]
struct MoveRequest {
    id: String,
    status: String,
}

/// `POST /api/board/move` with `{"id": "...", "status": "Escalando"}`
pub fn move_offer(state: &WebState, body: &[u8]) -> ApiResult {
    let req: MoveRequest = parse_json(body, "move request")?;
    let target = ScaleStatus::parse(&req.status)
        .ok_or_else(|| ApiError::bad_request(format!("unknown status '{}'", req.status)))?;
    ok(&board::move_offer(state.store.as_ref(), &req.id, target)?)
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

/// `GET /api/analytics?from=&to=&days=&platform=&niche=`
///
/// Without `from` or `days` the zero-state is returned.
pub fn get_analytics(state: &WebState, url: &str) -> ApiResult {
    let params = query_params(url);
    let range = match (parse_date(&params, "from")?, parse_number::<u32>(&params, "days")?) {
        (Some(from), _) => Some(DateRange::new(from, parse_date(&params, "to")?).limited()),
        (None, Some(days)) => Some(DateRange::last_days(today(&state.config), days)),
        (None, None) => None,
    }
    .transpose()
    .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let query = AnalyticsQuery {
        range,
        platform: params.get("platform").cloned(),
        niche: params.get("niche").cloned(),
        utc_offset: offset_from_minutes(state.config.analytics.utc_offset_minutes),
        top_offers: state.config.analytics.top_offers,
    };
    let offers = state.store.all()?;
    ok(&analytics::analyze(&offers, &query))
}

/// `GET /api/roi?cost=&revenue=`
pub fn get_roi(url: &str) -> ApiResult {
    let params = query_params(url);
    let cost = parse_number::<f64>(&params, "cost")?.unwrap_or(0.0);
    let revenue = parse_number::<f64>(&params, "revenue")?.unwrap_or(0.0);
    let result: RoiResult = roi_calculator(cost, revenue)
        .ok_or_else(|| ApiError::bad_request("cost and revenue must be finite numbers"))?;
    ok(&result)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// `GET /api/export.csv`
pub fn export_csv(state: &WebState) -> ApiResult {
    let offers = state.store.all()?;
    let offset = offset_from_minutes(state.config.analytics.utc_offset_minutes);
    let csv = csv_io::export_to_string(&offers, &offset)?;

    let mut resp = ApiResponse::bytes(200, CSV, csv.into_bytes());
    resp.headers.push((
        "Content-Disposition",
        format!(
            "attachment; filename=\"{}\"",
            csv_io::export_file_name(today(&state.config))
        ),
    ));
    Ok(resp)
}

/// `POST /api/import` with the raw CSV file as body.
pub fn import_csv(state: &WebState, body: &[u8]) -> ApiResult {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body must be a CSV file"));
    }
    let report: ImportReport = csv_io::import_offers(state.store.as_ref(), body)?;
    info!(imported = report.imported, skipped = report.skipped, "CSV imported");
    ok(&report)
}

// ---------------------------------------------------------------------------
// Spy / chat
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SpyRequest {
    #[serde(default)]
    url: String,
}

/// `POST /api/spy` with `{"url": "..."}`
pub fn post_spy(state: &WebState, body: &[u8]) -> ApiResult {
    let req: SpyRequest = parse_json(body, "spy request")?;
    if req.url.trim().is_empty() {
        return Err(ApiError::bad_request("URL is required"));
    }
    let result = spy::spy(&req.url, &state.config.spy).map_err(|e| ApiError {
        status: 502,
        message: format!("{e:#}"),
    })?;
    ok(&result)
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    history: Option<Vec<HistoryItem>>,
}

/// `POST /api/chat` with `{"history": [{"sender": "user", "text": "..."}]}`.
///
/// Streams the reply as chunked `text/plain`.
pub fn post_chat(state: &WebState, body: &[u8]) -> ApiResult {
    let req: ChatRequest = parse_json(body, "chat request")?;
    let history = req
        .history
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ApiError::bad_request("message history is required"))?;

    let client = OpenRouterClient::from_config(&state.config.chat)
        .map_err(|e| ApiError {
            status: 503,
            message: e.to_string(),
        })?;
    let stream = client.stream_chat(&history)?;

    Ok(ApiResponse {
        status: 200,
        content_type: TEXT,
        headers: Vec::new(),
        body: Body::Stream(Box::new(stream)),
    })
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Config API response: the effective config (API key masked) plus the raw
/// TOML.
#[derive(Serialize)]
struct ConfigResponse {
    config: OfferdashConfig,
    toml_text: String,
}

/// Config update request: a list of key-value pairs.
#[derive(Deserialize)]
struct ConfigUpdateRequest {
    updates: Vec<ConfigKeyValue>,
}

#[derive(Deserialize)]
struct ConfigKeyValue {
    key: String,
    value: String,
}

/// `GET /api/config`
pub fn get_config(state: &WebState) -> ApiResult {
    let mut shown = state.config.clone();
    shown.chat.api_key = config::mask_secret(&shown.chat.api_key);
    let toml_text = config::render_config(&state.config)?;
    ok(&ConfigResponse {
        config: shown,
        toml_text,
    })
}

/// `PUT /api/config`
///
/// Expects `{ "updates": [{ "key": "analytics.default_days", "value": "7" }] }`.
pub fn put_config(state: &mut WebState, body: &[u8]) -> ApiResult {
    let req: ConfigUpdateRequest = parse_json(body, "config update request")?;
    let path = state
        .config_file
        .clone()
        .ok_or_else(|| ApiError::bad_request("no writable config file"))?;

    let mut errors: Vec<String> = Vec::new();
    let mut applied: Vec<String> = Vec::new();

    for kv in &req.updates {
        match config::set_config_value_at(&path, &kv.key, &kv.value) {
            Ok(()) => applied.push(format!("{} = {}", kv.key, kv.value)),
            Err(e) => errors.push(format!("{}: {e:#}", kv.key)),
        }
    }

    if !applied.is_empty() {
        state.reload_config();
    }

    ok(&serde_json::json!({
        "applied": applied,
        "errors": errors,
        "success": errors.is_empty(),
    }))
}

/// `POST /api/config/reset`
pub fn post_config_reset(state: &mut WebState) -> ApiResult {
    let path = state
        .config_file
        .clone()
        .ok_or_else(|| ApiError::bad_request("no writable config file"))?;
    config::init_config_at(&path, true)?;
    state.reload_config();
    ok(&serde_json::json!({
        "success": true,
        "message": "Configuration reset to defaults",
    }))
}

// ---------------------------------------------------------------------------
// Health / activity
// ---------------------------------------------------------------------------

/// Health API response.
#[derive(Serialize)]
struct HealthResponse {
    version: &'static str,
    offers: usize,
    data_dir: String,
    config_exists: bool,
    chat_configured: bool,
    activity_log: bool,
}

/// `GET /api/health`
pub fn get_health(state: &WebState) -> ApiResult {
    let offers = match state.store.all() {
        Ok(all) => all.len(),
        Err(e) => {
            warn!(error = %e, "store unavailable during health check");
            0
        }
    };
    ok(&HealthResponse {
        version: env!("CARGO_PKG_VERSION"),
        offers,
        data_dir: state.config.general.data_dir_path().display().to_string(),
        config_exists: state.config_file.as_ref().is_some_and(|p| p.exists()),
        chat_configured: state.config.chat.has_api_key(),
        activity_log: state.activity.path().is_some(),
    })
}

/// `GET /api/activity?limit=N`
pub fn get_activity(state: &WebState, url: &str) -> ApiResult {
    let limit = parse_number::<usize>(&query_params(url), "limit")?.unwrap_or(50);
    let entries: Vec<ActivityEntry> = state.activity.read_recent(limit);
    ok(&entries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_decodes_values() {
        let params = query_params("/api/offers?platform=Google+Ads&niche=Sa%C3%BAde&search=");
        assert_eq!(params.get("platform").map(String::as_str), Some("Google Ads"));
        assert_eq!(params.get("niche").map(String::as_str), Some("Saúde"));
        assert!(!params.contains_key("search"));
        assert!(query_params("/api/offers").is_empty());
    }

    #[test]
    fn parse_date_validates_format() {
        let params = query_params("/x?from=2024-01-10&to=10/01/2024");
        assert_eq!(
            parse_date(&params, "from").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10)
        );
        assert_eq!(parse_date(&params, "to").unwrap_err().status, 400);
        assert_eq!(parse_date(&params, "missing").unwrap(), None);
    }

    #[test]
    fn parse_number_accepts_comma_decimals() {
        let params = query_params("/api/roi?cost=1500,50&revenue=abc");
        assert_eq!(parse_number::<f64>(&params, "cost").unwrap(), Some(1500.5));
        assert!(parse_number::<f64>(&params, "revenue").is_err());
    }

    #[test]
    fn offer_errors_map_to_status_codes() {
        assert_eq!(ApiError::from(OfferError::NotFound("x".into())).status, 404);
        assert_eq!(ApiError::from(OfferError::Validation("x".into())).status, 400);
        let io = OfferError::Io(std::io::Error::other("disk"));
        assert_eq!(ApiError::from(io).status, 500);
    }

    #[test]
    fn anyhow_errors_keep_domain_status() {
        let e = anyhow::Error::from(OfferError::NotFound("abc".into()));
        assert_eq!(ApiError::from(e).status, 404);

        let e = anyhow::Error::from(UpstreamError {
            status: 429,
            body: "rate limited".into(),
        });
        let api = ApiError::from(e);
        assert_eq!(api.status, 429);
        assert!(api.message.contains("rate limited"));

        assert_eq!(ApiError::from(anyhow::anyhow!("boom")).status, 500);
    }

    #[test]
    fn error_response_is_json() {
        let resp = ApiError::bad_request("nope").into_response();
        assert_eq!(resp.status, 400);
        assert_eq!(resp.json().unwrap()["error"], "nope");
    }
}
