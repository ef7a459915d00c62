/// Web API tests.
///
/// Requests go through `web::dispatch` with an in-memory store, so routing,
/// JSON encoding and error mapping are covered without opening a socket.
use std::io::{self, Read};

use offerdash::config::OfferdashConfig;
use offerdash::offers::store::MemoryStore;
use offerdash::web::{self, ApiResponse, WebState};
use serde_json::{Value, json};
use tiny_http::Method;

fn state() -> WebState {
    WebState::with_store(MemoryStore::new(), OfferdashConfig::default())
}

fn call(state: &mut WebState, method: Method, url: &str, body: &Value) -> ApiResponse {
    let bytes = if body.is_null() {
        Vec::new()
    } else {
        serde_json::to_vec(body).unwrap()
    };
    web::dispatch(state, &method, url, &bytes)
}

fn json_of(resp: &ApiResponse) -> Value {
    resp.json().expect("JSON body")
}

fn create(state: &mut WebState, body: Value) -> Value {
    let resp = call(state, Method::Post, "/api/offers", &body);
    assert_eq!(resp.status, 201, "{:?}", resp.json());
    json_of(&resp)
}

// ---------------------------------------------------------------------------
// Offers CRUD
// ---------------------------------------------------------------------------

#[test]
fn offer_crud_round_trip() {
    let mut s = state();
    let created = create(
        &mut s,
        json!({"name": "Funil Keto", "platform": "Google Ads", "cost": 100, "revenue": 250}),
    );
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["scale_status"], "Inicio");

    let resp = call(&mut s, Method::Get, &format!("/api/offers/{id}"), &Value::Null);
    assert_eq!(resp.status, 200);
    assert_eq!(json_of(&resp)["name"], "Funil Keto");

    let resp = call(
        &mut s,
        Method::Put,
        &format!("/api/offers/{id}"),
        &json!({"revenue": 300, "scale_status": "Escalando"}),
    );
    assert_eq!(resp.status, 200);
    let updated = json_of(&resp);
    assert_eq!(updated["revenue"], 300.0);
    assert_eq!(updated["scale_status"], "Escalando");

    let resp = call(&mut s, Method::Delete, &format!("/api/offers/{id}"), &Value::Null);
    assert_eq!(resp.status, 200);
    let resp = call(&mut s, Method::Get, &format!("/api/offers/{id}"), &Value::Null);
    assert_eq!(resp.status, 404);
    assert!(json_of(&resp)["error"].as_str().unwrap().contains(&id));
}

#[test]
fn invalid_offer_is_400() {
    let mut s = state();
    let resp = call(&mut s, Method::Post, "/api/offers", &json!({"name": "X"}));
    assert_eq!(resp.status, 400);

    let resp = web::dispatch(&mut s, &Method::Post, "/api/offers", b"not json");
    assert_eq!(resp.status, 400);
}

#[test]
fn list_applies_query_filters() {
    let mut s = state();
    create(&mut s, json!({"name": "Keto Max", "platform": "Google Ads"}));
    create(&mut s, json!({"name": "Inglês Já", "platform": "Facebook Ads"}));

    let resp = call(&mut s, Method::Get, "/api/offers?platform=Google+Ads", &Value::Null);
    let list = json_of(&resp);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["name"], "Keto Max");

    let resp = call(&mut s, Method::Get, "/api/offers?status=bogus", &Value::Null);
    assert_eq!(resp.status, 400);
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

#[test]
fn board_move_updates_column() {
    let mut s = state();
    let offer = create(&mut s, json!({"name": "Oferta", "cost": 10, "revenue": 25}));
    let id = offer["id"].as_str().unwrap();

    let resp = call(
        &mut s,
        Method::Post,
        "/api/board/move",
        &json!({"id": id, "status": "pre-escala"}),
    );
    assert_eq!(resp.status, 200);
    let moved = json_of(&resp);
    assert_eq!(moved["result"], "to");
    assert_eq!(moved["offer"]["scale_status"], "Pré escala");

    let board = json_of(&call(&mut s, Method::Get, "/api/board", &Value::Null));
    let columns = board["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 4);
    assert_eq!(columns[1]["status"], "Pré escala");
    assert_eq!(columns[1]["offers"].as_array().unwrap().len(), 1);
    assert_eq!(columns[1]["total_profit"], 15.0);

    let again = call(
        &mut s,
        Method::Post,
        "/api/board/move",
        &json!({"id": id, "status": "Pré escala"}),
    );
    assert_eq!(json_of(&again)["result"], "unchanged");
}

#[test]
fn board_move_rejects_unknown_status_and_id() {
    let mut s = state();
    let resp = call(
        &mut s,
        Method::Post,
        "/api/board/move",
        &json!({"id": "x", "status": "done"}),
    );
    assert_eq!(resp.status, 400);

    let resp = call(
        &mut s,
        Method::Post,
        "/api/board/move",
        &json!({"id": "missing", "status": "Escalando"}),
    );
    assert_eq!(resp.status, 404);
}

// ---------------------------------------------------------------------------
// Analytics / ROI
// ---------------------------------------------------------------------------

#[test]
fn analytics_without_start_is_zero_state() {
    let mut s = state();
    create(&mut s, json!({"name": "Oferta", "cost": 10, "revenue": 25}));
    let data = json_of(&call(&mut s, Method::Get, "/api/analytics", &Value::Null));
    assert_eq!(data["currentPeriodMetrics"]["revenue"], 0.0);
    assert_eq!(data["performanceOverTimeData"].as_array().unwrap().len(), 0);
}

#[test]
fn analytics_over_recent_days_sees_new_offers() {
    let mut s = state();
    create(
        &mut s,
        json!({"name": "Oferta", "platform": "Google Ads", "niche": "Saúde", "cost": 10, "revenue": 25}),
    );
    let data = json_of(&call(&mut s, Method::Get, "/api/analytics?days=7", &Value::Null));

    assert_eq!(data["currentPeriodMetrics"]["profit"], 15.0);
    assert_eq!(data["performanceOverTimeData"].as_array().unwrap().len(), 7);
    assert_eq!(data["profitByPlatformData"][0]["platform"], "Google Ads");
    assert_eq!(data["offersByNicheData"][0]["name"], "Saúde");
    assert_eq!(data["offersByNicheData"][0]["value"], 1.0);
    assert_eq!(data["topOffers"][0]["name"], "Oferta");
}

#[test]
fn analytics_rejects_malformed_dates() {
    let mut s = state();
    let resp = call(&mut s, Method::Get, "/api/analytics?from=10/01/2024", &Value::Null);
    assert_eq!(resp.status, 400);
}

#[test]
fn analytics_rejects_windows_too_long_to_compute() {
    let mut s = state();
    let resp = call(&mut s, Method::Get, "/api/analytics?days=4000000000", &Value::Null);
    assert_eq!(resp.status, 400);
    assert!(json_of(&resp)["error"].as_str().unwrap().contains("days"));

    let resp = call(
        &mut s,
        Method::Get,
        "/api/analytics?from=1900-01-01&to=2024-01-01",
        &Value::Null,
    );
    assert_eq!(resp.status, 400);
}

#[test]
fn analytics_at_the_calendar_start_does_not_fail() {
    let mut s = state();
    let resp = call(
        &mut s,
        Method::Get,
        "/api/analytics?from=-262143-01-05&to=-262143-01-10",
        &Value::Null,
    );
    assert_eq!(resp.status, 200);
    assert_eq!(json_of(&resp)["currentPeriodMetrics"]["revenue"], 0.0);
}

#[test]
fn roi_endpoint_accepts_comma_decimals() {
    let mut s = state();
    let resp = call(&mut s, Method::Get, "/api/roi?cost=100&revenue=150,5", &Value::Null);
    assert_eq!(resp.status, 200);
    let roi = json_of(&resp);
    assert_eq!(roi["profit"], 50.5);
    assert!((roi["roi"].as_f64().unwrap() - 50.5).abs() < 1e-9);
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[test]
fn import_then_export_csv() {
    let mut s = state();
    let csv = "Nome da Oferta,Plataforma,Custo,Receita\nImportada,Google Ads,1,3\n";
    let resp = web::dispatch(&mut s, &Method::Post, "/api/import", csv.as_bytes());
    assert_eq!(resp.status, 200);
    assert_eq!(json_of(&resp)["imported"], 1);

    let resp = call(&mut s, Method::Get, "/api/export.csv", &Value::Null);
    assert_eq!(resp.status, 200);
    assert!(resp.content_type.starts_with("text/csv"));
    let disposition = resp
        .headers
        .iter()
        .find(|(k, _)| *k == "Content-Disposition")
        .map(|(_, v)| v.clone())
        .unwrap();
    assert!(disposition.contains("ofertas-"));
    let body = String::from_utf8(resp.body_bytes().unwrap().to_vec()).unwrap();
    assert!(body.contains("Importada,Google Ads"));
}

#[test]
fn oversized_bodies_are_rejected_whole() {
    let body = vec![b'a'; 65];
    let err = web::read_body(body.as_slice(), None, 64).unwrap_err();
    assert_eq!(err.status, 413);

    let err = web::read_body(io::empty(), Some(64 + 1), 64).unwrap_err();
    assert_eq!(err.status, 413);

    let exact = web::read_body(&body[..64], Some(64), 64).unwrap();
    assert_eq!(exact.len(), 64);
}

#[test]
fn import_larger_than_the_body_limit_is_413() {
    let row = "Oferta longa,Google Ads,1,2\n";
    let rows = (web::MAX_BODY_BYTES as usize / row.len()) + 1;
    let csv = format!("Nome da Oferta,Plataforma,Custo,Receita\n{}", row.repeat(rows));
    let err = web::read_body(csv.as_bytes(), None, web::MAX_BODY_BYTES).unwrap_err();
    assert_eq!(err.status, 413);
    assert!(err.message.contains("exceeds"));
}

#[test]
fn body_read_errors_are_400() {
    struct Broken;
    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }
    let err = web::read_body(Broken, None, web::MAX_BODY_BYTES).unwrap_err();
    assert_eq!(err.status, 400);
}

#[test]
fn import_rejects_empty_body() {
    let mut s = state();
    let resp = web::dispatch(&mut s, &Method::Post, "/api/import", b"");
    assert_eq!(resp.status, 400);
}

// ---------------------------------------------------------------------------
// Tools / health
// ---------------------------------------------------------------------------

#[test]
fn spy_requires_url() {
    let mut s = state();
    let resp = call(&mut s, Method::Post, "/api/spy", &json!({"url": "  "}));
    assert_eq!(resp.status, 400);
}

#[test]
fn chat_requires_history_and_key() {
    let mut s = state();
    let resp = call(&mut s, Method::Post, "/api/chat", &json!({}));
    assert_eq!(resp.status, 400);

    let resp = call(
        &mut s,
        Method::Post,
        "/api/chat",
        &json!({"history": [{"sender": "user", "text": "Oi"}]}),
    );
    assert_eq!(resp.status, 503);
}

#[test]
fn health_reports_store_and_chat() {
    let mut s = state();
    create(&mut s, json!({"name": "Oferta"}));
    let health = json_of(&call(&mut s, Method::Get, "/api/health", &Value::Null));
    assert_eq!(health["offers"], 1);
    assert_eq!(health["chat_configured"], false);
    assert_eq!(health["activity_log"], false);
}

#[test]
fn config_is_masked() {
    let mut config = OfferdashConfig::default();
    config.chat.api_key = "sk-or-v1-abcdef123456".to_string();
    let mut s = WebState::with_store(MemoryStore::new(), config);
    let resp = call(&mut s, Method::Get, "/api/config", &Value::Null);
    let body = json_of(&resp);
    let shown = body["config"]["chat"]["api_key"].as_str().unwrap();
    assert!(!shown.contains("abcdef123456"));
    assert!(!body["toml_text"].as_str().unwrap().contains("abcdef123456"));
}
