//! In-memory SoroScan API for integration tests.
//!
//! # Design
//! Implements the REST surface the client talks to: contracts, events,
//! webhooks and record-event, with DRF-style pagination (`count`, absolute
//! `next`/`previous` URLs, `results`). Events enter the store through
//! `POST /api/record-event/`, which indexes the submitted event immediately.
//! Optional knobs simulate an API key requirement, per-request latency and
//! rate limiting.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Contract {
    pub id: u64,
    pub contract_id: String,
    pub name: String,
    pub description: String,
    pub abi_schema: Option<Value>,
    pub is_active: bool,
    pub last_indexed_ledger: Option<u64>,
    pub event_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: u64,
    pub contract_id: String,
    pub contract_name: String,
    pub event_type: String,
    pub payload: Map<String, Value>,
    pub payload_hash: String,
    pub ledger: u64,
    pub event_index: u32,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    pub schema_version: Option<u32>,
    pub validation_status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Webhook {
    pub id: u64,
    pub contract: u64,
    pub contract_id: String,
    pub event_type: String,
    pub target_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_triggered: Option<DateTime<Utc>>,
    pub failure_count: u32,
}

#[derive(Debug, Default)]
pub struct Db {
    pub contracts: BTreeMap<u64, Contract>,
    pub events: BTreeMap<u64, Event>,
    pub webhooks: BTreeMap<u64, Webhook>,
    next_id: u64,
    next_ledger: u64,
}

impl Db {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Look a contract up by database id or by address.
    fn contract_key(&self, key: &str) -> Option<u64> {
        match key.parse::<u64>() {
            Ok(id) if self.contracts.contains_key(&id) => Some(id),
            _ => self
                .contracts
                .values()
                .find(|c| c.contract_id == key)
                .map(|c| c.id),
        }
    }
}

/// Behaviour knobs for the mock.
#[derive(Clone, Debug, Default)]
pub struct MockConfig {
    /// Require `Authorization: Bearer <key>` on every request.
    pub api_key: Option<String>,
    /// Sleep this long before handling each request.
    pub latency: Duration,
    /// Answer 429 once this many requests have been served.
    pub rate_limit_after: Option<u64>,
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<Db>>,
    config: Arc<MockConfig>,
    served: Arc<AtomicU64>,
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with_api_key(key: &str) -> Router {
    app_with(MockConfig {
        api_key: Some(key.to_string()),
        ..Default::default()
    })
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(Db::default())),
        config: Arc::new(config),
        served: Arc::new(AtomicU64::new(0)),
    };
    Router::new()
        .route("/api/contracts/", get(list_contracts).post(create_contract))
        .route(
            "/api/contracts/{id}/",
            get(get_contract).patch(update_contract).delete(delete_contract),
        )
        .route("/api/contracts/{id}/stats/", get(contract_stats))
        .route("/api/events/", get(list_events))
        .route("/api/events/{id}/", get(get_event))
        .route("/api/record-event/", post(record_event))
        .route("/api/webhooks/", get(list_webhooks).post(create_webhook))
        .route(
            "/api/webhooks/{id}/",
            get(get_webhook).patch(update_webhook).delete(delete_webhook),
        )
        .route("/api/webhooks/{id}/test/", post(test_webhook))
        .layer(middleware::from_fn_with_state(state.clone(), gatekeeper))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

// --- cross-cutting ---

async fn gatekeeper(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.config.latency.is_zero() {
        tokio::time::sleep(state.config.latency).await;
    }
    if let Some(key) = &state.config.api_key {
        let expected = format!("Bearer {key}");
        let presented = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        match presented {
            None => return detail(StatusCode::UNAUTHORIZED, "Authentication credentials were not provided."),
            Some(value) if value != expected => return detail(StatusCode::UNAUTHORIZED, "Invalid token."),
            Some(_) => {}
        }
    }
    let served = state.served.fetch_add(1, Ordering::SeqCst);
    if let Some(limit) = state.config.rate_limit_after {
        if served >= limit {
            let mut response = detail(StatusCode::TOO_MANY_REQUESTS, "Request was throttled.");
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, header::HeaderValue::from_static("60"));
            return response;
        }
    }
    next.run(request).await
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn not_found() -> Response {
    detail(StatusCode::NOT_FOUND, "Not found.")
}

fn field_errors(errors: Vec<(&str, &str)>) -> Response {
    let body: Map<String, Value> = errors
        .into_iter()
        .map(|(field, msg)| (field.to_string(), json!([msg])))
        .collect();
    (StatusCode::BAD_REQUEST, Json(Value::Object(body))).into_response()
}

// --- pagination ---

#[derive(Deserialize)]
pub struct PageParams {
    page: Option<usize>,
    page_size: Option<usize>,
}

fn paginate<T: Serialize>(
    items: Vec<T>,
    page: Option<usize>,
    page_size: Option<usize>,
    headers: &HeaderMap,
    uri: &Uri,
) -> Response {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(50).clamp(1, 100);
    let count = items.len();
    let pages = count.div_ceil(page_size).max(1);
    if page == 0 || page > pages {
        return detail(StatusCode::NOT_FOUND, "Invalid page.");
    }
    let results: Vec<T> = items.into_iter().skip((page - 1) * page_size).take(page_size).collect();
    let link = |target: usize| page_link(headers, uri, target);
    Json(json!({
        "count": count,
        "next": (page < pages).then(|| link(page + 1)),
        "previous": (page > 1).then(|| link(page - 1)),
        "results": results,
    }))
    .into_response()
}

/// Absolute URL for `target` page, keeping every other query parameter.
fn page_link(headers: &HeaderMap, uri: &Uri, target: usize) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|pair| !pair.is_empty() && !pair.starts_with("page="))
        .map(str::to_string)
        .collect();
    pairs.push(format!("page={target}"));
    format!("http://{host}{}?{}", uri.path(), pairs.join("&"))
}

// --- contracts ---

#[derive(Deserialize)]
pub struct ContractFilters {
    is_active: Option<bool>,
    search: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

async fn list_contracts(
    State(state): State<AppState>,
    Query(filters): Query<ContractFilters>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let db = state.db.read().await;
    let items: Vec<Contract> = db
        .contracts
        .values()
        .filter(|c| filters.is_active.map_or(true, |active| c.is_active == active))
        .filter(|c| {
            filters.search.as_deref().map_or(true, |needle| {
                let needle = needle.to_lowercase();
                c.name.to_lowercase().contains(&needle) || c.contract_id.to_lowercase().contains(&needle)
            })
        })
        .cloned()
        .collect();
    paginate(items, filters.page, filters.page_size, &headers, &uri)
}

fn str_field<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str)
}

async fn create_contract(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let mut errors = Vec::new();
    let contract_id = str_field(&body, "contract_id").unwrap_or("");
    let name = str_field(&body, "name").unwrap_or("");
    if contract_id.is_empty() {
        errors.push(("contract_id", "This field is required."));
    } else if !contract_id.starts_with('C') || contract_id.len() > 56 {
        errors.push(("contract_id", "Enter a valid Stellar contract address."));
    }
    if name.is_empty() {
        errors.push(("name", "This field is required."));
    }

    let mut db = state.db.write().await;
    if !contract_id.is_empty() && db.contracts.values().any(|c| c.contract_id == contract_id) {
        errors.push(("contract_id", "tracked contract with this contract id already exists."));
    }
    if !errors.is_empty() {
        return field_errors(errors);
    }

    let now = Utc::now();
    let contract = Contract {
        id: db.next_id(),
        contract_id: contract_id.to_string(),
        name: name.to_string(),
        description: str_field(&body, "description").unwrap_or("").to_string(),
        abi_schema: body.get("abi_schema").cloned().filter(|v| !v.is_null()),
        is_active: true,
        last_indexed_ledger: None,
        event_count: 0,
        created_at: now,
        updated_at: now,
    };
    db.contracts.insert(contract.id, contract.clone());
    (StatusCode::CREATED, Json(contract)).into_response()
}

async fn get_contract(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let db = state.db.read().await;
    match db.contract_key(&key).and_then(|id| db.contracts.get(&id)) {
        Some(contract) => Json(contract.clone()).into_response(),
        None => not_found(),
    }
}

#[derive(Deserialize)]
pub struct ContractPatch {
    name: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
}

async fn update_contract(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(patch): Json<ContractPatch>,
) -> Response {
    let mut db = state.db.write().await;
    let Some(id) = db.contract_key(&key) else {
        return not_found();
    };
    if patch.name.as_deref() == Some("") {
        return field_errors(vec![("name", "This field may not be blank.")]);
    }
    let Some(contract) = db.contracts.get_mut(&id) else {
        return not_found();
    };
    if let Some(name) = patch.name {
        contract.name = name;
    }
    if let Some(description) = patch.description {
        contract.description = description;
    }
    if let Some(is_active) = patch.is_active {
        contract.is_active = is_active;
    }
    contract.updated_at = Utc::now();
    Json(contract.clone()).into_response()
}

async fn delete_contract(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let mut db = state.db.write().await;
    let Some(id) = db.contract_key(&key) else {
        return not_found();
    };
    if let Some(removed) = db.contracts.remove(&id) {
        db.events.retain(|_, e| e.contract_id != removed.contract_id);
        db.webhooks.retain(|_, w| w.contract != id);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn contract_stats(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let db = state.db.read().await;
    let Some(contract) = db.contract_key(&key).and_then(|id| db.contracts.get(&id)) else {
        return not_found();
    };
    let events: Vec<&Event> = db
        .events
        .values()
        .filter(|e| e.contract_id == contract.contract_id)
        .collect();
    let mut types: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
    types.sort_unstable();
    types.dedup();
    Json(json!({
        "contract_id": contract.contract_id,
        "name": contract.name,
        "total_events": events.len(),
        "unique_event_types": types.len(),
        "latest_ledger": events.iter().map(|e| e.ledger).max(),
        "last_activity": events.iter().map(|e| e.timestamp).max(),
    }))
    .into_response()
}

// --- events ---

#[derive(Deserialize)]
pub struct EventFilters {
    #[serde(rename = "contract__contract_id")]
    contract_id: Option<String>,
    event_type: Option<String>,
    ledger: Option<u64>,
    #[serde(rename = "ledger__gte")]
    ledger_min: Option<u64>,
    #[serde(rename = "ledger__lte")]
    ledger_max: Option<u64>,
    validation_status: Option<String>,
    ordering: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

async fn list_events(
    State(state): State<AppState>,
    Query(filters): Query<EventFilters>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let db = state.db.read().await;
    let mut items: Vec<Event> = db
        .events
        .values()
        .filter(|e| filters.contract_id.as_ref().map_or(true, |c| &e.contract_id == c))
        .filter(|e| filters.event_type.as_ref().map_or(true, |t| &e.event_type == t))
        .filter(|e| filters.ledger.map_or(true, |l| e.ledger == l))
        .filter(|e| filters.ledger_min.map_or(true, |l| e.ledger >= l))
        .filter(|e| filters.ledger_max.map_or(true, |l| e.ledger <= l))
        .filter(|e| filters.validation_status.as_ref().map_or(true, |s| &e.validation_status == s))
        .cloned()
        .collect();
    match filters.ordering.as_deref().unwrap_or("-timestamp") {
        "timestamp" => items.sort_by_key(|e| (e.timestamp, e.id)),
        "-timestamp" => items.sort_by_key(|e| std::cmp::Reverse((e.timestamp, e.id))),
        "ledger" => items.sort_by_key(|e| (e.ledger, e.id)),
        "-ledger" => items.sort_by_key(|e| std::cmp::Reverse((e.ledger, e.id))),
        other => return field_errors(vec![("ordering", &format!("Unknown ordering field {other}"))]),
    }
    paginate(items, filters.page, filters.page_size, &headers, &uri)
}

async fn get_event(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let db = state.db.read().await;
    match db.events.get(&id) {
        Some(event) => Json(event.clone()).into_response(),
        None => not_found(),
    }
}

#[derive(Deserialize)]
pub struct RecordEvent {
    contract_id: String,
    event_type: String,
    payload_hash: String,
}

async fn record_event(State(state): State<AppState>, Json(input): Json<RecordEvent>) -> Response {
    let mut errors = Vec::new();
    if input.event_type.is_empty() || input.event_type.len() > 100 {
        errors.push(("event_type", "Ensure this field has between 1 and 100 characters."));
    }
    if input.payload_hash.len() != 64 || !input.payload_hash.chars().all(|c| c.is_ascii_hexdigit()) {
        errors.push(("payload_hash", "Must be a 64-character hex SHA-256 digest."));
    }
    let mut db = state.db.write().await;
    let contract_key = db.contract_key(&input.contract_id);
    if contract_key.is_none() {
        errors.push(("contract_id", "Contract is not tracked."));
    }
    let (Some(contract_key), true) = (contract_key, errors.is_empty()) else {
        return field_errors(errors);
    };

    db.next_ledger += 1;
    let ledger = 100_000 + db.next_ledger;
    let id = db.next_id();
    let tx_hash = format!("{:064x}", id);
    let Some(contract) = db.contracts.get_mut(&contract_key) else {
        return not_found();
    };
    contract.event_count += 1;
    contract.last_indexed_ledger = Some(ledger);
    let event = Event {
        id,
        contract_id: contract.contract_id.clone(),
        contract_name: contract.name.clone(),
        event_type: input.event_type,
        payload: Map::new(),
        payload_hash: input.payload_hash,
        ledger,
        event_index: 0,
        timestamp: Utc::now(),
        tx_hash: tx_hash.clone(),
        schema_version: None,
        validation_status: "passed".to_string(),
    };
    db.events.insert(id, event);
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "submitted",
            "tx_hash": tx_hash,
            "transaction_status": "SUCCESS",
        })),
    )
        .into_response()
}

// --- webhooks ---

async fn list_webhooks(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    headers: HeaderMap,
    uri: Uri,
) -> Response {
    let db = state.db.read().await;
    paginate(
        db.webhooks.values().cloned().collect(),
        params.page,
        params.page_size,
        &headers,
        &uri,
    )
}

#[derive(Deserialize)]
pub struct WebhookInput {
    contract: Option<u64>,
    target_url: Option<String>,
    #[serde(default)]
    event_type: String,
}

fn valid_target(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

async fn create_webhook(State(state): State<AppState>, Json(input): Json<WebhookInput>) -> Response {
    let mut db = state.db.write().await;
    let mut errors = Vec::new();
    let contract = input.contract.and_then(|id| db.contracts.get(&id)).cloned();
    if contract.is_none() {
        errors.push(("contract", "Invalid pk - object does not exist."));
    }
    let target_url = input.target_url.unwrap_or_default();
    if !valid_target(&target_url) {
        errors.push(("target_url", "Enter a valid URL."));
    }
    let (Some(contract), true) = (contract, errors.is_empty()) else {
        return field_errors(errors);
    };
    let webhook = Webhook {
        id: db.next_id(),
        contract: contract.id,
        contract_id: contract.contract_id,
        event_type: input.event_type,
        target_url,
        is_active: true,
        created_at: Utc::now(),
        last_triggered: None,
        failure_count: 0,
    };
    db.webhooks.insert(webhook.id, webhook.clone());
    (StatusCode::CREATED, Json(webhook)).into_response()
}

async fn get_webhook(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let db = state.db.read().await;
    match db.webhooks.get(&id) {
        Some(webhook) => Json(webhook.clone()).into_response(),
        None => not_found(),
    }
}

#[derive(Deserialize)]
pub struct WebhookPatch {
    target_url: Option<String>,
    event_type: Option<String>,
    is_active: Option<bool>,
}

async fn update_webhook(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(patch): Json<WebhookPatch>,
) -> Response {
    let mut db = state.db.write().await;
    let Some(webhook) = db.webhooks.get_mut(&id) else {
        return not_found();
    };
    if let Some(url) = patch.target_url {
        if !valid_target(&url) {
            return field_errors(vec![("target_url", "Enter a valid URL.")]);
        }
        webhook.target_url = url;
    }
    if let Some(event_type) = patch.event_type {
        webhook.event_type = event_type;
    }
    if let Some(is_active) = patch.is_active {
        webhook.is_active = is_active;
    }
    Json(webhook.clone()).into_response()
}

async fn delete_webhook(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.db.write().await.webhooks.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(),
    }
}

async fn test_webhook(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    let mut db = state.db.write().await;
    let Some(webhook) = db.webhooks.get_mut(&id) else {
        return not_found();
    };
    webhook.last_triggered = Some(Utc::now());
    Json(json!({
        "status": "sent",
        "detail": format!("Test payload queued for {}", webhook.target_url),
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_serializes_to_json() {
        let now = Utc::now();
        let contract = Contract {
            id: 1,
            contract_id: "CCAAA".to_string(),
            name: "Token".to_string(),
            description: String::new(),
            abi_schema: None,
            is_active: true,
            last_indexed_ledger: None,
            event_count: 0,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&contract).unwrap();
        assert_eq!(json["contract_id"], "CCAAA");
        assert_eq!(json["is_active"], true);
        assert!(json["abi_schema"].is_null());
    }

    #[test]
    fn contract_key_accepts_id_or_address() {
        let mut db = Db::default();
        let now = Utc::now();
        let id = db.next_id();
        db.contracts.insert(
            id,
            Contract {
                id,
                contract_id: "CCAAA".to_string(),
                name: "Token".to_string(),
                description: String::new(),
                abi_schema: None,
                is_active: true,
                last_indexed_ledger: None,
                event_count: 0,
                created_at: now,
                updated_at: now,
            },
        );
        assert_eq!(db.contract_key("1"), Some(1));
        assert_eq!(db.contract_key("CCAAA"), Some(1));
        assert_eq!(db.contract_key("2"), None);
    }

    #[test]
    fn page_link_replaces_page_only() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, "127.0.0.1:9000".parse().unwrap());
        let uri: Uri = "/api/events/?page=1&page_size=2&ordering=-ledger".parse().unwrap();
        assert_eq!(
            page_link(&headers, &uri, 2),
            "http://127.0.0.1:9000/api/events/?page_size=2&ordering=-ledger&page=2"
        );
    }
}
