//! Domain models for the SoroScan API.
//!
//! # Design
//! Response models list every field the API documents, with serde defaults
//! where the server may omit a field. Unknown fields are ignored so the
//! server can grow its payloads without breaking clients; a missing
//! required field or a wrong type is a schema mismatch at decode time.
//! Request payloads skip unset optional fields so PATCH bodies only carry
//! what the caller wants to change.

use chrono::{DateTime, Utc};
use serde::de::{Deserializer, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_EVENT_ORDERING: &str = "-timestamp";

fn default_true() -> bool {
    true
}

/// A Soroban contract the indexer tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedContract {
    pub id: u64,
    /// Stellar contract address (`C...`).
    pub contract_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub abi_schema: Option<Value>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub last_indexed_ledger: Option<u64>,
    #[serde(default)]
    pub event_count: u64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Outcome of validating an event payload against the contract's schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    #[default]
    Passed,
    Failed,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationStatus::Passed => "passed",
            ValidationStatus::Failed => "failed",
        }
    }
}

/// An indexed contract event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub id: u64,
    pub contract_id: String,
    pub contract_name: String,
    pub event_type: String,
    /// Decoded event payload.
    pub payload: Map<String, Value>,
    pub payload_hash: String,
    pub ledger: u64,
    #[serde(default)]
    pub event_index: u32,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub validation_status: ValidationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookSubscription {
    pub id: u64,
    /// Database id of the watched contract.
    pub contract: u64,
    pub contract_id: String,
    /// Empty means every event type.
    #[serde(default)]
    pub event_type: String,
    pub target_url: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failure_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractStats {
    pub contract_id: String,
    pub name: String,
    pub total_events: u64,
    pub unique_event_types: u64,
    #[serde(default)]
    pub latest_ledger: Option<u64>,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
}

/// One page of a list endpoint.
///
/// `next` and `previous` are opaque cursors; the client only ever checks
/// whether they are present and follows them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

/// Request payload for registering a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateContract {
    pub contract_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abi_schema: Option<Value>,
}

impl CreateContract {
    pub fn new(contract_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            name: name.into(),
            description: String::new(),
            abi_schema: None,
        }
    }
}

/// Request payload for updating a contract. Only the fields present in the
/// JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateContract {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWebhook {
    /// Database id of the contract to watch.
    pub contract: u64,
    pub target_url: String,
    #[serde(default)]
    pub event_type: String,
}

impl CreateWebhook {
    pub fn new(contract: u64, target_url: impl Into<String>) -> Self {
        Self {
            contract,
            target_url: target_url.into(),
            event_type: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateWebhook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Request payload for submitting an event to the on-chain recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEventRequest {
    pub contract_id: String,
    pub event_type: String,
    /// Hex SHA-256 of the payload.
    pub payload_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEventResponse {
    pub status: String,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub transaction_status: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Result of a webhook test delivery. The server's fields vary, so they are
/// kept as a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookTestResult {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl WebhookTestResult {
    pub fn status(&self) -> Option<&str> {
        self.fields.get("status").and_then(Value::as_str)
    }

    pub fn detail(&self) -> Option<&str> {
        self.fields.get("detail").and_then(Value::as_str)
    }
}

/// Marker for endpoints whose success body carries no data, e.g. deletes
/// answering `204 No Content`. Accepts an empty body or any JSON value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoContent;

impl<'de> Deserialize<'de> for NoContent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(NoContent)
    }
}

/// Filters for `GET /api/contracts/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractQuery {
    pub is_active: Option<bool>,
    /// Matches name or contract address.
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ContractQuery {
    fn default() -> Self {
        Self {
            is_active: None,
            search: None,
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Filters for `GET /api/events/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    /// Contract address, not database id.
    pub contract_id: Option<String>,
    pub event_type: Option<String>,
    pub ledger: Option<u64>,
    pub ledger_min: Option<u64>,
    pub ledger_max: Option<u64>,
    pub validation_status: Option<ValidationStatus>,
    /// Field name, `-` prefix for descending.
    pub ordering: String,
    pub page: u32,
    pub page_size: u32,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            contract_id: None,
            event_type: None,
            ledger: None,
            ledger_min: None,
            ledger_max: None,
            validation_status: None,
            ordering: DEFAULT_EVENT_ORDERING.to_string(),
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Plain page selection for list endpoints without filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
