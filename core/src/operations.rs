//! Request builders for every SoroScan endpoint.
//!
//! # Design
//! Each remote action is split into a builder that validates its arguments
//! and produces an [`Operation`] (the request plus the expected response
//! type), and [`Operation::decode`], which turns the raw response into that
//! type. The blocking and async facades only differ in how they move the
//! request over the wire; both call the same builder and the same decode,
//! so they cannot disagree about paths, parameters or error mapping.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::decode::decode;
use crate::error::{Error, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    ContractEvent, ContractQuery, ContractStats, CreateContract, CreateWebhook, EventQuery, NoContent, Page,
    PageQuery, RecordEventRequest, RecordEventResponse, TrackedContract, UpdateContract, UpdateWebhook,
    WebhookSubscription, WebhookTestResult, MAX_PAGE_SIZE,
};

const MAX_CONTRACT_ID_LEN: usize = 56;
const MAX_EVENT_TYPE_LEN: usize = 100;
const MAX_PAYLOAD_HASH_LEN: usize = 64;

/// A ready-to-send request paired with the type its response decodes into.
pub struct Operation<T> {
    pub request: HttpRequest,
    shape: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation").field("request", &self.request).finish()
    }
}

impl<T: DeserializeOwned> Operation<T> {
    fn new(request: HttpRequest) -> Self {
        Self {
            request,
            shape: PhantomData,
        }
    }

    pub fn decode(&self, response: &HttpResponse) -> Result<T> {
        decode(response)
    }
}

/// Builds validated requests against one configured API host.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    config: ClientConfig,
}

impl RequestBuilder {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        self.authorize(HttpRequest::new(method, self.config.endpoint(path)))
    }

    fn authorize(&self, request: HttpRequest) -> HttpRequest {
        match self.config.api_key() {
            Some(key) => request.header("authorization", format!("Bearer {key}")),
            None => request,
        }
    }

    // --- contracts ---

    pub fn list_contracts(&self, query: &ContractQuery) -> Result<Operation<Page<TrackedContract>>> {
        check_page(query.page, query.page_size)?;
        let request = self
            .request(HttpMethod::Get, "/api/contracts/")
            .query("page", Some(query.page))
            .query("page_size", Some(query.page_size))
            .query("is_active", query.is_active)
            .query("search", query.search.as_ref());
        Ok(Operation::new(request))
    }

    pub fn get_contract(&self, id: &str) -> Result<Operation<TrackedContract>> {
        let id = path_segment("contract id", id)?;
        Ok(Operation::new(self.request(HttpMethod::Get, &format!("/api/contracts/{id}/"))))
    }

    pub fn create_contract(&self, input: &CreateContract) -> Result<Operation<TrackedContract>> {
        require("contract_id", &input.contract_id)?;
        require("name", &input.name)?;
        max_len("contract_id", &input.contract_id, MAX_CONTRACT_ID_LEN)?;
        let request = self.request(HttpMethod::Post, "/api/contracts/").json(to_json(input)?);
        Ok(Operation::new(request))
    }

    pub fn update_contract(&self, id: &str, input: &UpdateContract) -> Result<Operation<TrackedContract>> {
        let id = path_segment("contract id", id)?;
        let request = self
            .request(HttpMethod::Patch, &format!("/api/contracts/{id}/"))
            .json(to_json(input)?);
        Ok(Operation::new(request))
    }

    pub fn delete_contract(&self, id: &str) -> Result<Operation<NoContent>> {
        let id = path_segment("contract id", id)?;
        Ok(Operation::new(self.request(HttpMethod::Delete, &format!("/api/contracts/{id}/"))))
    }

    pub fn get_contract_stats(&self, id: &str) -> Result<Operation<ContractStats>> {
        let id = path_segment("contract id", id)?;
        Ok(Operation::new(
            self.request(HttpMethod::Get, &format!("/api/contracts/{id}/stats/")),
        ))
    }

    // --- events ---

    pub fn list_events(&self, query: &EventQuery) -> Result<Operation<Page<ContractEvent>>> {
        check_page(query.page, query.page_size)?;
        if let (Some(min), Some(max)) = (query.ledger_min, query.ledger_max) {
            if min > max {
                return Err(Error::InvalidArgument(format!(
                    "ledger_min ({min}) is greater than ledger_max ({max})"
                )));
            }
        }
        let request = self
            .request(HttpMethod::Get, "/api/events/")
            .query("page", Some(query.page))
            .query("page_size", Some(query.page_size))
            .query("ordering", Some(query.ordering.as_str()))
            .query("contract__contract_id", query.contract_id.as_ref())
            .query("event_type", query.event_type.as_ref())
            .query("ledger", query.ledger)
            .query("ledger__gte", query.ledger_min)
            .query("ledger__lte", query.ledger_max)
            .query("validation_status", query.validation_status.map(|s| s.as_str()));
        Ok(Operation::new(request))
    }

    pub fn get_event(&self, id: u64) -> Result<Operation<ContractEvent>> {
        Ok(Operation::new(self.request(HttpMethod::Get, &format!("/api/events/{id}/"))))
    }

    pub fn record_event(&self, input: &RecordEventRequest) -> Result<Operation<RecordEventResponse>> {
        require("contract_id", &input.contract_id)?;
        require("event_type", &input.event_type)?;
        require("payload_hash", &input.payload_hash)?;
        max_len("contract_id", &input.contract_id, MAX_CONTRACT_ID_LEN)?;
        max_len("event_type", &input.event_type, MAX_EVENT_TYPE_LEN)?;
        max_len("payload_hash", &input.payload_hash, MAX_PAYLOAD_HASH_LEN)?;
        let request = self.request(HttpMethod::Post, "/api/record-event/").json(to_json(input)?);
        Ok(Operation::new(request))
    }

    // --- webhooks ---

    pub fn list_webhooks(&self, query: &PageQuery) -> Result<Operation<Page<WebhookSubscription>>> {
        check_page(query.page, query.page_size)?;
        let request = self
            .request(HttpMethod::Get, "/api/webhooks/")
            .query("page", Some(query.page))
            .query("page_size", Some(query.page_size));
        Ok(Operation::new(request))
    }

    pub fn get_webhook(&self, id: u64) -> Result<Operation<WebhookSubscription>> {
        Ok(Operation::new(self.request(HttpMethod::Get, &format!("/api/webhooks/{id}/"))))
    }

    pub fn create_webhook(&self, input: &CreateWebhook) -> Result<Operation<WebhookSubscription>> {
        require("target_url", &input.target_url)?;
        let request = self.request(HttpMethod::Post, "/api/webhooks/").json(to_json(input)?);
        Ok(Operation::new(request))
    }

    pub fn update_webhook(&self, id: u64, input: &UpdateWebhook) -> Result<Operation<WebhookSubscription>> {
        if let Some(url) = &input.target_url {
            require("target_url", url)?;
        }
        let request = self
            .request(HttpMethod::Patch, &format!("/api/webhooks/{id}/"))
            .json(to_json(input)?);
        Ok(Operation::new(request))
    }

    pub fn delete_webhook(&self, id: u64) -> Result<Operation<NoContent>> {
        Ok(Operation::new(self.request(HttpMethod::Delete, &format!("/api/webhooks/{id}/"))))
    }

    pub fn test_webhook(&self, id: u64) -> Result<Operation<WebhookTestResult>> {
        Ok(Operation::new(
            self.request(HttpMethod::Post, &format!("/api/webhooks/{id}/test/")),
        ))
    }

    // --- pagination ---

    /// Fetch whatever page `cursor` points at. The cursor is sent verbatim;
    /// credentials go along only when it shares the base URL's origin.
    pub fn follow<T: DeserializeOwned>(&self, cursor: &str) -> Operation<Page<T>> {
        let request = HttpRequest::new(HttpMethod::Get, cursor);
        if self.same_origin(cursor) {
            Operation::new(self.authorize(request))
        } else {
            Operation::new(request)
        }
    }

    fn same_origin(&self, cursor: &str) -> bool {
        match (Url::parse(self.config.base_url()), Url::parse(cursor)) {
            (Ok(base), Ok(cursor)) => base.origin() == cursor.origin(),
            _ => false,
        }
    }
}

fn to_json<T: Serialize>(input: &T) -> Result<serde_json::Value> {
    serde_json::to_value(input).map_err(|e| Error::InvalidArgument(format!("payload is not serializable: {e}")))
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidArgument(format!("{field} must not be empty")));
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(Error::InvalidArgument(format!(
            "{field} is {len} characters, at most {max} allowed"
        )));
    }
    Ok(())
}

fn path_segment<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    require(field, value)?;
    if value.contains(['/', '?', '#']) || value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidArgument(format!("{field} is not a valid path segment: {value:?}")));
    }
    Ok(value)
}

fn check_page(page: u32, page_size: u32) -> Result<()> {
    if page == 0 {
        return Err(Error::InvalidArgument("page is 1-indexed".to_string()));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(Error::InvalidArgument(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationStatus;
    use serde_json::json;

    fn builder() -> RequestBuilder {
        RequestBuilder::new(ClientConfig::new("http://localhost:8000"))
    }

    fn keyed() -> RequestBuilder {
        RequestBuilder::new(ClientConfig::new("http://localhost:8000").with_api_key("k-123"))
    }

    #[test]
    fn list_contracts_request() {
        let query = ContractQuery {
            is_active: Some(true),
            ..Default::default()
        };
        let op = builder().list_contracts(&query).unwrap();
        assert_eq!(op.request.method, HttpMethod::Get);
        assert_eq!(
            op.request.url(),
            "http://localhost:8000/api/contracts/?page=1&page_size=50&is_active=true"
        );
        assert!(op.request.body.is_none());
        assert!(op.request.headers.is_empty());
    }

    #[test]
    fn list_events_maps_filter_names() {
        let query = EventQuery {
            contract_id: Some("CCAAA".to_string()),
            ledger_min: Some(10),
            ledger_max: Some(20),
            validation_status: Some(ValidationStatus::Failed),
            ..Default::default()
        };
        let op = builder().list_events(&query).unwrap();
        assert_eq!(
            op.request.url(),
            "http://localhost:8000/api/events/?page=1&page_size=50&ordering=-timestamp\
             &contract__contract_id=CCAAA&ledger__gte=10&ledger__lte=20&validation_status=failed"
        );
    }

    #[test]
    fn list_events_rejects_inverted_ledger_range() {
        let query = EventQuery {
            ledger_min: Some(30),
            ledger_max: Some(20),
            ..Default::default()
        };
        assert!(matches!(builder().list_events(&query), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn page_bounds_are_checked() {
        let zero_page = PageQuery { page: 0, page_size: 10 };
        assert!(matches!(builder().list_webhooks(&zero_page), Err(Error::InvalidArgument(_))));
        let huge = PageQuery { page: 1, page_size: 101 };
        assert!(matches!(builder().list_webhooks(&huge), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn api_key_becomes_bearer_header() {
        let op = keyed().get_webhook(3).unwrap();
        assert_eq!(
            op.request.headers,
            vec![("authorization".to_string(), "Bearer k-123".to_string())]
        );
        assert_eq!(op.request.url(), "http://localhost:8000/api/webhooks/3/");
    }

    #[test]
    fn create_contract_body() {
        let op = keyed().create_contract(&CreateContract::new("CCAAA", "Token")).unwrap();
        assert_eq!(op.request.method, HttpMethod::Post);
        assert_eq!(
            op.request.body,
            Some(json!({"contract_id": "CCAAA", "name": "Token", "description": ""}))
        );
        assert_eq!(op.request.headers.len(), 2);
    }

    #[test]
    fn create_contract_requires_name() {
        let err = builder().create_contract(&CreateContract::new("CCAAA", " ")).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg.contains("name")));
    }

    #[test]
    fn update_contract_is_patch_with_partial_body() {
        let input = UpdateContract {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let op = builder().update_contract("1", &input).unwrap();
        assert_eq!(op.request.method, HttpMethod::Patch);
        assert_eq!(op.request.path, "http://localhost:8000/api/contracts/1/");
        assert_eq!(op.request.body, Some(json!({"name": "Renamed"})));
    }

    #[test]
    fn contract_ids_must_be_path_segments() {
        assert!(builder().get_contract("").is_err());
        assert!(builder().get_contract("1/../2").is_err());
        assert!(builder().delete_contract("a b").is_err());
        assert!(builder().get_contract_stats("CCAAA").is_ok());
    }

    #[test]
    fn record_event_enforces_lengths() {
        let mut input = RecordEventRequest {
            contract_id: "C".repeat(56),
            event_type: "transfer".to_string(),
            payload_hash: "a".repeat(64),
        };
        assert!(builder().record_event(&input).is_ok());
        input.payload_hash.push('a');
        let err = builder().record_event(&input).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(msg) if msg.contains("payload_hash")));
    }

    #[test]
    fn test_webhook_has_no_body() {
        let op = builder().test_webhook(9).unwrap();
        assert_eq!(op.request.method, HttpMethod::Post);
        assert_eq!(op.request.path, "http://localhost:8000/api/webhooks/9/test/");
        assert!(op.request.body.is_none());
    }

    #[test]
    fn follow_uses_cursor_verbatim() {
        let cursor = "http://localhost:8000/api/events/?page=2&page_size=50";
        let op: Operation<Page<ContractEvent>> = keyed().follow(cursor);
        assert_eq!(op.request.url(), cursor);
        assert_eq!(op.request.headers.len(), 1);
    }

    #[test]
    fn follow_withholds_key_from_other_origins() {
        for cursor in [
            "http://elsewhere.test/api/events/?page=2",
            "https://localhost:8000/api/events/?page=2",
            "http://localhost:9000/api/events/?page=2",
            "not a url",
        ] {
            let op: Operation<Page<ContractEvent>> = keyed().follow(cursor);
            assert_eq!(op.request.path, cursor);
            assert!(op.request.headers.is_empty(), "{cursor}");
        }
    }
}
