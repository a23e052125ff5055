//! Blocking client for the SoroScan API.
//!
//! # Design
//! `SoroScanClient` owns its configuration and a [`Session`] wrapping the
//! transport. Every operation is the same three steps: build the request
//! through [`RequestBuilder`], send it on the calling thread, decode it with
//! the operation's expected type. The async client in
//! [`crate::async_client`] runs the identical steps with `.await` at the send.

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::operations::{Operation, RequestBuilder};
use crate::transport::{Session, Transport, UreqTransport};
use crate::types::{
    ContractEvent, ContractQuery, ContractStats, CreateContract, CreateWebhook, EventQuery, Page, PageQuery,
    RecordEventRequest, RecordEventResponse, TrackedContract, UpdateContract, UpdateWebhook, WebhookSubscription,
    WebhookTestResult,
};

/// Synchronous SoroScan client. One request in flight per call; the calling
/// thread blocks until the response arrives or the timeout elapses.
///
/// The transport is released by [`close`](Self::close) or when the client is
/// dropped, whichever comes first. Any call after `close` fails with
/// [`Error::Closed`](crate::Error::Closed).
#[derive(Debug)]
pub struct SoroScanClient<T: Transport = UreqTransport> {
    requests: RequestBuilder,
    session: Session<T>,
}

impl SoroScanClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> SoroScanClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            requests: RequestBuilder::new(config),
            session: Session::new(transport),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        self.requests.config()
    }

    /// Release the transport. Returns `false` if the client was already closed.
    pub fn close(&self) -> bool {
        self.session.close()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    fn execute<R: DeserializeOwned>(&self, operation: Result<Operation<R>>) -> Result<R> {
        let transport = self.session.acquire()?;
        let operation = operation?;
        let response = transport.send(&operation.request)?;
        operation.decode(&response)
    }

    pub fn list_contracts(&self, query: &ContractQuery) -> Result<Page<TrackedContract>> {
        self.execute(self.requests.list_contracts(query))
    }

    /// `id` is the database id or the contract address.
    pub fn get_contract(&self, id: &str) -> Result<TrackedContract> {
        self.execute(self.requests.get_contract(id))
    }

    pub fn create_contract(&self, input: &CreateContract) -> Result<TrackedContract> {
        self.execute(self.requests.create_contract(input))
    }

    pub fn update_contract(&self, id: &str, input: &UpdateContract) -> Result<TrackedContract> {
        self.execute(self.requests.update_contract(id, input))
    }

    pub fn delete_contract(&self, id: &str) -> Result<()> {
        self.execute(self.requests.delete_contract(id)).map(drop)
    }

    pub fn get_contract_stats(&self, id: &str) -> Result<ContractStats> {
        self.execute(self.requests.get_contract_stats(id))
    }

    pub fn list_events(&self, query: &EventQuery) -> Result<Page<ContractEvent>> {
        self.execute(self.requests.list_events(query))
    }

    pub fn get_event(&self, id: u64) -> Result<ContractEvent> {
        self.execute(self.requests.get_event(id))
    }

    pub fn record_event(&self, input: &RecordEventRequest) -> Result<RecordEventResponse> {
        self.execute(self.requests.record_event(input))
    }

    pub fn list_webhooks(&self, query: &PageQuery) -> Result<Page<WebhookSubscription>> {
        self.execute(self.requests.list_webhooks(query))
    }

    pub fn get_webhook(&self, id: u64) -> Result<WebhookSubscription> {
        self.execute(self.requests.get_webhook(id))
    }

    pub fn create_webhook(&self, input: &CreateWebhook) -> Result<WebhookSubscription> {
        self.execute(self.requests.create_webhook(input))
    }

    pub fn update_webhook(&self, id: u64, input: &UpdateWebhook) -> Result<WebhookSubscription> {
        self.execute(self.requests.update_webhook(id, input))
    }

    pub fn delete_webhook(&self, id: u64) -> Result<()> {
        self.execute(self.requests.delete_webhook(id)).map(drop)
    }

    pub fn test_webhook(&self, id: u64) -> Result<WebhookTestResult> {
        self.execute(self.requests.test_webhook(id))
    }

    /// Fetch the page after `page`, or `None` on the last page.
    pub fn next_page<M: DeserializeOwned>(&self, page: &Page<M>) -> Result<Option<Page<M>>> {
        self.follow(page.next.as_deref())
    }

    /// Fetch the page before `page`, or `None` on the first page.
    pub fn previous_page<M: DeserializeOwned>(&self, page: &Page<M>) -> Result<Option<Page<M>>> {
        self.follow(page.previous.as_deref())
    }

    fn follow<M: DeserializeOwned>(&self, cursor: Option<&str>) -> Result<Option<Page<M>>> {
        self.session.acquire()?;
        match cursor {
            Some(cursor) => self.execute(Ok(self.requests.follow(cursor))).map(Some),
            None => Ok(None),
        }
    }
}
