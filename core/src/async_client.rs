//! Async client for the SoroScan API.
//!
//! Mirrors [`SoroScanClient`](crate::SoroScanClient) operation for operation.
//! The client is `Send + Sync`; share it by reference (or in an `Arc`) and
//! issue calls concurrently. Each call suspends only at the network send.

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::operations::{Operation, RequestBuilder};
use crate::transport::{AsyncTransport, ReqwestTransport, Session};
use crate::types::{
    ContractEvent, ContractQuery, ContractStats, CreateContract, CreateWebhook, EventQuery, Page, PageQuery,
    RecordEventRequest, RecordEventResponse, TrackedContract, UpdateContract, UpdateWebhook, WebhookSubscription,
    WebhookTestResult,
};

/// Asynchronous SoroScan client.
///
/// Dropping a pending call cancels only that call; the client stays open.
/// [`close`](Self::close) (or dropping the client) releases the connection
/// pool once calls already in flight complete.
#[derive(Debug)]
pub struct AsyncSoroScanClient<T: AsyncTransport = ReqwestTransport> {
    requests: RequestBuilder,
    session: Session<T>,
}

impl AsyncSoroScanClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout())?;
        Self::with_transport(config, transport)
    }
}

impl<T: AsyncTransport> AsyncSoroScanClient<T> {
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

    pub fn close(&self) -> bool {
        self.session.close()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    async fn execute<R: DeserializeOwned>(&self, operation: Result<Operation<R>>) -> Result<R> {
        let transport = self.session.acquire()?;
        let operation = operation?;
        let response = transport.send(&operation.request).await?;
        operation.decode(&response)
    }

    pub async fn list_contracts(&self, query: &ContractQuery) -> Result<Page<TrackedContract>> {
        self.execute(self.requests.list_contracts(query)).await
    }

    pub async fn get_contract(&self, id: &str) -> Result<TrackedContract> {
        self.execute(self.requests.get_contract(id)).await
    }

    pub async fn create_contract(&self, input: &CreateContract) -> Result<TrackedContract> {
        self.execute(self.requests.create_contract(input)).await
    }

    pub async fn update_contract(&self, id: &str, input: &UpdateContract) -> Result<TrackedContract> {
        self.execute(self.requests.update_contract(id, input)).await
    }

    pub async fn delete_contract(&self, id: &str) -> Result<()> {
        self.execute(self.requests.delete_contract(id)).await.map(drop)
    }

    pub async fn get_contract_stats(&self, id: &str) -> Result<ContractStats> {
        self.execute(self.requests.get_contract_stats(id)).await
    }

    pub async fn list_events(&self, query: &EventQuery) -> Result<Page<ContractEvent>> {
        self.execute(self.requests.list_events(query)).await
    }

    pub async fn get_event(&self, id: u64) -> Result<ContractEvent> {
        self.execute(self.requests.get_event(id)).await
    }

    pub async fn record_event(&self, input: &RecordEventRequest) -> Result<RecordEventResponse> {
        self.execute(self.requests.record_event(input)).await
    }

    pub async fn list_webhooks(&self, query: &PageQuery) -> Result<Page<WebhookSubscription>> {
        self.execute(self.requests.list_webhooks(query)).await
    }

    pub async fn get_webhook(&self, id: u64) -> Result<WebhookSubscription> {
        self.execute(self.requests.get_webhook(id)).await
    }

    pub async fn create_webhook(&self, input: &CreateWebhook) -> Result<WebhookSubscription> {
        self.execute(self.requests.create_webhook(input)).await
    }

    pub async fn update_webhook(&self, id: u64, input: &UpdateWebhook) -> Result<WebhookSubscription> {
        self.execute(self.requests.update_webhook(id, input)).await
    }

    pub async fn delete_webhook(&self, id: u64) -> Result<()> {
        self.execute(self.requests.delete_webhook(id)).await.map(drop)
    }

    pub async fn test_webhook(&self, id: u64) -> Result<WebhookTestResult> {
        self.execute(self.requests.test_webhook(id)).await
    }

    pub async fn next_page<M: DeserializeOwned>(&self, page: &Page<M>) -> Result<Option<Page<M>>> {
        self.follow(page.next.as_deref()).await
    }

    pub async fn previous_page<M: DeserializeOwned>(&self, page: &Page<M>) -> Result<Option<Page<M>>> {
        self.follow(page.previous.as_deref()).await
    }

    async fn follow<M: DeserializeOwned>(&self, cursor: Option<&str>) -> Result<Option<Page<M>>> {
        self.session.acquire()?;
        match cursor {
            Some(cursor) => self.execute(Ok(self.requests.follow(cursor))).await.map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::http::{HttpRequest, HttpResponse};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Holds every call until `expected` calls are in flight at once.
    struct Rendezvous {
        in_flight: AtomicUsize,
        expected: usize,
    }

    #[async_trait]
    impl AsyncTransport for Rendezvous {
        async fn send(&self, _request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError> {
            self.in_flight.fetch_add(1, Ordering::SeqCst);
            while self.in_flight.load(Ordering::SeqCst) < self.expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Ok(HttpResponse::new(204, ""))
        }
    }

    #[tokio::test]
    async fn concurrent_calls_do_not_block_each_other() {
        let transport = Rendezvous {
            in_flight: AtomicUsize::new(0),
            expected: 3,
        };
        let client = Arc::new(AsyncSoroScanClient::with_transport(ClientConfig::default(), transport).unwrap());
        let calls = (1..=3).map(|id| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.delete_webhook(id).await })
        });
        let joined = tokio::time::timeout(Duration::from_secs(5), async {
            let mut results = Vec::new();
            for call in calls.collect::<Vec<_>>() {
                results.push(call.await.unwrap());
            }
            results
        })
        .await
        .expect("calls deadlocked");
        assert!(joined.iter().all(|r| r.is_ok()));
    }

    #[tokio::test]
    async fn cancelled_call_leaves_client_open() {
        let transport = Rendezvous {
            in_flight: AtomicUsize::new(0),
            expected: usize::MAX,
        };
        let client = AsyncSoroScanClient::with_transport(ClientConfig::default(), transport).unwrap();
        let abandoned = tokio::time::timeout(Duration::from_millis(20), client.delete_contract("1")).await;
        assert!(abandoned.is_err());
        assert!(!client.is_closed());
    }

    #[tokio::test]
    async fn closed_client_fails_fast() {
        let transport = Rendezvous {
            in_flight: AtomicUsize::new(0),
            expected: 0,
        };
        let client = AsyncSoroScanClient::with_transport(ClientConfig::default(), transport).unwrap();
        client.delete_webhook(1).await.unwrap();
        client.close();
        assert!(client.delete_webhook(1).await.unwrap_err().is_closed());
        assert!(client.get_contract("1").await.unwrap_err().is_closed());
    }
}
