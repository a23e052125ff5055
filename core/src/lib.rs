//! Typed Rust client for the SoroScan event-indexing API.
//!
//! # Overview
//! Covers tracked contracts, indexed events and webhook subscriptions.
//! [`SoroScanClient`] blocks the calling thread; [`AsyncSoroScanClient`]
//! suspends the calling task. Both return fully validated models or exactly
//! one [`Error`].
//!
//! # Design
//! - Request building and response decoding are pure data transformations
//!   ([`RequestBuilder`], [`decode()`]); the only I/O happens inside a
//!   [`Transport`] or [`AsyncTransport`].
//! - Both clients run every operation through the same builder and decoder,
//!   so they behave identically apart from how they wait.
//! - Failures form a closed taxonomy: [`Error::Api`] (classified by status
//!   via [`ApiErrorKind`]), [`Error::Transport`], [`Error::Decode`],
//!   [`Error::Closed`], [`Error::InvalidArgument`], [`Error::Config`].
//! - No retries, caching, rate-limit waiting or automatic pagination;
//!   callers follow `next` cursors themselves with `next_page`.
//!
//! ```no_run
//! use soroscan::{ClientConfig, ContractQuery, SoroScanClient};
//!
//! # fn main() -> soroscan::Result<()> {
//! let client = SoroScanClient::new(ClientConfig::default().with_api_key("my-key"))?;
//! let mut page = client.list_contracts(&ContractQuery::default())?;
//! loop {
//!     for contract in &page.results {
//!         println!("{} {}", contract.contract_id, contract.name);
//!     }
//!     match client.next_page(&page)? {
//!         Some(next) => page = next,
//!         None => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod async_client;
pub mod client;
pub mod config;
pub mod decode;
pub mod error;
pub mod http;
pub mod operations;
pub mod transport;
pub mod types;

pub use async_client::AsyncSoroScanClient;
pub use client::SoroScanClient;
pub use config::ClientConfig;
pub use decode::decode;
pub use error::{ApiError, ApiErrorKind, DecodeError, Error, Result, TransportError, TransportErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, QueryValue};
pub use operations::{Operation, RequestBuilder};
pub use transport::{AsyncTransport, ReqwestTransport, Session, Transport, UreqTransport};
pub use types::{
    ContractEvent, ContractQuery, ContractStats, CreateContract, CreateWebhook, EventQuery, NoContent, Page,
    PageQuery, RecordEventRequest, RecordEventResponse, TrackedContract, UpdateContract, UpdateWebhook,
    ValidationStatus, WebhookSubscription, WebhookTestResult,
};
