//! Transport adapters: move an `HttpRequest` over the wire and hand back an
//! `HttpResponse`.
//!
//! # Design
//! [`Transport`] blocks the calling thread; [`AsyncTransport`] suspends the
//! calling task. Implementations only translate between the plain-data
//! request/response types and their HTTP engine: URL rendering, headers and
//! body serialization all come from [`HttpRequest`], so the two modes put
//! identical bytes on the wire. Tests substitute scripted implementations.
//!
//! [`Session`] owns an adapter for the lifetime of a facade and implements
//! the open/closed state machine shared by both facades.

mod reqwest_transport;
mod ureq_transport;

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result, TransportError};
use crate::http::{HttpRequest, HttpResponse};

pub use reqwest_transport::ReqwestTransport;
pub use ureq_transport::UreqTransport;

/// Blocking execution of one request.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// Suspending execution of one request. Calls on the same instance may be in
/// flight concurrently.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, TransportError>;
}

/// Holds a transport between construction and `close()`.
///
/// Callers borrow the transport through [`Session::acquire`], which hands
/// out a shared handle; a call that is already in flight keeps its handle and
/// finishes even if the session is closed meanwhile. The transport itself is
/// dropped when the session is closed and the last handle goes away.
#[derive(Debug)]
pub struct Session<T> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T> Session<T> {
    pub fn new(transport: T) -> Self {
        Self {
            slot: Mutex::new(Some(Arc::new(transport))),
        }
    }

    pub fn acquire(&self) -> Result<Arc<T>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::Closed)
    }

    /// Release the transport. Returns `true` only for the call that actually
    /// closed the session.
    pub fn close(&self) -> bool {
        let released = self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        if released.is_some() {
            debug!("transport session closed");
        }
        released.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}

impl<T> Drop for Session<T> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_is_one_shot() {
        let session = Session::new(());
        assert!(!session.is_closed());
        assert!(session.acquire().is_ok());
        assert!(session.close());
        assert!(!session.close());
        assert!(session.is_closed());
        assert!(matches!(session.acquire(), Err(Error::Closed)));
    }

    #[test]
    fn in_flight_handle_outlives_close() {
        let marker = Arc::new(());
        let session = Session::new(Arc::clone(&marker));
        let handle = session.acquire().unwrap();
        session.close();
        assert_eq!(Arc::strong_count(&marker), 2);
        drop(handle);
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[test]
    fn drop_releases_transport() {
        let marker = Arc::new(());
        {
            let _session = Session::new(Arc::clone(&marker));
            assert_eq!(Arc::strong_count(&marker), 2);
        }
        assert_eq!(Arc::strong_count(&marker), 1);
    }
}
