//! Server-side request handling contract.
//!
//! The listener frames and decodes requests; the hosting application owns
//! the answers. Each request is handed to a [`RequestHandler`] together with
//! a [`Responder`], the single-use completion callback for that connection.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use corelib::{Contact, NodeId};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

/// Application hooks for inbound requests.
///
/// Implementations must eventually call [`Responder::respond`] (or drop every
/// clone of the responder). A handler that holds on to its responder forever
/// keeps the connection open forever.
///
/// # Thread Safety
///
/// Handlers are shared by every connection and run on their own task, so
/// they must be `Send + Sync`.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    /// A peer asked for the contacts closest to `node_id`.
    ///
    /// `sender` is `None` when the request did not identify its originator.
    async fn find_node(&self, node_id: NodeId, sender: Option<Contact>, responder: Responder);

    /// A peer asked whether `node_id` is alive. The reply is expected to be
    /// the local contact.
    async fn ping(&self, node_id: NodeId, sender: Option<Contact>, responder: Responder);
}

#[async_trait]
impl<H: RequestHandler + ?Sized> RequestHandler for Arc<H> {
    async fn find_node(&self, node_id: NodeId, sender: Option<Contact>, responder: Responder) {
        (**self).find_node(node_id, sender, responder).await
    }

    async fn ping(&self, node_id: NodeId, sender: Option<Contact>, responder: Responder) {
        (**self).ping(node_id, sender, responder).await
    }
}

/// What the connection does once a handler has answered.
pub(crate) type Reply = Option<Value>;

/// Single-use completion callback for one connection.
///
/// Cloning is allowed; all clones share one sink and only the first
/// [`respond`](Responder::respond) has any effect. The listener clears the
/// sink when the peer disconnects, so a late call is a silent no-op.
#[derive(Clone)]
pub struct Responder {
    sink: Arc<Mutex<Option<oneshot::Sender<Reply>>>>,
}

impl Responder {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Reply>) {
        let (tx, rx) = oneshot::channel();
        let responder = Self {
            sink: Arc::new(Mutex::new(Some(tx))),
        };
        (responder, rx)
    }

    /// Complete the request.
    ///
    /// `Ok(value)` writes `value` as one JSON line and closes the connection;
    /// `Err(_)` closes it without writing anything. Returns `false` when the
    /// call had no effect because the request was already completed or the
    /// peer is gone.
    pub fn respond<E: fmt::Display>(&self, result: Result<Value, E>) -> bool {
        let Some(tx) = self.sink.lock().take() else {
            return false;
        };
        let reply = match result {
            Ok(value) => Some(value),
            Err(reason) => {
                tracing::debug!(%reason, "handler rejected request");
                None
            }
        };
        tx.send(reply).is_ok()
    }

    /// Shorthand for `respond(Ok(value))`.
    pub fn reply(&self, value: Value) -> bool {
        self.respond(Ok::<_, std::convert::Infallible>(value))
    }

    /// Shorthand for `respond(Err(reason))`.
    pub fn reject(&self, reason: impl fmt::Display) -> bool {
        self.respond(Err::<Value, _>(reason))
    }

    /// True until the request has been completed or abandoned.
    pub fn is_pending(&self) -> bool {
        self.sink.lock().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub(crate) fn clear(&self) {
        self.sink.lock().take();
    }
}

impl fmt::Debug for Responder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("pending", &self.is_pending())
            .finish()
    }
}
