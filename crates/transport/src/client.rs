//! RPC caller: one outbound request/response exchange per connection.
//!
//! The caller writes a single frame and then reads until the peer closes the
//! connection. Closure, not the delimiter, marks the end of the response.

use corelib::{Contact, Envelope, Error, NodeId, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::codec;

/// Liveness outcome of a PING.
#[derive(Clone, Debug, PartialEq)]
pub enum PingOutcome {
    /// The peer answered with a contact proving its identity and address.
    Reached(Contact),
    Unreachable,
}

impl PingOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, PingOutcome::Reached(_))
    }
}

/// Send `payload` as one frame to `contact` and collect everything the peer
/// writes back before closing.
///
/// Connect and socket failures map to [`Error::Unreachable`]. An empty
/// `Vec` is a valid outcome: the peer closed without answering.
pub async fn rpc<T: Serialize + ?Sized>(contact: &Contact, payload: &T) -> Result<Vec<u8>> {
    let frame = codec::encode(payload)?;
    send_frame(contact, &frame).await
}

/// Like [`rpc`], for a payload that is already encoded.
pub async fn send_frame(contact: &Contact, frame: &[u8]) -> Result<Vec<u8>> {
    let transport = contact
        .transport
        .as_ref()
        .ok_or_else(|| Error::MissingTransport {
            id: contact.id.clone(),
        })?;

    let mut stream = TcpStream::connect((transport.host.as_str(), transport.port))
        .await
        .map_err(Error::Unreachable)?;
    trace!(peer = %transport, "connected");

    stream.write_all(frame).await.map_err(Error::Unreachable)?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .map_err(Error::Unreachable)?;
    trace!(peer = %transport, bytes = response.len(), "peer closed");

    Ok(response)
}

/// Ask `contact` for the nodes closest to `node_id`.
///
/// The decoded response is returned as-is; its meaning belongs to the
/// caller. Failures are reported once and never retried.
pub async fn find_node(contact: &Contact, node_id: &NodeId, sender: &Contact) -> Result<Value> {
    let envelope = Envelope::find_node(node_id.clone(), sender.clone());
    let result = rpc(contact, &envelope).await.and_then(|bytes| codec::decode_response(&bytes));
    if let Err(e) = &result {
        debug!(contact = %contact.id, %node_id, error = %e, "findNode failed");
    }
    result
}

/// Check whether `contact` is alive.
///
/// Every failure (connect error, empty or malformed response, response
/// without `id`, `transport.host` and `transport.port`) collapses into
/// [`PingOutcome::Unreachable`]. Only a contact without transport info is an
/// error.
pub async fn ping(contact: &Contact, sender: &Contact) -> Result<PingOutcome> {
    let envelope = Envelope::ping(contact.id.clone(), sender.clone());
    let bytes = match rpc(contact, &envelope).await {
        Ok(bytes) => bytes,
        Err(e @ Error::MissingTransport { .. }) => return Err(e),
        Err(e) => {
            debug!(contact = %contact.id, error = %e, "ping failed");
            return Ok(PingOutcome::Unreachable);
        }
    };

    let value = match codec::decode_response(&bytes) {
        Ok(value) => value,
        Err(e) => {
            debug!(contact = %contact.id, error = %e, "ping response unusable");
            return Ok(PingOutcome::Unreachable);
        }
    };

    match Contact::from_identity_proof(value) {
        Some(reached) => Ok(PingOutcome::Reached(reached)),
        None => {
            debug!(contact = %contact.id, "ping response lacks identity or address");
            Ok(PingOutcome::Unreachable)
        }
    }
}
