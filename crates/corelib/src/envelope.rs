//! Request envelopes.
//!
//! One envelope travels per connection. Requests have the shape
//! `{"request": {"findNode": <id>} | {"ping": <id>}, "sender"?: <contact>}`;
//! responses are any JSON value and are not modelled here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::node::{Contact, NodeId};

/// The remote operation carried by an envelope.
///
/// Serialized externally tagged, so exactly one of `findNode` or `ping` is
/// present. Anything else fails to decode.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Request {
    #[serde(rename = "findNode")]
    FindNode(NodeId),
    #[serde(rename = "ping")]
    Ping(NodeId),
}

impl Request {
    pub fn node_id(&self) -> &NodeId {
        match self {
            Request::FindNode(id) | Request::Ping(id) => id,
        }
    }

    /// Operation name as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::FindNode(_) => "findNode",
            Request::Ping(_) => "ping",
        }
    }
}

/// A request plus the contact of the node that sent it.
///
/// `sender` may be missing on the wire; a bare `{"request": {"ping": id}}`
/// is still a valid PING.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub request: Request,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Contact>,
}

impl Envelope {
    pub fn find_node(node_id: NodeId, sender: Contact) -> Self {
        Self {
            request: Request::FindNode(node_id),
            sender: Some(sender),
        }
    }

    pub fn ping(node_id: NodeId, sender: Contact) -> Self {
        Self {
            request: Request::Ping(node_id),
            sender: Some(sender),
        }
    }

    /// Decode an envelope from raw JSON text.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::InvalidEnvelope(e.to_string()))
    }
}
