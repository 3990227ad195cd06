//! Node abstractions for the discovery transport.
//!
//! A peer is described by a [`Contact`]: its opaque [`NodeId`], an optional
//! application payload, and the [`TransportInfo`] needed to reach it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Opaque identifier for a node.
///
/// Ids are binary values encoded by the application (usually base64). The
/// transport never looks inside them, so they are carried as plain strings.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Network location of a peer.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TransportInfo {
    pub host: String,
    pub port: u16,
}

impl TransportInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for TransportInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Identity plus network location of a peer.
///
/// `transport` is only absent before the first contact has been made; any
/// contact handed to an outbound operation must carry it. `data` belongs to
/// the application and is passed through untouched.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Contact {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportInfo>,
}

impl Contact {
    /// Construct a contact that has not been located yet.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            data: None,
            transport: None,
        }
    }

    pub fn with_transport(mut self, host: impl Into<String>, port: u16) -> Self {
        self.transport = Some(TransportInfo::new(host, port));
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Interpret a decoded response as a contact that proves its identity
    /// and address.
    ///
    /// Returns `None` unless `id`, `transport.host` and `transport.port` are
    /// all present with their wire types (string, string, `u16`). `data` is
    /// optional and not validated.
    pub fn from_identity_proof(value: Value) -> Option<Self> {
        serde_json::from_value::<Contact>(value)
            .ok()
            .filter(|contact| contact.transport.is_some())
    }
}
