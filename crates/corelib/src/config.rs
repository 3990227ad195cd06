//! Endpoint configuration.

use serde::{Deserialize, Serialize};

use crate::node::{Contact, NodeId, TransportInfo};

/// Default bind host.
pub const DEFAULT_HOST: &str = "localhost";

/// Default bind port.
pub const DEFAULT_PORT: u16 = 6742;

/// Configuration of a transport endpoint.
///
/// `id` is stamped as the sender identity on contacts produced by the
/// endpoint; `host`/`port` are both the bind address and the address
/// advertised to peers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub id: NodeId,
    pub host: String,
    pub port: u16,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            id: NodeId(String::new()),
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
        }
    }
}

impl TransportConfig {
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn transport_info(&self) -> TransportInfo {
        TransportInfo::new(self.host.clone(), self.port)
    }

    /// The contact describing this endpoint.
    pub fn local_contact(&self) -> Contact {
        Contact {
            id: self.id.clone(),
            data: None,
            transport: Some(self.transport_info()),
        }
    }
}
