//! Error types for the core library.

use thiserror::Error;

use crate::node::NodeId;

/// Result type alias for the transport.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the transport.
///
/// The first four variants are what an outbound FIND-NODE observes. Each
/// one is scoped to a single connection attempt; none of them is fatal to
/// the process.
#[derive(Debug, Error)]
pub enum Error {
    /// The contact has no `transport` to connect to. This is a caller
    /// error and is reported before any I/O happens.
    #[error("contact {id} has no transport info")]
    MissingTransport { id: NodeId },

    /// Connect failed or the socket errored mid-transfer.
    #[error("unreachable")]
    Unreachable(#[source] std::io::Error),

    /// The peer closed the connection gracefully without sending a byte.
    #[error("no data received")]
    NoData,

    /// The peer sent bytes that are not valid JSON.
    #[error("JSON parse error: {message}: {raw}")]
    Json { message: String, raw: String },

    /// A request envelope did not have the expected shape.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// `listen` was called on an endpoint that is already listening.
    #[error("transport is already listening on {0}")]
    AlreadyListening(std::net::SocketAddr),

    /// A value could not be serialized to JSON.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that mean the remote could not be talked to.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Error::Unreachable(_))
    }
}
