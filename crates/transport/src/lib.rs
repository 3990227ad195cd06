//! TCP transport for node discovery.
//!
//! This crate implements the wire protocol behind FIND-NODE and PING:
//! - Line-delimited JSON framing (`codec`)
//! - A listener that dispatches each inbound request to a handler
//! - A one-shot RPC caller and the public `find_node`/`ping` operations
//!
//! Every connection carries exactly one request and at most one response.

pub mod client;
pub mod codec;
pub mod endpoint;
pub mod handler;
pub mod listener;

pub use client::PingOutcome;
pub use endpoint::TcpTransport;
pub use handler::{RequestHandler, Responder};
pub use listener::Listener;
