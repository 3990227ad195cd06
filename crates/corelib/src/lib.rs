//! Core library for the discovery TCP transport.
//!
//! This crate provides the data model shared by both ends of the wire:
//! - Node identifiers and contacts
//! - The request envelope exchanged over one connection
//! - Endpoint configuration
//! - The error taxonomy reported by transport operations

pub mod config;
pub mod envelope;
pub mod error;
pub mod node;

pub use config::TransportConfig;
pub use envelope::{Envelope, Request};
pub use error::{Error, Result};
pub use node::{Contact, NodeId, TransportInfo};
