//! CLI tool for the discovery TCP transport.
//!
//! Provides commands for:
//! - Running a listener that answers FIND-NODE and PING
//! - Pinging a peer
//! - Asking a peer for the nodes closest to an id

pub mod commands;
pub mod config;
pub mod handler;

pub use commands::{Command, CommandResult};
pub use config::CliConfig;
pub use handler::KnownContacts;
