//! Subcommands.

use clap::{Args, Subcommand};
use corelib::{Contact, NodeId, TransportConfig};
use serde_json::{json, Value};
use transport::{PingOutcome, TcpTransport};

use crate::handler::KnownContacts;

/// Address of the remote peer for outbound commands.
#[derive(Args, Debug, Clone)]
pub struct PeerArgs {
    /// Host of the peer to contact
    #[arg(long)]
    pub peer_host: String,

    /// Port of the peer to contact
    #[arg(long)]
    pub peer_port: u16,

    /// Id of the peer, if known
    #[arg(long, default_value = "")]
    pub peer_id: String,
}

impl PeerArgs {
    pub fn contact(&self) -> Contact {
        Contact::new(self.peer_id.as_str()).with_transport(self.peer_host.as_str(), self.peer_port)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer FIND-NODE and PING requests until interrupted
    Listen,
    /// Check whether a peer is alive
    Ping {
        #[command(flatten)]
        peer: PeerArgs,
    },
    /// Ask a peer for the nodes closest to TARGET
    FindNode {
        #[command(flatten)]
        peer: PeerArgs,
        /// Id of the node to look up
        target: String,
    },
}

/// What a command produced.
#[derive(Debug)]
pub enum CommandResult {
    /// The listener was shut down.
    Stopped,
    Ping(PingOutcome),
    /// Response of a FIND-NODE, or the error it ended with.
    Nodes(Result<Value, String>),
}

impl CommandResult {
    /// Output to print, if any.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            CommandResult::Stopped => None,
            CommandResult::Ping(PingOutcome::Reached(contact)) => {
                Some(json!({"reached": contact}))
            }
            CommandResult::Ping(PingOutcome::Unreachable) => Some(json!({"unreachable": true})),
            CommandResult::Nodes(Ok(response)) => Some(json!({"node": response})),
            CommandResult::Nodes(Err(error)) => Some(json!({"error": error})),
        }
    }
}

impl Command {
    pub async fn run(self, config: TransportConfig) -> anyhow::Result<CommandResult> {
        let mut transport = TcpTransport::new(config);
        match self {
            Command::Listen => {
                let handler = KnownContacts::new(transport.local_contact());
                let addr = transport.listen(handler).await?;
                tracing::info!(%addr, id = %transport.config().id, "serving requests, press ctrl-c to stop");

                tokio::signal::ctrl_c().await?;
                transport.close().await;
                Ok(CommandResult::Stopped)
            }
            Command::Ping { peer } => {
                let outcome = transport.ping(&peer.contact(), &transport.local_contact()).await?;
                Ok(CommandResult::Ping(outcome))
            }
            Command::FindNode { peer, target } => {
                let node_id = NodeId::from(target);
                let result = transport
                    .find_node(&peer.contact(), &node_id, &transport.local_contact())
                    .await
                    .map_err(|e| e.to_string());
                Ok(CommandResult::Nodes(result))
            }
        }
    }
}
