//! Command-line configuration.

use clap::Parser;
use corelib::config::{DEFAULT_HOST, DEFAULT_PORT};
use corelib::TransportConfig;

use crate::commands::{Command, CommandResult};

/// discover-tcp: FIND-NODE and PING over line-delimited JSON on TCP.
#[derive(Parser, Debug)]
#[command(name = "discover-tcp", version, about)]
pub struct CliConfig {
    /// Identity of this node, sent as the sender of every request
    #[arg(long, env = "DISCOVER_ID", default_value = "", global = true)]
    pub id: String,

    /// Host to bind and advertise
    #[arg(long, env = "DISCOVER_HOST", default_value = DEFAULT_HOST, global = true)]
    pub host: String,

    /// Port to bind and advertise
    #[arg(long, env = "DISCOVER_PORT", default_value_t = DEFAULT_PORT, global = true)]
    pub port: u16,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig::default()
            .with_id(self.id.as_str())
            .with_host(self.host.as_str())
            .with_port(self.port)
    }

    pub async fn run(self) -> anyhow::Result<CommandResult> {
        let config = self.transport_config();
        self.command.run(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_transport_defaults() {
        let config = CliConfig::try_parse_from(["discover-tcp", "listen"]).unwrap();
        let transport = config.transport_config();
        assert_eq!(transport.host, "localhost");
        assert_eq!(transport.port, 6742);
        assert!(matches!(config.command, Command::Listen));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let config = CliConfig::try_parse_from([
            "discover-tcp",
            "ping",
            "--peer-host",
            "10.0.0.5",
            "--peer-port",
            "9",
            "--id",
            "YmFy",
            "--port",
            "6744",
        ])
        .unwrap();

        let transport = config.transport_config();
        assert_eq!(transport.id.as_str(), "YmFy");
        assert_eq!(transport.port, 6744);
        match config.command {
            Command::Ping { peer } => {
                assert_eq!(peer.peer_host, "10.0.0.5");
                assert_eq!(peer.peer_port, 9);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_find_node_requires_target() {
        assert!(CliConfig::try_parse_from([
            "discover-tcp",
            "find-node",
            "--peer-host",
            "127.0.0.1",
            "--peer-port",
            "6742",
        ])
        .is_err());
    }
}
