//! CLI entry point for discover-tcp.

use clap::Parser;
use cli::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = CliConfig::parse();
    let result = config.run().await?;
    if let Some(output) = result.to_json() {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}
