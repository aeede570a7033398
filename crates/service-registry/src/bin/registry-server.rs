//! Standalone service registry server.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use service_registry::transport::ServerTls;
use service_registry::{RegistryConfig, RegistryServer};

/// Service registry - resolves (name, version) to host:port over gRPC
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Connection uses TLS if set, else plain TCP
    #[arg(long)]
    tls: bool,

    /// The TLS cert file
    #[arg(long, value_name = "FILE")]
    cert_file: Option<PathBuf>,

    /// The TLS key file
    #[arg(long, value_name = "FILE")]
    key_file: Option<PathBuf>,

    /// The server bind address
    #[arg(long)]
    hostname: Option<String>,

    /// The server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Also serve the HTTP/JSON gateway on this port
    #[arg(long)]
    http_port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// Merges the optional config file with command-line overrides.
    fn into_config(self) -> Result<RegistryConfig> {
        let mut config = match &self.config {
            Some(path) => RegistryConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?,
            None => RegistryConfig::default(),
        };

        if let Some(hostname) = self.hostname {
            config.hostname = hostname;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.http_port.is_some() {
            config.http_port = self.http_port;
        }
        if self.tls || self.cert_file.is_some() || self.key_file.is_some() {
            let tls = config.tls.get_or_insert_with(ServerTls::default);
            if self.cert_file.is_some() {
                tls.cert_file = self.cert_file;
            }
            if self.key_file.is_some() {
                tls.key_file = self.key_file;
            }
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.debug);

    let config = args.into_config()?;
    info!("Service registry starting on {}", config.grpc_address());
    info!("Press Ctrl+C to stop");

    RegistryServer::new(config)
        .run()
        .await
        .context("Registry server stopped with an error")?;

    info!("Service registry stopped");
    Ok(())
}

fn initialize_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}
