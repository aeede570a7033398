//! Demo client: registers a model, then resolves an unknown and a known
//! identity.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use registry_common::{ServiceIdentity, ServiceRecord};
use service_registry::transport::ClientTls;
use service_registry::{ClientConfig, RegistryClient};

/// Service registry demo client
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Connection uses TLS if set, else plain TCP
    #[arg(long)]
    tls: bool,

    /// The file containing the CA root cert file
    #[arg(long, value_name = "FILE")]
    ca_file: Option<PathBuf>,

    /// The server name used to verify the hostname returned by the TLS handshake
    #[arg(long)]
    server_host_override: Option<String>,

    /// The server address
    #[arg(long)]
    hostname: Option<String>,

    /// The server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Per-request deadline in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Pause after registering; the second pause is half as long
    #[arg(long, default_value_t = 10)]
    pause_secs: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// Merges the optional config file with command-line overrides.
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(hostname) = &self.hostname {
            config.hostname = hostname.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if self.tls || self.ca_file.is_some() || self.server_host_override.is_some() {
            let tls = config.tls.get_or_insert_with(ClientTls::default);
            if self.ca_file.is_some() {
                tls.ca_file = self.ca_file.clone();
            }
            if self.server_host_override.is_some() {
                tls.server_host_override = self.server_host_override.clone();
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

    let config = args.client_config()?;
    let mut client = RegistryClient::connect(&config)
        .await
        .context("Failed to connect to the registry")?;

    let service = ServiceRecord::new(
        ServiceIdentity::new("my_super_model", "1.2.3")?,
        "my_server",
        12345,
    )?;

    info!("Recording a new service to Registry server ...");
    let ack = client
        .register(&service)
        .await
        .context("Register failed")?;
    info!("{}", ack);

    tokio::time::sleep(Duration::from_secs(args.pause_secs)).await;
    query_service(&mut client, &ServiceIdentity::new("banana", "1.2.3")?).await?;

    tokio::time::sleep(Duration::from_secs(args.pause_secs / 2)).await;
    query_service(&mut client, service.identity()).await?;

    Ok(())
}

/// Logs the record for `identity`. A missing registration is reported and
/// tolerated; any other failure is returned.
async fn query_service(client: &mut RegistryClient, identity: &ServiceIdentity) -> Result<()> {
    info!("Querying an existing service ...");

    match client.query(identity).await {
        Ok(record) => {
            info!("Service parameters:");
            info!("Model Name   : {}", record.name());
            info!("Model Version: {}", record.version());
            info!("Hostname     : {}", record.host());
            info!("Port         : {}", record.port());
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            warn!("{}", e);
            Ok(())
        }
        Err(e) => Err(e).context(format!("Query for {} failed", identity)),
    }
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hostname: registry.test.example.com\nport: 6000\ntimeout_secs: 3").unwrap();
        let path = file.path().to_str().unwrap();

        let args = Args::parse_from(["registry-client", "--config", path, "--port", "7000"]);
        let config = args.client_config().unwrap();
        assert_eq!(config.endpoint_uri(), "http://registry.test.example.com:7000");
        assert_eq!(config.timeout_secs, 3);

        let args = Args::parse_from(["registry-client", "--config", path, "--ca-file", "/tmp/ca.pem"]);
        let config = args.client_config().unwrap();
        assert_eq!(
            config.tls.unwrap().ca_file,
            Some(PathBuf::from("/tmp/ca.pem"))
        );
    }

    #[test]
    fn test_defaults_without_config_file() {
        let config = Args::parse_from(["registry-client"]).client_config().unwrap();
        assert_eq!(config, ClientConfig::default());

        let args = Args::parse_from(["registry-client", "--timeout-secs", "0"]);
        assert!(args.client_config().is_err());
    }
}
