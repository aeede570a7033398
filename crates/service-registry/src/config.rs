//! Server and client configuration.
//!
//! Both binaries build their configuration the same way: defaults, then an
//! optional YAML file, then command-line overrides. Example server file:
//!
//! ```yaml
//! hostname: 0.0.0.0
//! port: 50051
//! http_port: 8080
//! tls:
//!   cert_file: /etc/registry/server_cert.pem
//!   key_file: /etc/registry/server_key.pem
//! ```
//!
//! Example client file:
//!
//! ```yaml
//! hostname: registry.test.example.com
//! port: 50051
//! timeout_secs: 5
//! tls:
//!   ca_file: /etc/registry/ca_cert.pem
//!   server_host_override: x.test.example.com
//! ```

use registry_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use crate::transport::{ClientTls, ServerTls};

pub const DEFAULT_HOSTNAME: &str = "localhost";
pub const DEFAULT_PORT: u16 = 50051;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

fn default_hostname() -> String {
    DEFAULT_HOSTNAME.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Registry server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Bind address for the gRPC listener.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// gRPC port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port of the HTTP/JSON gateway; the gateway is disabled when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,

    /// TLS material; plaintext when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<ServerTls>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: DEFAULT_PORT,
            http_port: None,
            tls: None,
        }
    }
}

impl RegistryConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::configuration(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: RegistryConfig = serde_yaml::from_str(content)
            .map_err(|e| Error::configuration(format!("failed to parse YAML configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.hostname.is_empty() {
            return Err(Error::configuration("hostname must not be empty"));
        }
        if let Some(http_port) = self.http_port {
            if http_port != 0 && http_port == self.port {
                return Err(Error::configuration(format!(
                    "http_port {} collides with the gRPC port",
                    http_port
                )));
            }
        }
        Ok(())
    }

    /// `hostname:port` of the gRPC listener.
    pub fn grpc_address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }

    /// Resolves the gRPC bind address.
    pub fn grpc_socket_addr(&self) -> Result<SocketAddr> {
        resolve(&self.hostname, self.port)
    }

    /// Resolves the HTTP bind address, if the gateway is enabled.
    pub fn http_socket_addr(&self) -> Result<Option<SocketAddr>> {
        self.http_port
            .map(|port| resolve(&self.hostname, port))
            .transpose()
    }
}

fn resolve(hostname: &str, port: u16) -> Result<SocketAddr> {
    (hostname, port)
        .to_socket_addrs()
        .map_err(|e| Error::configuration(format!("cannot resolve {}:{}: {}", hostname, port, e)))?
        .next()
        .ok_or_else(|| Error::configuration(format!("{}:{} resolved to no address", hostname, port)))
}

/// Registry client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<ClientTls>,

    /// Deadline applied to every call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: default_hostname(),
            port: DEFAULT_PORT,
            tls: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::configuration(format!(
                "failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: ClientConfig = serde_yaml::from_str(content)
            .map_err(|e| Error::configuration(format!("failed to parse YAML configuration: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.hostname.is_empty() {
            return Err(Error::configuration("hostname must not be empty"));
        }
        if self.port == 0 {
            return Err(Error::configuration("port must not be 0"));
        }
        if self.timeout_secs == 0 {
            return Err(Error::configuration("timeout_secs must be at least 1"));
        }
        Ok(())
    }

    /// URI of the registry endpoint.
    pub fn endpoint_uri(&self) -> String {
        let scheme = if self.tls.is_some() { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.hostname, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
