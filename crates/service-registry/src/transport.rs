//! Transport security for the registry.
//!
//! TLS is optional. When it is enabled the server needs a certificate/key
//! pair and the client needs the CA certificate plus the name it expects the
//! server certificate to carry. Every path may be left unset, in which case
//! the PEM files bundled under this crate's `data/x509/` directory are used.
//! Relative paths are resolved against that same directory.

use registry_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tonic::transport::{Certificate, ClientTlsConfig, Identity, ServerTlsConfig};
use tracing::debug;

pub const DEFAULT_SERVER_CERT: &str = "x509/server_cert.pem";
pub const DEFAULT_SERVER_KEY: &str = "x509/server_key.pem";
pub const DEFAULT_CA_CERT: &str = "x509/ca_cert.pem";

/// Name the client expects in the server certificate unless told otherwise.
pub const DEFAULT_SERVER_HOST_OVERRIDE: &str = "x.test.example.com";

/// Resolves `rel` against the bundled data directory.
///
/// Absolute paths are returned unchanged.
pub fn data_path(rel: impl AsRef<Path>) -> PathBuf {
    let rel = rel.as_ref();
    if rel.is_absolute() {
        return rel.to_path_buf();
    }
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join(rel)
}

fn read_pem(kind: &str, path: &Path) -> Result<Vec<u8>> {
    debug!("Loading TLS {} from {}", kind, path.display());
    std::fs::read(path).map_err(|e| {
        Error::configuration(format!("failed to read TLS {} {}: {}", kind, path.display(), e))
    })
}

/// Server certificate and key locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
}

impl ServerTls {
    pub fn cert_path(&self) -> PathBuf {
        data_path(self.cert_file.as_deref().unwrap_or(Path::new(DEFAULT_SERVER_CERT)))
    }

    pub fn key_path(&self) -> PathBuf {
        data_path(self.key_file.as_deref().unwrap_or(Path::new(DEFAULT_SERVER_KEY)))
    }

    /// Reads the PEM files and builds the tonic server TLS configuration.
    pub fn load(&self) -> Result<ServerTlsConfig> {
        let cert = read_pem("certificate", &self.cert_path())?;
        let key = read_pem("key", &self.key_path())?;
        Ok(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
    }
}

/// Trust anchor and expected server identity for clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTls {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_host_override: Option<String>,
}

impl ClientTls {
    pub fn ca_path(&self) -> PathBuf {
        data_path(self.ca_file.as_deref().unwrap_or(Path::new(DEFAULT_CA_CERT)))
    }

    pub fn domain_name(&self) -> &str {
        self.server_host_override
            .as_deref()
            .unwrap_or(DEFAULT_SERVER_HOST_OVERRIDE)
    }

    /// Reads the CA certificate and builds the tonic client TLS configuration.
    pub fn load(&self) -> Result<ClientTlsConfig> {
        let ca = read_pem("CA certificate", &self.ca_path())?;
        Ok(ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(ca))
            .domain_name(self.domain_name()))
    }
}

/// Human-readable description of a listener or target.
pub fn describe(address: &str, tls: bool) -> String {
    if tls {
        format!("{} (TLS)", address)
    } else {
        format!("{} (plaintext)", address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_path_resolution() {
        let resolved = data_path("x509/ca_cert.pem");
        assert!(resolved.ends_with("data/x509/ca_cert.pem"));
        assert!(resolved.is_absolute());

        let absolute = PathBuf::from("/etc/ssl/cert.pem");
        assert_eq!(data_path(&absolute), absolute);
    }

    #[test]
    fn test_server_tls_defaults() {
        let tls = ServerTls::default();
        assert!(tls.cert_path().ends_with(DEFAULT_SERVER_CERT));
        assert!(tls.key_path().ends_with(DEFAULT_SERVER_KEY));
    }

    #[test]
    fn test_bundled_material_loads() {
        assert!(ServerTls::default().load().is_ok());
        assert!(ClientTls::default().load().is_ok());
    }

    #[test]
    fn test_missing_material_is_configuration_error() {
        let tls = ServerTls {
            cert_file: Some(PathBuf::from("/nonexistent/server_cert.pem")),
            key_file: None,
        };

        match tls.load() {
            Err(Error::Configuration(msg)) => assert!(msg.contains("/nonexistent/server_cert.pem")),
            other => panic!("Expected configuration error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_client_tls_domain() {
        assert_eq!(ClientTls::default().domain_name(), DEFAULT_SERVER_HOST_OVERRIDE);

        let tls = ClientTls {
            ca_file: None,
            server_host_override: Some("localhost".to_string()),
        };
        assert_eq!(tls.domain_name(), "localhost");
    }

    #[test]
    fn test_describe() {
        assert_eq!(describe("localhost:50051", false), "localhost:50051 (plaintext)");
        assert_eq!(describe("localhost:50051", true), "localhost:50051 (TLS)");
    }
}
