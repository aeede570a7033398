//! gRPC client for the service registry.
//!
//! ```rust,ignore
//! let mut client = RegistryClient::connect(&ClientConfig::default()).await?;
//!
//! let identity = ServiceIdentity::new("my_super_model", "1.2.3")?;
//! match client.query(&identity).await {
//!     Ok(record) => println!("{} is at {}", identity, record.address()),
//!     Err(e) if e.is_not_found() => println!("{} is not registered yet", identity),
//!     Err(e) => return Err(e),
//! }
//! ```

use registry_common::{Error, Result, ServiceIdentity, ServiceRecord};
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, error, info};

use crate::config::ClientConfig;
use crate::grpc::error_from_status;
use crate::pb::registry_service_client::RegistryServiceClient;
use crate::pb::{QueryService, ServiceDefinition};
use crate::transport::describe;

/// Registry client.
///
/// Cloning is cheap; clones share the underlying channel.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    inner: RegistryServiceClient<Channel>,
}

impl RegistryClient {
    /// Connects to the registry described by `config`.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let uri = config.endpoint_uri();
        info!("Connecting to registry at {}", describe(&uri, config.tls.is_some()));

        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|e| Error::transport(format!("invalid registry address '{}': {}", uri, e)))?
            .timeout(config.timeout())
            .connect_timeout(config.timeout());

        if let Some(tls) = &config.tls {
            debug!(
                "Using CA {} and server name {}",
                tls.ca_path().display(),
                tls.domain_name()
            );
            endpoint = endpoint
                .tls_config(tls.load()?)
                .map_err(|e| Error::transport(format!("invalid TLS configuration: {}", e)))?;
        }

        let channel = endpoint.connect().await.map_err(|e| {
            error!("Failed to connect to '{}': {:?}", uri, e);
            Error::transport(format!("failed to connect to '{}': {}", uri, e))
        })?;

        Ok(Self::from_channel(channel))
    }

    /// Wraps an existing channel.
    pub fn from_channel(channel: Channel) -> Self {
        Self {
            inner: RegistryServiceClient::new(channel),
        }
    }

    /// Registers `record`, returning the server's acknowledgement.
    pub async fn register(&mut self, record: &ServiceRecord) -> Result<String> {
        debug!("Registering {} at {}", record.identity(), record.address());

        let response = self
            .inner
            .register(ServiceDefinition::from(record))
            .await
            .map_err(|status| error_from_status(status, record.identity()))?;

        Ok(response.into_inner().message)
    }

    /// Resolves `identity`; [`Error::NotFound`] when nothing is registered.
    pub async fn query(&mut self, identity: &ServiceIdentity) -> Result<ServiceRecord> {
        debug!("Querying {}", identity);

        let response = self
            .inner
            .query(QueryService::from(identity))
            .await
            .map_err(|status| error_from_status(status, identity))?;

        ServiceRecord::try_from(response.into_inner())
    }
}
