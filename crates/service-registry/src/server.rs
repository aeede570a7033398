//! Service registry server implementation.
//!
//! One [`RegistryService`] is shared by the gRPC listener and, when an HTTP
//! port is configured, by the axum gateway. Both stop when the shutdown
//! future passed to [`RegistryServer::run_until`] resolves.

use registry_common::{Error, Result};
use std::future::Future;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;
use tracing::{error, info};

use crate::{
    api::create_router,
    config::RegistryConfig,
    grpc::GrpcRegistryService,
    service::RegistryService,
    storage::Registry,
    transport::describe,
};

/// Service registry server.
pub struct RegistryServer {
    service: RegistryService,
    config: RegistryConfig,
}

impl RegistryServer {
    /// Creates a server with an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            service: RegistryService::new(Registry::new()),
            config,
        }
    }

    /// Returns a reference to the registry.
    pub fn registry(&self) -> &Registry {
        self.service.registry()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Runs until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.grpc_socket_addr()?;
        info!("Binding gRPC listener to {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::transport(format!("failed to listen on {}: {}", addr, e)))?;

        self.serve_with_listener(listener, shutdown).await
    }

    /// Serves gRPC on an already bound listener.
    ///
    /// Binding to port 0 and passing the listener here lets callers learn the
    /// actual port before the server starts.
    pub async fn serve_with_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;

        let mut builder = Server::builder();
        if let Some(tls) = &self.config.tls {
            info!(
                "Loading TLS identity from {} / {}",
                tls.cert_path().display(),
                tls.key_path().display()
            );
            builder = builder
                .tls_config(tls.load()?)
                .map_err(|e| Error::transport(format!("invalid TLS configuration: {}", e)))?;
        }

        let (stop_tx, stop_rx) = watch::channel(());
        let http_task = self.spawn_http_gateway(stop_rx).await?;

        info!(
            "Starting registry server on {}",
            describe(&local_addr.to_string(), self.config.tls.is_some())
        );

        let result = builder
            .add_service(GrpcRegistryService::new(self.service.clone()).into_server())
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async move {
                shutdown.await;
                info!("Shutting down registry server");
                let _ = stop_tx.send(());
            })
            .await
            .map_err(|e| {
                error!("gRPC server failed: {}", e);
                Error::transport(format!("gRPC server failed: {}", e))
            });

        if let Some(task) = http_task {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("HTTP gateway failed: {}", e),
                Err(e) => error!("HTTP gateway task panicked: {}", e),
            }
        }

        result
    }

    async fn spawn_http_gateway(
        &self,
        mut stop_rx: watch::Receiver<()>,
    ) -> Result<Option<tokio::task::JoinHandle<std::io::Result<()>>>> {
        let Some(addr) = self.config.http_socket_addr()? else {
            return Ok(None);
        };

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::transport(format!("failed to listen on {}: {}", addr, e)))?;
        info!("HTTP gateway listening on {}", listener.local_addr()?);

        let router = create_router(self.service.clone());
        Ok(Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    // Resolves on the stop signal, or when the gRPC side is gone.
                    let _ = stop_rx.changed().await;
                })
                .await
        })))
    }
}

/// Resolves on SIGINT or SIGTERM (Ctrl+C elsewhere).
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM signal"),
                    _ = sigint.recv() => info!("Received SIGINT signal"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to install signal handlers, falling back to Ctrl+C: {}", e);
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C signal");
}
