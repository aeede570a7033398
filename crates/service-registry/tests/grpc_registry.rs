//! Drives a real registry server over loopback gRPC with `RegistryClient`.

use registry_common::{Error, ServiceIdentity, ServiceRecord};
use service_registry::grpc::error_from_status;
use service_registry::pb::registry_service_client::RegistryServiceClient;
use service_registry::pb::ServiceDefinition;
use service_registry::transport::{ClientTls, ServerTls};
use service_registry::{ClientConfig, RegistryClient, RegistryConfig, RegistryServer};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    port: u16,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<registry_common::Result<()>>,
}

impl TestServer {
    async fn start(tls: Option<ServerTls>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let config = RegistryConfig {
            hostname: "127.0.0.1".to_string(),
            port,
            http_port: None,
            tls,
        };
        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            RegistryServer::new(config)
                .serve_with_listener(listener, async move {
                    let _ = stopped.await;
                })
                .await
        });

        Self {
            port,
            stop: Some(stop),
            handle,
        }
    }

    fn client_config(&self, tls: Option<ClientTls>) -> ClientConfig {
        ClientConfig {
            hostname: "127.0.0.1".to_string(),
            port: self.port,
            tls,
            timeout_secs: 5,
        }
    }

    async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.handle.await.unwrap().unwrap();
    }
}

fn record(name: &str, version: &str, host: &str, port: u16) -> ServiceRecord {
    ServiceRecord::new(ServiceIdentity::new(name, version).unwrap(), host, port).unwrap()
}

#[tokio::test]
async fn test_end_to_end_register_and_query() {
    let server = TestServer::start(None).await;
    let mut client = RegistryClient::connect(&server.client_config(None))
        .await
        .unwrap();

    let model = record("my_super_model", "1.2.3", "my_server", 12345);
    assert_eq!(client.register(&model).await.unwrap(), "200 OK");

    let banana = ServiceIdentity::new("banana", "1.2.3").unwrap();
    match client.query(&banana).await {
        Err(Error::NotFound { identity }) => assert_eq!(identity, banana),
        other => panic!("Expected NotFound, got {:?}", other),
    }

    let found = client.query(model.identity()).await.unwrap();
    assert_eq!(found, model);

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_last_writer_wins_over_grpc() {
    let server = TestServer::start(None).await;
    let mut client = RegistryClient::connect(&server.client_config(None))
        .await
        .unwrap();

    client.register(&record("m", "1", "h1", 1000)).await.unwrap();
    client.register(&record("m", "1", "h2", 2000)).await.unwrap();

    let identity = ServiceIdentity::new("m", "1").unwrap();
    assert_eq!(client.query(&identity).await.unwrap().address(), "h2:2000");

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients() {
    let server = TestServer::start(None).await;
    let client = RegistryClient::connect(&server.client_config(None))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..16u16 {
        let mut client = client.clone();
        handles.push(tokio::spawn(async move {
            let rec = record("m", &i.to_string(), &format!("h{}", i), 1000 + i);
            client.register(&rec).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut handles = Vec::new();
    for i in 0..16u16 {
        let mut client = client.clone();
        handles.push(tokio::spawn(async move {
            let identity = ServiceIdentity::new("m", i.to_string()).unwrap();
            let found = client.query(&identity).await.unwrap();
            assert_eq!(found, record("m", &i.to_string(), &format!("h{}", i), 1000 + i));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_tls_round_trip() {
    let server = TestServer::start(Some(ServerTls::default())).await;
    let tls = ClientTls::default();
    let mut client = RegistryClient::connect(&server.client_config(Some(tls)))
        .await
        .unwrap();

    let model = record("my_super_model", "1.2.3", "my_server", 12345);
    client.register(&model).await.unwrap();
    assert_eq!(client.query(model.identity()).await.unwrap(), model);

    drop(client);
    server.stop().await;
}

#[tokio::test]
async fn test_validation_errors_keep_their_kind_over_grpc() {
    let server = TestServer::start(None).await;
    let mut raw = RegistryServiceClient::connect(server.client_config(None).endpoint_uri())
        .await
        .unwrap();
    let identity = ServiceIdentity::new("m", "1").unwrap();

    let status = raw
        .register(ServiceDefinition {
            model_name: "m".to_string(),
            model_version: String::new(),
            hostname: "h".to_string(),
            port: 1,
        })
        .await
        .unwrap_err();
    match error_from_status(status, &identity) {
        Error::InvalidIdentity { field, .. } => assert_eq!(field, "version"),
        other => panic!("Expected InvalidIdentity, got {:?}", other),
    }

    let status = raw
        .register(ServiceDefinition {
            model_name: "m".to_string(),
            model_version: "1".to_string(),
            hostname: "h".to_string(),
            port: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        error_from_status(status, &identity),
        Error::InvalidLocation { .. }
    ));

    drop(raw);
    server.stop().await;
}
