//! gRPC binding of the registry service using `tonic`.
//!
//! The generated `RegistryService` trait is implemented by
//! [`GrpcRegistryService`], a thin adapter that decodes protobuf messages,
//! calls [`crate::service::RegistryService`] and converts registry errors
//! into gRPC status codes:
//!
//! | registry error                        | gRPC status        |
//! |---------------------------------------|--------------------|
//! | `InvalidIdentity`, `InvalidLocation`  | `INVALID_ARGUMENT` |
//! | `NotFound`                            | `NOT_FOUND`        |
//! | `Transport`                           | `UNAVAILABLE`      |
//! | anything else                         | `INTERNAL`         |
//!
//! The status also carries the error kind in the `x-registry-error` metadata
//! entry (plus `x-registry-field` and `x-registry-reason` for validation
//! errors), so [`error_from_status`] can rebuild the exact variant without
//! parsing the human-readable message.

use registry_common::{checked_port, Error, ServiceIdentity, ServiceRecord};
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::{Code, Request, Response, Status};

use crate::pb::registry_service_server::{RegistryService as RegistryRpc, RegistryServiceServer};
use crate::pb::{QueryService, RegisterResponse, ServiceDefinition};
use crate::service::RegistryService;

/// gRPC adapter over [`RegistryService`].
#[derive(Clone)]
pub struct GrpcRegistryService {
    service: RegistryService,
}

impl GrpcRegistryService {
    pub fn new(service: RegistryService) -> Self {
        Self { service }
    }

    /// Wraps the adapter into a tonic service ready for `add_service`.
    pub fn into_server(self) -> RegistryServiceServer<Self> {
        RegistryServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl RegistryRpc for GrpcRegistryService {
    async fn register(
        &self,
        request: Request<ServiceDefinition>,
    ) -> Result<Response<RegisterResponse>, Status> {
        let definition = request.into_inner();

        let message = self
            .service
            .register(
                &definition.model_name,
                &definition.model_version,
                &definition.hostname,
                i64::from(definition.port),
            )
            .map_err(status_from_error)?;

        Ok(Response::new(RegisterResponse { message }))
    }

    async fn query(
        &self,
        request: Request<QueryService>,
    ) -> Result<Response<ServiceDefinition>, Status> {
        let query = request.into_inner();

        let record = self
            .service
            .query(&query.model_name, &query.model_version)
            .map_err(status_from_error)?;

        Ok(Response::new(ServiceDefinition::from(record.as_ref())))
    }
}

pub const ERROR_KIND_KEY: &str = "x-registry-error";
pub const ERROR_FIELD_KEY: &str = "x-registry-field";
pub const ERROR_REASON_KEY: &str = "x-registry-reason";

const KIND_INVALID_IDENTITY: &str = "invalid-identity";
const KIND_INVALID_LOCATION: &str = "invalid-location";
const KIND_NOT_FOUND: &str = "not-found";
const KIND_TRANSPORT: &str = "transport";
const KIND_INTERNAL: &str = "internal";

/// Maps a registry error onto the gRPC status sent to the caller.
pub fn status_from_error(err: Error) -> Status {
    let (code, kind) = match &err {
        Error::InvalidIdentity { .. } => (Code::InvalidArgument, KIND_INVALID_IDENTITY),
        Error::InvalidLocation { .. } => (Code::InvalidArgument, KIND_INVALID_LOCATION),
        Error::NotFound { .. } => (Code::NotFound, KIND_NOT_FOUND),
        Error::Transport(_) => (Code::Unavailable, KIND_TRANSPORT),
        Error::Configuration(_) | Error::Io(_) => (Code::Internal, KIND_INTERNAL),
    };

    let mut metadata = MetadataMap::new();
    metadata.insert(ERROR_KIND_KEY, MetadataValue::from_static(kind));
    match &err {
        Error::InvalidIdentity { field, reason } => {
            metadata.insert(ERROR_FIELD_KEY, MetadataValue::from_static(*field));
            insert_reason(&mut metadata, reason);
        }
        Error::InvalidLocation { reason } => insert_reason(&mut metadata, reason),
        _ => {}
    }

    Status::with_metadata(code, err.to_string(), metadata)
}

// Reasons that are not valid header text are left out; the message still has them.
fn insert_reason(metadata: &mut MetadataMap, reason: &str) {
    if let Ok(value) = MetadataValue::try_from(reason) {
        metadata.insert(ERROR_REASON_KEY, value);
    }
}

/// Maps a status received by a client back onto a registry error.
///
/// `identity` is the identity the call was about; it is needed to rebuild
/// [`Error::NotFound`] so callers can match on it. Statuses without the
/// registry's error metadata are reported as [`Error::Transport`].
pub fn error_from_status(status: Status, identity: &ServiceIdentity) -> Error {
    let metadata = status.metadata();
    let kind = metadata.get(ERROR_KIND_KEY).and_then(|v| v.to_str().ok());
    let reason = || {
        metadata
            .get(ERROR_REASON_KEY)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_else(|| status.message())
            .to_string()
    };

    match (status.code(), kind) {
        (Code::NotFound, _) => Error::not_found(identity.clone()),
        (Code::InvalidArgument, Some(KIND_INVALID_IDENTITY)) => {
            let field = metadata.get(ERROR_FIELD_KEY).and_then(|v| v.to_str().ok());
            match field.and_then(identity_field) {
                Some(field) => Error::invalid_identity(field, reason()),
                None => Error::transport(format!(
                    "malformed registry status: {:?}: {}",
                    status.code(),
                    status.message()
                )),
            }
        }
        (Code::InvalidArgument, Some(KIND_INVALID_LOCATION)) => Error::invalid_location(reason()),
        _ => Error::transport(format!("{:?}: {}", status.code(), status.message())),
    }
}

fn identity_field(field: &str) -> Option<&'static str> {
    match field {
        "name" => Some("name"),
        "version" => Some("version"),
        _ => None,
    }
}

impl From<&ServiceRecord> for ServiceDefinition {
    fn from(record: &ServiceRecord) -> Self {
        Self {
            model_name: record.name().to_string(),
            model_version: record.version().to_string(),
            hostname: record.host().to_string(),
            port: i32::from(record.port()),
        }
    }
}

impl From<&ServiceIdentity> for QueryService {
    fn from(identity: &ServiceIdentity) -> Self {
        Self {
            model_name: identity.name().to_string(),
            model_version: identity.version().to_string(),
        }
    }
}

impl TryFrom<ServiceDefinition> for ServiceRecord {
    type Error = Error;

    fn try_from(definition: ServiceDefinition) -> Result<Self, Self::Error> {
        let identity = ServiceIdentity::new(definition.model_name, definition.model_version)?;
        ServiceRecord::new(identity, definition.hostname, checked_port(definition.port)?)
    }
}
