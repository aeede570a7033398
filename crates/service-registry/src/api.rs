//! HTTP/JSON gateway using axum.
//!
//! Exposes the same Register/Query contract as the gRPC service, plus a
//! listing and a health endpoint:
//!
//! | method | path                              | result                    |
//! |--------|-----------------------------------|---------------------------|
//! | POST   | `/api/v1/register`                | 200, or 400 on bad input  |
//! | GET    | `/api/v1/query/{name}/{version}`  | 200 record, 404, or 400   |
//! | GET    | `/api/v1/services`                | 200 list of records       |
//! | GET    | `/api/v1/health`                  | 200 `OK`                  |

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use registry_common::{Error, ServiceRecord};
use tracing::{info, warn};

use crate::{
    service::RegistryService,
    types::{ErrorResponse, RegisterRequest, RegisterResponse},
};

/// Creates the API router.
pub fn create_router(service: RegistryService) -> Router {
    Router::new()
        .route("/api/v1/register", post(register_handler))
        .route("/api/v1/query/{name}/{version}", get(query_handler))
        .route("/api/v1/services", get(list_handler))
        .route("/api/v1/health", get(health_handler))
        .with_state(service)
}

async fn register_handler(
    State(service): State<RegistryService>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let Json(req) = payload?;
    let message = service.register(&req.name, &req.version, &req.host, req.port)?;

    Ok(Json(RegisterResponse {
        success: true,
        message: Some(message),
    }))
}

async fn query_handler(
    State(service): State<RegistryService>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<ServiceRecord>, ApiError> {
    let record = service.query(&name, &version)?;
    Ok(Json(record.as_ref().clone()))
}

async fn list_handler(State(service): State<RegistryService>) -> Json<Vec<ServiceRecord>> {
    info!("Listing all services");
    Json(
        service
            .list()
            .iter()
            .map(|record| record.as_ref().clone())
            .collect(),
    )
}

async fn health_handler() -> &'static str {
    "OK"
}

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else if err.is_invalid_request() {
            ApiError::BadRequest(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

/// Malformed or incomplete bodies are reported like any other bad input.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!("API error: {} - {}", status, message);
        } else {
            warn!("API error: {} - {}", status, message);
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
