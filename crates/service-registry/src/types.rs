//! JSON request/response bodies of the HTTP gateway.
//!
//! Records themselves are serialized straight from
//! [`registry_common::ServiceRecord`]; only the inbound side needs its own
//! shape, because a request body is untrusted and must go through validation
//! before it can become a record.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/register`.
///
/// `port` is accepted as a wide integer so that out-of-range values reach the
/// registry's validation. Bodies that do not decode at all (missing fields,
/// non-integer ports, broken JSON) are turned into the same 400 `{error}`
/// response by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub version: String,
    pub host: String,
    pub port: i64,
}

/// Response from a registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
