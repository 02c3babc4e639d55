//! API error handling
//!
//! Every failure leaves the API as `{"_type": "Error", "errorIdentifier",
//! "message"}` with a matching status code.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use nc_core::error::{NcError, ValidationErrors};
use serde::Serialize;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(ValidationErrors),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn identifier(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "urn:ncops:api:v1:errors:NotFound",
            ApiError::Validation(_) => "urn:ncops:api:v1:errors:PropertyConstraintViolation",
            ApiError::Unauthorized(_) => "urn:ncops:api:v1:errors:Unauthenticated",
            ApiError::Forbidden(_) => "urn:ncops:api:v1:errors:MissingPermission",
            ApiError::BadRequest(_) => "urn:ncops:api:v1:errors:InvalidRequestBody",
            ApiError::Conflict(_) => "urn:ncops:api:v1:errors:UpdateConflict",
            ApiError::BadGateway(_) => "urn:ncops:api:v1:errors:ExternalServiceFailed",
            ApiError::Internal(_) => "urn:ncops:api:v1:errors:InternalError",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation(errors) => errors.full_messages().join(", "),
            ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::BadGateway(msg)
            | ApiError::Internal(msg) => msg.clone(),
        }
    }
}

impl From<NcError> for ApiError {
    fn from(err: NcError) -> Self {
        match err {
            NcError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            NcError::Unauthorized { message } => ApiError::Unauthorized(message),
            NcError::Forbidden { message } => ApiError::Forbidden(message),
            NcError::Validation(errors) => ApiError::Validation(errors),
            NcError::Conflict { message } => ApiError::Conflict(message),
            NcError::ExternalService { service, message } => {
                tracing::warn!(service = %service, error = %message, "External service failed");
                ApiError::BadGateway(format!("{service} request failed: {message}"))
            }
            NcError::Database(msg) | NcError::Config(msg) | NcError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                ApiError::Internal("An internal error occurred".into())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    #[serde(rename = "_type")]
    type_name: &'static str,
    #[serde(rename = "errorIdentifier")]
    error_identifier: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            type_name: "Error",
            error_identifier: self.identifier(),
            message: self.message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
