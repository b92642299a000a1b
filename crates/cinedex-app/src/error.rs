use std::any::Any;

use axum::response::{IntoResponse, Response};
use cinedex_types::ValidationErrors;
use http::{header, HeaderValue, Method, StatusCode};
use tracing::{debug, error};

use crate::{decode::DecodeError, envelope::Envelope};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(#[from] DecodeError),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Failed validation: {0}")]
    FailedValidation(#[from] ValidationErrors),

    #[error("the requested resource could not be found")]
    NotFound,

    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),

    #[error("unable to update the record due to an edit conflict, please try again")]
    EditConflict,

    #[error("Database error: {0}")]
    DatabaseError(cinedex_dal::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<cinedex_dal::Error> for ApiError {
    fn from(value: cinedex_dal::Error) -> Self {
        match value {
            cinedex_dal::Error::RecordNotFound(what) => {
                debug!("{what} not found");
                ApiError::NotFound
            }
            cinedex_dal::Error::EditConflict { .. } => ApiError::EditConflict,
            other => ApiError::DatabaseError(other),
        }
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(DecodeError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::BadRequest(DecodeError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::EditConflict => StatusCode::CONFLICT,
            ApiError::DatabaseError(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            ApiError::FailedValidation(errors) => {
                debug!("Validation failed: {errors}");
                (status, Envelope::new("error", errors)).into_response()
            }
            other if status.is_server_error() => {
                error!("Request failed: {other}");
                (status, Envelope::new("error", SERVER_ERROR_MESSAGE)).into_response()
            }
            other => (status, Envelope::new("error", other.to_string())).into_response(),
        }
    }
}

/// Response for a handler that panicked, connection is not reused afterwards.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    error!("Request handler panicked: {details}");

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Envelope::new("error", SERVER_ERROR_MESSAGE),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
