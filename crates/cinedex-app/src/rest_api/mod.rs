use axum::{
    extract::{FromRequestParts, Path},
    RequestPartsExt as _,
};
use http::{request::Parts, HeaderName, Method};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

pub mod health;
pub mod movie;

pub const EXPECTED_VERSION_HEADER: HeaderName = HeaderName::from_static("x-expected-version");

/// Positive record id from the `{id}` path segment.
///
/// Anything else (not a number, zero, negative) is rejected as not found,
/// so it cannot be told apart from a missing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for ResourceId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = parts
            .extract::<Path<String>>()
            .await
            .map_err(|_| ApiError::NotFound)?;
        parse_id(&raw).map(ResourceId)
    }
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => {
            debug!("Invalid resource id {raw:?}");
            Err(ApiError::NotFound)
        }
    }
}

/// Version the client expects the record to have, from `X-Expected-Version` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedVersion(pub Option<i64>);

impl<S: Send + Sync> FromRequestParts<S> for ExpectedVersion {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(&EXPECTED_VERSION_HEADER) else {
            return Ok(ExpectedVersion(None));
        };
        value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .map(|v| ExpectedVersion(Some(v)))
            .ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "invalid {EXPECTED_VERSION_HEADER} header value"
                ))
            })
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed(method: Method) -> ApiError {
    ApiError::MethodNotAllowed(method)
}
