//! Strict decoding of JSON request bodies.
//!
//! Body is read up to a size limit, must hold exactly one JSON value and
//! must not contain keys unknown to the target type (target types opt in with
//! `#[serde(deny_unknown_fields)]`). Failures are reported as [`DecodeError`]
//! with messages meant for API clients.

use axum::{
    body::Body,
    extract::{FromRequest, Request},
};
use futures::StreamExt as _;
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use tracing::debug;

use crate::{error::ApiError, state::AppState};

pub const DEFAULT_MAX_BODY_SIZE: usize = 1_048_576;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("body contains badly-formed JSON (at character {offset})")]
    MalformedSyntax { offset: usize },

    #[error("body contains badly-formed JSON")]
    UnexpectedTermination,

    #[error("{}", type_mismatch_message(.field.as_deref(), *.offset))]
    TypeMismatch {
        field: Option<String>,
        offset: usize,
    },

    #[error("body must not be empty")]
    EmptyBody,

    #[error("body contains unknown key \"{0}\"")]
    UnknownField(String),

    #[error("body must not be larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("body must contain a single JSON value")]
    MultipleValues,

    /// Decoder was used in a way that cannot succeed for any input
    #[error("JSON decoder misuse: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

fn type_mismatch_message(field: Option<&str>, offset: usize) -> String {
    match field {
        Some(field) => format!("body contains incorrect JSON type for field \"{field}\""),
        None => format!("body contains incorrect JSON type (at character {offset})"),
    }
}

/// Decodes exactly one JSON object of type `T` from `body`.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    let Some(start) = body
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
    else {
        return Err(DecodeError::EmptyBody);
    };

    // derived struct impls also accept arrays, filling fields by position
    if body[start] == b'[' {
        debug!("JSON body root is an array");
        return Err(DecodeError::TypeMismatch {
            field: None,
            offset: start + 1,
        });
    }

    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| classify_error(body, e))?;

    // anything but trailing whitespace means a second value or garbage
    deserializer
        .end()
        .map_err(|_| DecodeError::MultipleValues)?;

    Ok(value)
}

fn classify_error(body: &[u8], error: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    let path = error.path().to_string();
    let inner = error.into_inner();
    let offset = byte_offset(body, inner.line(), inner.column());
    let message = bare_message(&inner);
    debug!("JSON decoding failed at {path} (offset {offset}): {message}");

    match inner.classify() {
        Category::Syntax => DecodeError::MalformedSyntax { offset },
        Category::Eof => DecodeError::UnexpectedTermination,
        Category::Io => DecodeError::Internal(message),
        Category::Data => {
            if let Some(key) = unknown_field(&message) {
                DecodeError::UnknownField(key.to_string())
            } else if message.starts_with("invalid type") || message.starts_with("invalid value")
            {
                let field = if path == "." { None } else { Some(path) };
                DecodeError::TypeMismatch { field, offset }
            } else {
                DecodeError::Other(message)
            }
        }
    }
}

/// Error message without position suffix, which serde_json appends.
fn bare_message(error: &serde_json::Error) -> String {
    let message = error.to_string();
    let suffix = format!(" at line {} column {}", error.line(), error.column());
    match message.strip_suffix(&suffix) {
        Some(bare) => bare.to_string(),
        None => message,
    }
}

/// Key from serde's "unknown field `key`, expected ..." message, the key
/// itself may contain backticks.
fn unknown_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("unknown field `")?;
    let end = rest
        .rfind("`, expected")
        .or_else(|| rest.rfind("`, there are no fields"))
        .or_else(|| rest.rfind('`'))?;
    Some(&rest[..end])
}

/// Converts line/column position (both 1 based) into offset from the start of body.
fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    let line_start = if line <= 1 {
        0
    } else {
        body.iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .nth(line - 2)
            .map(|(i, _)| i + 1)
            .unwrap_or(body.len())
    };
    (line_start + column).min(body.len())
}

/// Reads whole body, failing as soon as it grows over `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Vec<u8>, DecodeError> {
    let mut stream = body.into_data_stream();
    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DecodeError::Other(format!("failed to read body: {e}")))?;
        if data.len() + chunk.len() > limit {
            debug!("Request body is over limit {limit}");
            return Err(DecodeError::TooLarge { limit });
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// JSON body extractor using [`decode_json`], body size is limited by
/// [`AppConfig::max_body_size`](crate::state::AppConfig).
#[derive(Debug, Clone)]
pub struct StrictJson<T>(pub T);

impl<T> FromRequest<AppState> for StrictJson<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let limit = state.config().max_body_size;
        let body = read_body(req.into_body(), limit).await?;
        let value = decode_json(&body)?;
        Ok(StrictJson(value))
    }
}
