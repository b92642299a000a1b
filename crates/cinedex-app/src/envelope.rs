use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{ser::SerializeMap as _, Serialize, Serializer};

/// Single key JSON object wrapping response payload, e.g. `{"movie": {...}}`
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    key: &'static str,
    payload: T,
}

impl<T> Envelope<T> {
    pub fn new(key: &'static str, payload: T) -> Self {
        Envelope { key, payload }
    }

    pub fn into_inner(self) -> T {
        self.payload
    }
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.key, &self.payload)?;
        map.end()
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
