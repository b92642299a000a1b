use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::method_not_allowed;
use crate::state::AppState;

pub const BASE_PATH: &str = "/v1/healthcheck";

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub status: &'static str,
    pub system_info: SystemInfo,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub environment: String,
    pub version: &'static str,
}

pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthInfo> {
    Json(HealthInfo {
        status: "available",
        system_info: SystemInfo {
            environment: state.config().environment.clone(),
            version: env!("CARGO_PKG_VERSION"),
        },
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(healthcheck))
        .method_not_allowed_fallback(method_not_allowed)
}
