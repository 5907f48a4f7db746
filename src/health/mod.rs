//! Liveness report.
//!
//! `GET /health` echoes the non-secret parts of the configuration so an
//! operator can tell at a glance whether the upstream key is loaded and
//! which provider host is targeted. It never requires the shared secret.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

pub const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub ok: bool,
    pub service: &'static str,
    pub has_upstream_key: bool,
    pub base_url: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        ok: true,
        service: SERVICE_NAME,
        has_upstream_key: state.config.upstream.api_key().is_some(),
        base_url: state.config.upstream.base_url.clone(),
    })
}
