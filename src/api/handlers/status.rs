use axum::{Json, extract::State};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::AppState;
use crate::config::TransportToggles;

/// Server name the dashboard checks verbatim during its liveness probe
pub const SERVER_NAME: &str = "MikroTik Manager API Server";

/// GET /
///
/// Identity/status payload. The dashboard treats any other shape as
/// "backend offline" and gates all other calls on it.
pub async fn server_status(State(state): State<Arc<AppState>>) -> Json<Value> {
    let toggles = state.config.transports;
    Json(json!({
        "name": SERVER_NAME,
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "connect": "POST /api/routers/connect",
            "addressLists": "GET /api/routers/{id}/address-lists",
            "addAddress": "POST /api/routers/{id}/address-lists/{listName}/addresses",
            "removeAddress": "DELETE /api/routers/{id}/address-lists/{listName}/addresses/{address}",
            "backup": "POST /api/routers/{id}/backup",
            "command": "POST /api/routers/{id}/command",
            "disconnect": "POST /api/routers/{id}/disconnect",
        },
        "transports": {
            "rest": TransportToggles::status(toggles.rest),
            "api": TransportToggles::status(toggles.binary_api),
            "ssh": TransportToggles::status(toggles.ssh),
        },
    }))
}
