//! HTTP API module for the MikroTik Manager gateway
//!
//! The dashboard's only server dependency: JSON over HTTP mapping requests
//! onto the router manager.
//!
//! # Endpoints
//! - `GET /` — server identity, status and transport availability
//! - `POST /api/routers/connect` — establish a session
//! - `GET /api/routers/{id}/address-lists` — firewall address lists
//! - `POST /api/routers/{id}/address-lists/{listName}/addresses` — add entry
//! - `DELETE /api/routers/{id}/address-lists/{listName}/addresses/{address}` — remove entry
//! - `POST /api/routers/{id}/backup` — trigger a device backup
//! - `POST /api/routers/{id}/command` — run a raw command
//! - `POST /api/routers/{id}/disconnect` — close the session

pub mod handlers;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;

use crate::config::Config;
use crate::manager::RouterManager;

/// Application state shared with endpoints
pub struct AppState {
    pub config: Config,
    pub manager: RouterManager,
}

/// Creates the main Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::server_status))
        .route("/api/routers/connect", post(handlers::connect_router))
        .route(
            "/api/routers/{id}/address-lists",
            get(handlers::get_address_lists),
        )
        .route(
            "/api/routers/{id}/address-lists/{list_name}/addresses",
            post(handlers::add_address),
        )
        .route(
            "/api/routers/{id}/address-lists/{list_name}/addresses/{address}",
            delete(handlers::remove_address),
        )
        .route("/api/routers/{id}/backup", post(handlers::create_backup))
        .route("/api/routers/{id}/command", post(handlers::run_command))
        .route(
            "/api/routers/{id}/disconnect",
            post(handlers::disconnect_router),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_create_router() {
        let config = Config::default();
        let manager = RouterManager::with_default_transports(config.transports);
        let state = Arc::new(AppState { config, manager });

        let _router = create_router(state);
        // If we get here without panicking, the router was created successfully
    }
}
