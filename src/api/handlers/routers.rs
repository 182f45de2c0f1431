use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::api::AppState;
use crate::error::Result;
use crate::types::{ConnectionStatus, RouterCredential};

use super::SuccessResponse;

/// POST /api/routers/connect
///
/// Tries the transports in priority order and commits the first success.
pub async fn connect_router(
    State(state): State<Arc<AppState>>,
    Json(credential): Json<RouterCredential>,
) -> Result<Json<ConnectionStatus>> {
    let status = state.manager.connect(&credential).await?;
    Ok(Json(status))
}

/// POST /api/routers/{id}/disconnect
///
/// Always succeeds, even for ids that were never connected.
pub async fn disconnect_router(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Json<SuccessResponse> {
    state.manager.disconnect(id).await;
    SuccessResponse::ok()
}
