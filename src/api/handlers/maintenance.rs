use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::error::Result;
use crate::types::{BackupResult, CommandResult};

#[derive(Debug, Deserialize)]
pub struct BackupRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

/// POST /api/routers/{id}/backup
pub async fn create_backup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<BackupRequest>,
) -> Result<Json<BackupResult>> {
    let result = state.manager.create_backup(id, &request.name).await?;
    Ok(Json(result))
}

/// POST /api/routers/{id}/command
///
/// `success: false` in the body is a command-level failure and still a 200;
/// only gateway failures (no session, broken IO) become a 500.
pub async fn run_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandResult>> {
    let result = state.manager.run_command(id, &request.command).await?;
    Ok(Json(result))
}
