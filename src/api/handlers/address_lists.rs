use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::AppState;
use crate::error::Result;
use crate::types::AddressListCollection;

use super::SuccessResponse;

#[derive(Debug, Deserialize)]
pub struct AddAddressRequest {
    pub address: String,
    #[serde(default)]
    pub comment: String,
}

/// GET /api/routers/{id}/address-lists
pub async fn get_address_lists(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<AddressListCollection>> {
    let lists = state.manager.address_lists(id).await?;
    Ok(Json(lists))
}

/// POST /api/routers/{id}/address-lists/{list_name}/addresses
pub async fn add_address(
    State(state): State<Arc<AppState>>,
    Path((id, list_name)): Path<(i64, String)>,
    Json(request): Json<AddAddressRequest>,
) -> Result<Json<SuccessResponse>> {
    state
        .manager
        .add_address(id, &list_name, &request.address, &request.comment)
        .await?;
    Ok(SuccessResponse::ok())
}

/// DELETE /api/routers/{id}/address-lists/{list_name}/addresses/{address}
///
/// Idempotent: deleting an address that is not on the list succeeds.
pub async fn remove_address(
    State(state): State<Arc<AppState>>,
    Path((id, list_name, address)): Path<(i64, String, String)>,
) -> Result<Json<SuccessResponse>> {
    state.manager.remove_address(id, &list_name, &address).await?;
    Ok(SuccessResponse::ok())
}
