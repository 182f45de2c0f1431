// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

mod address_lists;
mod maintenance;
mod routers;
mod status;

pub use address_lists::{add_address, get_address_lists, remove_address};
pub use maintenance::{create_backup, run_command};
pub use routers::{connect_router, disconnect_router};
pub use status::{SERVER_NAME, server_status};

use serde::Serialize;

/// Plain `{success:true}` acknowledgement body
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub(super) fn ok() -> axum::Json<Self> {
        axum::Json(SuccessResponse { success: true })
    }
}
