// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Per-session operations
//!
//! Thin dispatchers: resolve the router's session, delegate through the
//! transport object, hand the normalized result back. Which transport runs
//! is decided once at connect time and never changes mid-session.

use crate::error::Result;
use crate::types::{AddressListCollection, BackupResult, CommandResult};

use super::RouterManager;

impl RouterManager {
    /// Firewall address-list entries grouped by list name, in the order the
    /// transport returned them.
    pub async fn address_lists(&self, router_id: i64) -> Result<AddressListCollection> {
        let transport = self.registry.transport_for(router_id).await?;
        transport.list_address_entries().await
    }

    /// Adds one entry. A failure leaves the router's list untouched.
    pub async fn add_address(
        &self,
        router_id: i64,
        list: &str,
        address: &str,
        comment: &str,
    ) -> Result<()> {
        let transport = self.registry.transport_for(router_id).await?;
        tracing::debug!("Adding {} to {} on router {}", address, list, router_id);
        transport.add_address_entry(list, address, comment).await
    }

    /// Removes one entry. Removing an address that is not on the list is a
    /// success, not an error.
    pub async fn remove_address(&self, router_id: i64, list: &str, address: &str) -> Result<()> {
        let transport = self.registry.transport_for(router_id).await?;
        tracing::debug!("Removing {} from {} on router {}", address, list, router_id);
        transport.remove_address_entry(list, address).await
    }

    /// Triggers a device backup and reports the resulting file.
    pub async fn create_backup(&self, router_id: i64, name: &str) -> Result<BackupResult> {
        let transport = self.registry.transport_for(router_id).await?;
        tracing::info!("Creating backup '{}' on router {}", name, router_id);
        transport.create_backup(name).await
    }

    /// Runs a raw administrative command. `success: false` in the result is
    /// a command-level failure; `Err` means the gateway itself failed.
    pub async fn run_command(&self, router_id: i64, command: &str) -> Result<CommandResult> {
        let transport = self.registry.transport_for(router_id).await?;
        tracing::info!("Running command on router {}: {}", router_id, command);
        transport.run_command(command).await
    }

    /// Closes and forgets the router's session. Unknown ids are a no-op.
    pub async fn disconnect(&self, router_id: i64) {
        self.registry.remove(router_id).await;
    }
}
