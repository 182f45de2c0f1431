// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Router transport adapters
//!
//! Three ways of administratively reaching a RouterOS device — REST over
//! HTTP, the binary management protocol on port 8728, and SSH command
//! execution on port 22 — behind one polymorphic interface. A session is
//! pinned to the adapter that established it; operations never switch
//! transports mid-session.

mod binary;
mod rest;
mod ssh;

pub use binary::{BinaryApiConnector, encode_length};
pub use rest::RestConnector;
pub use ssh::SshConnector;

use async_trait::async_trait;

use crate::config::TransportToggles;
use crate::error::{ConnectError, Result};
use crate::types::{
    AddressListCollection, BackupResult, CommandResult, DeviceIdentity, RouterCredential,
    TransportKind,
};

/// Capability surface of an established administrative session.
///
/// Each method maps onto whatever the concrete transport speaks: structured
/// API sentences, REST resources, or CLI text.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> TransportKind;

    /// Confirms liveness right after connect and feeds the dashboard.
    async fn fetch_identity(&self) -> Result<DeviceIdentity>;

    async fn list_address_entries(&self) -> Result<AddressListCollection>;

    async fn add_address_entry(&self, list: &str, address: &str, comment: &str) -> Result<()>;

    /// Resolves the native row identifier for `list` + `address`, then
    /// deletes by that identifier. No matching row means the entry is
    /// already gone, which is a success.
    async fn remove_address_entry(&self, list: &str, address: &str) -> Result<()>;

    async fn create_backup(&self, name: &str) -> Result<BackupResult>;

    /// Runs a raw administrative command. Command-level failures come back
    /// as `success: false`, not as an `Err`.
    async fn run_command(&self, command: &str) -> Result<CommandResult>;

    /// Best-effort teardown. Logs and swallows failures.
    async fn disconnect(&self);
}

/// Connection strategy for one transport, tried by the fallback chain.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Whether this transport may be attempted at all.
    fn available(&self) -> bool {
        true
    }

    async fn connect(
        &self,
        credential: &RouterCredential,
    ) -> std::result::Result<Box<dyn Transport>, ConnectError>;
}

/// The production connector chain in fixed priority order:
/// REST first (fastest, RouterOS 7.1+ only), then the binary API, then SSH.
#[must_use]
pub fn default_connectors(toggles: TransportToggles) -> Vec<Box<dyn TransportConnector>> {
    vec![
        Box::new(RestConnector::new(toggles.rest)),
        Box::new(BinaryApiConnector::new(toggles.binary_api)),
        Box::new(SshConnector::new(toggles.ssh)),
    ]
}
