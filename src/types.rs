// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Normalized data model shared by all transports

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Credentials supplied with each connect request. Never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct RouterCredential {
    pub id: i64,
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Which of the three transports a session is pinned to.
///
/// Wire tags match the dashboard's `method` field: `rest`, `api`, `ssh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportKind {
    #[serde(rename = "rest")]
    Rest,
    #[serde(rename = "api")]
    BinaryApi,
    #[serde(rename = "ssh")]
    Ssh,
}

impl TransportKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TransportKind::Rest => "rest",
            TransportKind::BinaryApi => "api",
            TransportKind::Ssh => "ssh",
        }
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Router-side row identifier for an address-list entry.
///
/// Tagged per transport so an identifier obtained from one transport can
/// never be handed to another. Serializes as the bare identifier string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NativeId {
    /// `.id` object reference from the REST API (e.g. `*7`)
    Rest(String),
    /// `.id` object reference from the binary API (e.g. `*7`)
    Api(String),
    /// Printed row index parsed from CLI output (e.g. `3`)
    Ssh(String),
}

impl NativeId {
    #[must_use]
    pub fn raw(&self) -> &str {
        match self {
            NativeId::Rest(id) | NativeId::Api(id) | NativeId::Ssh(id) => id,
        }
    }
}

/// One firewall address-list entry as returned by a transport
#[derive(Debug, Clone, Serialize)]
pub struct AddressListEntry {
    pub address: String,
    pub comment: String,
    pub id: NativeId,
}

/// Address-list entries grouped by list name.
///
/// Both the list-name order and the per-list entry order follow whatever the
/// transport returned; nothing is sorted.
pub type AddressListCollection = IndexMap<String, Vec<AddressListEntry>>;

/// Liveness probe result fetched right after a transport connects
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub version: String,
    pub identity: String,
    pub uptime: Option<String>,
}

/// Normalized connect result returned to the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub version: String,
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    pub method: TransportKind,
}

/// Outcome of a raw administrative command.
///
/// `success: false` is a business outcome, not an infrastructure error.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    pub success: bool,
    pub output: String,
}

/// Outcome of a device backup trigger. `size` is best-effort and `null`
/// when the transport cannot report it synchronously.
#[derive(Debug, Clone, Serialize)]
pub struct BackupResult {
    pub success: bool,
    pub filename: String,
    pub size: Option<u64>,
}
