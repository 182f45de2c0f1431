// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! # MikroTik Manager
//!
//! Fleet-management gateway for MikroTik RouterOS devices.
//!
//! This library backs the fleet dashboard: it establishes administrative
//! sessions over whichever transport succeeds (REST, binary API, SSH),
//! keeps per-router session state, and exposes the whole thing as a small
//! JSON-over-HTTP gateway.
//!
//! ## Main modules
//! - `api`: HTTP gateway handlers
//! - `config`: configuration management
//! - `error`: error types
//! - `manager`: connection orchestration and per-session services
//! - `session`: in-memory session registry
//! - `transport`: the three router transport adapters
//! - `types`: normalized data model

mod api;
mod config;
mod error;
mod manager;
mod session;
mod transport;
mod types;

/// Application configuration
pub use config::{Config, TransportToggles};

/// Application error and result types
pub use error::{AppError, ConnectError, Result};

/// HTTP API router, state and server identity
pub use api::{AppState, create_router, handlers::SERVER_NAME};

/// Router manager (orchestration + services)
pub use manager::RouterManager;

/// Session registry
pub use session::{Session, SessionRegistry};

/// Transport seam and adapters
pub use transport::{
    BinaryApiConnector, RestConnector, SshConnector, Transport, TransportConnector,
    default_connectors,
};

/// Normalized data model
pub use types::{
    AddressListCollection, AddressListEntry, BackupResult, CommandResult, ConnectionStatus,
    DeviceIdentity, NativeId, RouterCredential, TransportKind,
};

/// RouterOS wire protocol length encoding (public for tests)
pub use transport::encode_length;
