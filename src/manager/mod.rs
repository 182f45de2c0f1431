// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! High-level router management
//!
//! Owns the session registry and the transport fallback chain. Connect
//! requests go through the orchestration in `connect.rs`; everything else
//! is a thin dispatch over the established session in `services.rs`.

mod connect;
mod services;

use crate::config::TransportToggles;
use crate::session::SessionRegistry;
use crate::transport::{TransportConnector, default_connectors};

/// Gateway-wide router manager: one per process, torn down at shutdown.
pub struct RouterManager {
    registry: SessionRegistry,
    connectors: Vec<Box<dyn TransportConnector>>,
}

impl RouterManager {
    /// Builds a manager over an explicit connector chain. Connectors are
    /// tried in the order given; tests inject fakes here.
    #[must_use]
    pub fn new(connectors: Vec<Box<dyn TransportConnector>>) -> Self {
        Self {
            registry: SessionRegistry::new(),
            connectors,
        }
    }

    /// Production chain: REST, then binary API, then SSH.
    #[must_use]
    pub fn with_default_transports(toggles: TransportToggles) -> Self {
        Self::new(default_connectors(toggles))
    }

    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Disconnects every live session. Called once at process exit.
    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}
