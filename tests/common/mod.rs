// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Fake transports for driving the gateway without real routers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use mikrotik_manager::{
    AddressListCollection, AddressListEntry, BackupResult, CommandResult, ConnectError,
    DeviceIdentity, NativeId, Result, RouterCredential, Transport, TransportConnector,
    TransportKind,
};

/// What a [`FakeConnector`] does when the orchestrator tries it
pub enum Plan {
    Succeed { version: String, identity: String },
    FailAuth,
    FailTimeout,
    FailNetwork,
}

/// Scripted connector for one transport slot in the fallback chain.
///
/// Counts connect attempts; every transport it produces shares one
/// disconnect counter, so a test can assert that a replaced or removed
/// session closed its handle exactly once.
pub struct FakeConnector {
    kind: TransportKind,
    plan: Plan,
    pub attempts: Arc<AtomicUsize>,
    pub disconnects: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new(kind: TransportKind, plan: Plan) -> Self {
        Self {
            kind,
            plan,
            attempts: Arc::new(AtomicUsize::new(0)),
            disconnects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn succeeding(kind: TransportKind, version: &str, identity: &str) -> Self {
        Self::new(
            kind,
            Plan::Succeed {
                version: version.to_string(),
                identity: identity.to_string(),
            },
        )
    }
}

#[async_trait]
impl TransportConnector for FakeConnector {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn connect(
        &self,
        _credential: &RouterCredential,
    ) -> std::result::Result<Box<dyn Transport>, ConnectError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.plan {
            Plan::Succeed { version, identity } => Ok(Box::new(FakeRouter {
                kind: self.kind,
                version: version.clone(),
                identity: identity.clone(),
                store: Mutex::new(AddressListCollection::new()),
                next_id: AtomicUsize::new(0),
                disconnects: self.disconnects.clone(),
            })),
            Plan::FailAuth => Err(ConnectError::AuthRejected("HTTP 401".to_string())),
            Plan::FailTimeout => Err(ConnectError::Timeout(std::time::Duration::from_secs(10))),
            Plan::FailNetwork => Err(ConnectError::Network("connection refused".to_string())),
        }
    }
}

/// In-memory stand-in for an established router session. Keeps a real
/// address-list store so round-trips behave like a device would.
#[derive(Debug)]
pub struct FakeRouter {
    kind: TransportKind,
    version: String,
    identity: String,
    store: Mutex<AddressListCollection>,
    next_id: AtomicUsize,
    disconnects: Arc<AtomicUsize>,
}

impl FakeRouter {
    fn native_id(&self) -> NativeId {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        match self.kind {
            TransportKind::Rest => NativeId::Rest(format!("*{n:X}")),
            TransportKind::BinaryApi => NativeId::Api(format!("*{n:X}")),
            TransportKind::Ssh => NativeId::Ssh(n.to_string()),
        }
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, AddressListCollection> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for FakeRouter {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    async fn fetch_identity(&self) -> Result<DeviceIdentity> {
        Ok(DeviceIdentity {
            version: self.version.clone(),
            identity: self.identity.clone(),
            uptime: match self.kind {
                TransportKind::Ssh => None,
                _ => Some("2w3d".to_string()),
            },
        })
    }

    async fn list_address_entries(&self) -> Result<AddressListCollection> {
        Ok(self.lock_store().clone())
    }

    async fn add_address_entry(&self, list: &str, address: &str, comment: &str) -> Result<()> {
        let id = self.native_id();
        self.lock_store()
            .entry(list.to_string())
            .or_default()
            .push(AddressListEntry {
                address: address.to_string(),
                comment: comment.to_string(),
                id,
            });
        Ok(())
    }

    async fn remove_address_entry(&self, list: &str, address: &str) -> Result<()> {
        // Absent entries are already removed: still a success
        if let Some(entries) = self.lock_store().get_mut(list) {
            entries.retain(|e| e.address != address);
        }
        Ok(())
    }

    async fn create_backup(&self, name: &str) -> Result<BackupResult> {
        Ok(BackupResult {
            success: true,
            filename: format!("{name}.backup"),
            size: match self.kind {
                TransportKind::Ssh => None,
                _ => Some(131_072),
            },
        })
    }

    async fn run_command(&self, command: &str) -> Result<CommandResult> {
        if self.kind == TransportKind::Rest {
            return Ok(CommandResult {
                success: false,
                output: "Custom commands are not supported over the REST transport".to_string(),
            });
        }
        Ok(CommandResult {
            success: true,
            output: format!("ran: {command}"),
        })
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}
