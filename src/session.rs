// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! In-memory session registry
//!
//! Maps router ids to their established administrative sessions. Exactly
//! one session may exist per router; installing a replacement disconnects
//! the displaced handle. Contents are lost on restart, so the dashboard
//! must reconnect every router after the gateway comes back up.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::transport::Transport;
use crate::types::TransportKind;

/// Live administrative connection state for one router, pinned to the
/// transport that established it.
pub struct Session {
    pub router_id: i64,
    pub kind: TransportKind,
    pub host: String,
    transport: Arc<dyn Transport>,
}

impl Session {
    #[must_use]
    pub fn new(router_id: i64, host: String, transport: Box<dyn Transport>) -> Self {
        let transport: Arc<dyn Transport> = Arc::from(transport);
        Session {
            router_id,
            kind: transport.kind(),
            host,
            transport,
        }
    }

    /// Shared handle to the session's transport. Operations run on the
    /// clone so the registry lock is never held across network calls.
    #[must_use]
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }
}

/// Keyed store of live sessions. No persistence, no expiry.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<i64, Session>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Transport handle for a connected router, or `RouterNotConnected`.
    ///
    /// A session being present says nothing about the handle still working;
    /// a broken handle only surfaces when an operation against it fails.
    pub async fn transport_for(&self, router_id: i64) -> Result<Arc<dyn Transport>> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&router_id)
            .map(Session::transport)
            .ok_or(AppError::RouterNotConnected(router_id))
    }

    /// Transport kind of the live session, if any.
    pub async fn kind_of(&self, router_id: i64) -> Option<TransportKind> {
        let sessions = self.sessions.lock().await;
        sessions.get(&router_id).map(|s| s.kind)
    }

    /// Installs a session, replacing any previous one for the same router.
    /// The displaced handle is disconnected exactly once.
    pub async fn install(&self, session: Session) {
        let router_id = session.router_id;
        let displaced = {
            let mut sessions = self.sessions.lock().await;
            sessions.insert(router_id, session)
        };
        if let Some(old) = displaced {
            tracing::info!(
                "Replacing {} session for router {}, closing old handle",
                old.kind,
                router_id
            );
            old.transport().disconnect().await;
        }
    }

    /// Disconnects and forgets a session. Removing an unknown id is a no-op.
    pub async fn remove(&self, router_id: i64) {
        let removed = {
            let mut sessions = self.sessions.lock().await;
            sessions.remove(&router_id)
        };
        match removed {
            Some(session) => {
                tracing::info!(
                    "Disconnecting {} session for router {}",
                    session.kind,
                    router_id
                );
                session.transport().disconnect().await;
            }
            None => {
                tracing::debug!("Disconnect for unknown router {}, nothing to do", router_id);
            }
        }
    }

    /// Tears down every session. Called once at process shutdown.
    pub async fn shutdown(&self) {
        let drained: Vec<Session> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().map(|(_, s)| s).collect()
        };
        for session in drained {
            tracing::info!(
                "Closing {} session for router {} ({})",
                session.kind,
                session.router_id,
                session.host
            );
            session.transport().disconnect().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AddressListCollection, BackupResult, CommandResult, DeviceIdentity,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct CountingTransport {
        kind: TransportKind,
        disconnects: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Transport for CountingTransport {
        fn kind(&self) -> TransportKind {
            self.kind
        }

        async fn fetch_identity(&self) -> Result<DeviceIdentity> {
            Ok(DeviceIdentity {
                version: "7.12".to_string(),
                identity: "test".to_string(),
                uptime: None,
            })
        }

        async fn list_address_entries(&self) -> Result<AddressListCollection> {
            Ok(AddressListCollection::new())
        }

        async fn add_address_entry(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        async fn remove_address_entry(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }

        async fn create_backup(&self, name: &str) -> Result<BackupResult> {
            Ok(BackupResult {
                success: true,
                filename: format!("{name}.backup"),
                size: None,
            })
        }

        async fn run_command(&self, _: &str) -> Result<CommandResult> {
            Ok(CommandResult {
                success: true,
                output: String::new(),
            })
        }

        async fn disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_session(router_id: i64, kind: TransportKind) -> (Session, Arc<AtomicUsize>) {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let transport = CountingTransport {
            kind,
            disconnects: disconnects.clone(),
        };
        (
            Session::new(router_id, "10.0.0.1".to_string(), Box::new(transport)),
            disconnects,
        )
    }

    #[tokio::test]
    async fn test_transport_for_unknown_router() {
        let registry = SessionRegistry::new();
        let err = registry.transport_for(42).await.unwrap_err();
        assert!(matches!(err, AppError::RouterNotConnected(42)));
    }

    #[tokio::test]
    async fn test_install_and_lookup() {
        let registry = SessionRegistry::new();
        let (session, _) = counting_session(1, TransportKind::Ssh);
        registry.install(session).await;

        let transport = registry.transport_for(1).await.unwrap();
        assert_eq!(transport.kind(), TransportKind::Ssh);
        assert_eq!(registry.kind_of(1).await, Some(TransportKind::Ssh));
    }

    #[tokio::test]
    async fn test_replacing_session_closes_old_handle_exactly_once() {
        let registry = SessionRegistry::new();
        let (first, first_disconnects) = counting_session(1, TransportKind::BinaryApi);
        let (second, second_disconnects) = counting_session(1, TransportKind::Ssh);

        registry.install(first).await;
        registry.install(second).await;

        assert_eq!(first_disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(second_disconnects.load(Ordering::SeqCst), 0);
        assert_eq!(registry.kind_of(1).await, Some(TransportKind::Ssh));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove_disconnects_and_forgets() {
        let registry = SessionRegistry::new();
        let (session, disconnects) = counting_session(5, TransportKind::Rest);
        registry.install(session).await;

        registry.remove(5).await;
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_unknown_id_is_noop() {
        let registry = SessionRegistry::new();
        registry.remove(99).await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_shutdown_closes_everything() {
        let registry = SessionRegistry::new();
        let (s1, d1) = counting_session(1, TransportKind::Rest);
        let (s2, d2) = counting_session(2, TransportKind::Ssh);
        registry.install(s1).await;
        registry.install(s2).await;

        registry.shutdown().await;
        assert_eq!(d1.load(Ordering::SeqCst), 1);
        assert_eq!(d2.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty().await);
    }
}
