// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Connection orchestration
//!
//! Transports are attempted in fixed priority order: REST first (fastest,
//! RouterOS 7.1+ only), then the binary API, then SSH (slowest, works
//! everywhere). The first success wins and is committed to the registry;
//! a transport is attempted at most once per connect request.

use crate::error::{ConnectError, Result};
use crate::session::Session;
use crate::types::{ConnectionStatus, RouterCredential, TransportKind};

use super::RouterManager;

impl RouterManager {
    /// Establishes an administrative session for the router, replacing any
    /// existing one under the same id.
    ///
    /// # Errors
    ///
    /// Returns `ConnectError::AllFailed` when every transport in the chain
    /// failed or was unavailable. The rendered message carries the last
    /// attempt's reason; all attempts stay on the error value and are
    /// logged here.
    pub async fn connect(&self, credential: &RouterCredential) -> Result<ConnectionStatus> {
        let mut attempts: Vec<(TransportKind, ConnectError)> = Vec::new();

        for connector in &self.connectors {
            let kind = connector.kind();
            if !connector.available() {
                tracing::debug!(
                    "Skipping {} transport for router {}: disabled",
                    kind,
                    credential.id
                );
                attempts.push((kind, ConnectError::Unavailable(kind)));
                continue;
            }

            tracing::info!(
                "Trying {} transport for router {} at {}",
                kind,
                credential.id,
                credential.host
            );
            let transport = match connector.connect(credential).await {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(
                        "{} transport failed for router {}: {}",
                        kind,
                        credential.id,
                        e
                    );
                    attempts.push((kind, e));
                    continue;
                }
            };

            // Confirm liveness before committing the session
            let identity = match transport.fetch_identity().await {
                Ok(identity) => identity,
                Err(e) => {
                    tracing::warn!(
                        "{} transport connected to router {} but the identity check failed: {}",
                        kind,
                        credential.id,
                        e
                    );
                    transport.disconnect().await;
                    attempts.push((
                        kind,
                        ConnectError::Protocol(format!("identity check failed: {e}")),
                    ));
                    continue;
                }
            };

            tracing::info!(
                "Router {} connected via {}: {} (RouterOS {})",
                credential.id,
                kind,
                identity.identity,
                identity.version
            );
            self.registry
                .install(Session::new(
                    credential.id,
                    credential.host.clone(),
                    transport,
                ))
                .await;

            return Ok(ConnectionStatus {
                connected: true,
                version: identity.version,
                identity: identity.identity,
                uptime: identity.uptime,
                method: kind,
            });
        }

        tracing::error!(
            "All transports failed for router {} at {}",
            credential.id,
            credential.host
        );
        Err(ConnectError::AllFailed { attempts }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::transport::{Transport, TransportConnector};
    use crate::types::{
        AddressListCollection, BackupResult, CommandResult, DeviceIdentity,
    };
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct StubTransport {
        kind: TransportKind,
    }

    #[async_trait]
    impl Transport for StubTransport {
        fn kind(&self) -> TransportKind {
            self.kind
        }

        async fn fetch_identity(&self) -> Result<DeviceIdentity> {
            Ok(DeviceIdentity {
                version: "7.12".to_string(),
                identity: "RB-Main".to_string(),
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
                size: Some(128_000),
            })
        }

        async fn run_command(&self, _: &str) -> Result<CommandResult> {
            Ok(CommandResult {
                success: true,
                output: String::new(),
            })
        }

        async fn disconnect(&self) {}
    }

    enum Outcome {
        Succeed,
        Fail(fn() -> ConnectError),
    }

    struct StubConnector {
        kind: TransportKind,
        enabled: bool,
        outcome: Outcome,
        attempts: Arc<AtomicUsize>,
    }

    impl StubConnector {
        fn succeeding(kind: TransportKind) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    kind,
                    enabled: true,
                    outcome: Outcome::Succeed,
                    attempts: attempts.clone(),
                },
                attempts,
            )
        }

        fn failing(kind: TransportKind, err: fn() -> ConnectError) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    kind,
                    enabled: true,
                    outcome: Outcome::Fail(err),
                    attempts: attempts.clone(),
                },
                attempts,
            )
        }

        fn disabled(kind: TransportKind) -> (Self, Arc<AtomicUsize>) {
            let attempts = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    kind,
                    enabled: false,
                    outcome: Outcome::Succeed,
                    attempts: attempts.clone(),
                },
                attempts,
            )
        }
    }

    #[async_trait]
    impl TransportConnector for StubConnector {
        fn kind(&self) -> TransportKind {
            self.kind
        }

        fn available(&self) -> bool {
            self.enabled
        }

        async fn connect(
            &self,
            _: &RouterCredential,
        ) -> std::result::Result<Box<dyn Transport>, ConnectError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                Outcome::Succeed => Ok(Box::new(StubTransport { kind: self.kind })),
                Outcome::Fail(make) => Err(make()),
            }
        }
    }

    fn credential() -> RouterCredential {
        RouterCredential {
            id: 7,
            host: "10.1.1.1".to_string(),
            username: "admin".to_string(),
            password: "x".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_success_stops_the_chain() {
        let (rest, rest_attempts) = StubConnector::failing(TransportKind::Rest, || {
            ConnectError::AuthRejected("HTTP 401".to_string())
        });
        let (api, api_attempts) = StubConnector::succeeding(TransportKind::BinaryApi);
        let (ssh, ssh_attempts) = StubConnector::succeeding(TransportKind::Ssh);
        let manager = RouterManager::new(vec![Box::new(rest), Box::new(api), Box::new(ssh)]);

        let status = manager.connect(&credential()).await.unwrap();

        assert!(status.connected);
        assert_eq!(status.method, TransportKind::BinaryApi);
        assert_eq!(rest_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(api_attempts.load(Ordering::SeqCst), 1);
        assert_eq!(ssh_attempts.load(Ordering::SeqCst), 0, "ssh must never be tried");
        assert_eq!(
            manager.registry().kind_of(7).await,
            Some(TransportKind::BinaryApi)
        );
    }

    #[tokio::test]
    async fn test_full_fallback_to_ssh() {
        let (rest, _) = StubConnector::failing(TransportKind::Rest, || {
            ConnectError::AuthRejected("HTTP 401".to_string())
        });
        let (api, _) = StubConnector::failing(TransportKind::BinaryApi, || {
            ConnectError::Timeout(std::time::Duration::from_secs(10))
        });
        let (ssh, _) = StubConnector::succeeding(TransportKind::Ssh);
        let manager = RouterManager::new(vec![Box::new(rest), Box::new(api), Box::new(ssh)]);

        let status = manager.connect(&credential()).await.unwrap();

        assert_eq!(status.method, TransportKind::Ssh);
        assert_eq!(status.version, "7.12");
        assert_eq!(status.identity, "RB-Main");
    }

    #[tokio::test]
    async fn test_disabled_transport_is_skipped_without_attempt() {
        let (rest, rest_attempts) = StubConnector::disabled(TransportKind::Rest);
        let (api, _) = StubConnector::succeeding(TransportKind::BinaryApi);
        let manager = RouterManager::new(vec![Box::new(rest), Box::new(api)]);

        let status = manager.connect(&credential()).await.unwrap();

        assert_eq!(status.method, TransportKind::BinaryApi);
        assert_eq!(rest_attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_failed_surfaces_last_reason_and_keeps_all_attempts() {
        let (rest, _) = StubConnector::failing(TransportKind::Rest, || {
            ConnectError::AuthRejected("HTTP 401".to_string())
        });
        let (api, _) = StubConnector::failing(TransportKind::BinaryApi, || {
            ConnectError::Timeout(std::time::Duration::from_secs(10))
        });
        let (ssh, _) = StubConnector::failing(TransportKind::Ssh, || {
            ConnectError::Network("connection refused".to_string())
        });
        let manager = RouterManager::new(vec![Box::new(rest), Box::new(api), Box::new(ssh)]);

        let err = manager.connect(&credential()).await.unwrap_err();
        let AppError::Connect(ConnectError::AllFailed { attempts }) = &err else {
            panic!("expected AllFailed, got {err}");
        };
        assert_eq!(attempts.len(), 3);
        assert!(err.to_string().contains("connection refused"));
        assert!(!err.to_string().contains("401"));
        assert!(manager.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_no_retry_within_one_connect() {
        let (rest, rest_attempts) = StubConnector::failing(TransportKind::Rest, || {
            ConnectError::Network("unreachable".to_string())
        });
        let manager = RouterManager::new(vec![Box::new(rest)]);

        let _ = manager.connect(&credential()).await;
        assert_eq!(rest_attempts.load(Ordering::SeqCst), 1);
    }
}
