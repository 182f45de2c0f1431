// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! SSH CLI adapter (port 22)
//!
//! Universal fallback: works on every RouterOS version but speaks the
//! human-oriented CLI, so replies are parsed text rather than structured
//! data. One authenticated session per router; each operation runs a single
//! `exec` on its own channel. libssh2 is blocking, so all session work is
//! pushed onto the blocking thread pool.

mod parse;

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use ssh2::Session;

use crate::error::{AppError, ConnectError, Result};
use crate::types::{
    AddressListCollection, BackupResult, CommandResult, DeviceIdentity, RouterCredential,
    TransportKind,
};

const SSH_PORT: u16 = 22;

/// Covers TCP connect, handshake and auth
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Per blocking call once the session is up, enforced by libssh2
const COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Connection strategy for the SSH transport
pub struct SshConnector {
    enabled: bool,
}

impl SshConnector {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl super::TransportConnector for SshConnector {
    fn kind(&self) -> TransportKind {
        TransportKind::Ssh
    }

    fn available(&self) -> bool {
        self.enabled
    }

    async fn connect(
        &self,
        credential: &RouterCredential,
    ) -> std::result::Result<Box<dyn super::Transport>, ConnectError> {
        let host = credential.host.clone();
        let username = credential.username.clone();
        let password = credential.password.clone();

        let session = tokio::task::spawn_blocking(move || {
            establish_session(&host, &username, &password)
        })
        .await
        .map_err(|e| ConnectError::Protocol(format!("SSH worker failed: {e}")))??;

        tracing::debug!("SSH session established with {}", credential.host);
        Ok(Box::new(SshAdapter {
            session: Arc::new(Mutex::new(session)),
            host: credential.host.clone(),
        }))
    }
}

fn establish_session(
    host: &str,
    username: &str,
    password: &str,
) -> std::result::Result<Session, ConnectError> {
    let addr = format!("{host}:{SSH_PORT}")
        .to_socket_addrs()
        .map_err(|e| ConnectError::Network(format!("cannot resolve {host}: {e}")))?
        .next()
        .ok_or_else(|| ConnectError::Network(format!("no address for {host}")))?;

    let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(|e| {
        if e.kind() == std::io::ErrorKind::TimedOut {
            ConnectError::Timeout(CONNECT_TIMEOUT)
        } else {
            ConnectError::Network(e.to_string())
        }
    })?;

    let mut session =
        Session::new().map_err(|e| ConnectError::Protocol(format!("SSH session init: {e}")))?;
    session.set_tcp_stream(tcp);
    session
        .handshake()
        .map_err(|e| ConnectError::Protocol(format!("SSH handshake: {e}")))?;
    session
        .userauth_password(username, password)
        .map_err(|e| ConnectError::AuthRejected(e.to_string()))?;
    if !session.authenticated() {
        return Err(ConnectError::AuthRejected(
            "SSH authentication failed".to_string(),
        ));
    }

    // Bounds every subsequent blocking call on this session
    #[allow(clippy::cast_possible_truncation)]
    session.set_timeout(COMMAND_TIMEOUT.as_millis() as u32);
    Ok(session)
}

/// Established SSH session
struct SshAdapter {
    session: Arc<Mutex<Session>>,
    host: String,
}

impl std::fmt::Debug for SshAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshAdapter").field("host", &self.host).finish()
    }
}

impl SshAdapter {
    /// Runs one CLI line on its own channel and captures its output.
    async fn exec(&self, command: String) -> Result<String> {
        tracing::trace!("SSH exec on {}: {}", self.host, command);
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || exec_blocking(&session, &command))
            .await
            .map_err(|e| AppError::Operation(format!("SSH worker failed: {e}")))?
    }
}

fn exec_blocking(session: &Mutex<Session>, command: &str) -> Result<String> {
    let session = session.lock().unwrap_or_else(PoisonError::into_inner);
    let mut channel = session
        .channel_session()
        .map_err(|e| AppError::Operation(format!("SSH channel: {e}")))?;
    channel
        .exec(command)
        .map_err(|e| AppError::Operation(format!("SSH exec: {e}")))?;

    let mut output = String::new();
    channel.read_to_string(&mut output)?;
    let mut stderr = String::new();
    channel.stderr().read_to_string(&mut stderr).ok();
    channel.wait_close().ok();

    let status = channel.exit_status().unwrap_or(0);
    if status != 0 {
        let detail = if stderr.trim().is_empty() {
            output.trim().to_string()
        } else {
            stderr.trim().to_string()
        };
        return Err(AppError::Operation(format!(
            "command exited with status {status}: {detail}"
        )));
    }
    if !stderr.trim().is_empty() {
        tracing::warn!("SSH stderr: {}", stderr.trim());
    }
    Ok(output)
}

#[async_trait]
impl super::Transport for SshAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::Ssh
    }

    async fn fetch_identity(&self) -> Result<DeviceIdentity> {
        let resource = self.exec("/system resource print".to_string()).await?;
        let identity = self.exec("/system identity print".to_string()).await?;

        Ok(DeviceIdentity {
            version: parse::scalar_value(&resource, "version")
                .unwrap_or_else(|| "unknown".to_string()),
            identity: parse::scalar_value(&identity, "name")
                .unwrap_or_else(|| "unknown".to_string()),
            // The CLI prints uptime, but column drift across versions makes
            // it unreliable; only the structured transports report it.
            uptime: None,
        })
    }

    async fn list_address_entries(&self) -> Result<AddressListCollection> {
        let output = self
            .exec("/ip firewall address-list print".to_string())
            .await?;
        Ok(parse::parse_address_list(&output))
    }

    async fn add_address_entry(&self, list: &str, address: &str, comment: &str) -> Result<()> {
        // Naive quoting: comments containing '"' are a known limitation
        self.exec(format!(
            "/ip firewall address-list add list={list} address={address} comment=\"{comment}\""
        ))
        .await?;
        Ok(())
    }

    async fn remove_address_entry(&self, list: &str, address: &str) -> Result<()> {
        let output = self
            .exec("/ip firewall address-list print".to_string())
            .await?;
        let lists = parse::parse_address_list(&output);

        let Some(entry) = lists
            .get(list)
            .and_then(|entries| entries.iter().find(|e| e.address == address))
        else {
            tracing::debug!("{} not present in {} on {}, nothing to remove", address, list, self.host);
            return Ok(());
        };
        self.exec(format!(
            "/ip firewall address-list remove numbers={}",
            entry.id.raw()
        ))
        .await?;
        Ok(())
    }

    async fn create_backup(&self, name: &str) -> Result<BackupResult> {
        self.exec(format!("/system backup save name={name}")).await?;
        // The CLI gives no synchronous way to read the file size back
        Ok(BackupResult {
            success: true,
            filename: format!("{name}.backup"),
            size: None,
        })
    }

    async fn run_command(&self, command: &str) -> Result<CommandResult> {
        match self.exec(command.to_string()).await {
            Ok(output) => Ok(CommandResult {
                success: true,
                output,
            }),
            Err(e) => Ok(CommandResult {
                success: false,
                output: e.to_string(),
            }),
        }
    }

    async fn disconnect(&self) {
        tracing::debug!("Closing SSH session with {}", self.host);
        let session = Arc::clone(&self.session);
        let result = tokio::task::spawn_blocking(move || {
            let session = session.lock().unwrap_or_else(PoisonError::into_inner);
            session.disconnect(
                Some(ssh2::DisconnectCode::ByApplication),
                "session closed",
                None,
            )
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("SSH disconnect failed (ignored): {}", e),
            Err(e) => tracing::debug!("SSH disconnect worker failed (ignored): {}", e),
        }
    }
}
