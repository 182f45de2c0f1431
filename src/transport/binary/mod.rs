// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Binary RouterOS management protocol adapter (port 8728)
//!
//! Opens one persistent authenticated socket per session; every subsequent
//! operation reuses it. Commands are structured path + word writes, never
//! string concatenation.

mod auth;
mod connection;
mod protocol;

pub use protocol::encode_length;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AppError, ConnectError, Result};
use crate::types::{
    AddressListCollection, AddressListEntry, BackupResult, CommandResult, DeviceIdentity,
    NativeId, RouterCredential, TransportKind,
};

use connection::{ApiConnection, ApiError, Sentence};

/// Standard management protocol port
const API_PORT: u16 = 8728;

/// Fixed wait between triggering a backup and reading the file back
const BACKUP_SETTLE: Duration = Duration::from_secs(2);

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Io(e) => AppError::Io(e),
            other => AppError::Operation(other.to_string()),
        }
    }
}

/// Connection strategy for the binary API transport
pub struct BinaryApiConnector {
    enabled: bool,
}

impl BinaryApiConnector {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl super::TransportConnector for BinaryApiConnector {
    fn kind(&self) -> TransportKind {
        TransportKind::BinaryApi
    }

    fn available(&self) -> bool {
        self.enabled
    }

    async fn connect(
        &self,
        credential: &RouterCredential,
    ) -> std::result::Result<Box<dyn super::Transport>, ConnectError> {
        let addr = format!("{}:{}", credential.host, API_PORT);
        let mut conn = ApiConnection::connect(&addr)
            .await
            .map_err(connect_error)?;
        conn.login(&credential.username, &credential.password)
            .await
            .map_err(login_error)?;

        tracing::debug!("Binary API session established with {}", addr);
        Ok(Box::new(BinaryApiAdapter {
            conn: Mutex::new(conn),
            host: credential.host.clone(),
        }))
    }
}

fn connect_error(err: ApiError) -> ConnectError {
    match err {
        ApiError::Io(e) => ConnectError::Network(e.to_string()),
        ApiError::Timeout(d) => ConnectError::Timeout(d),
        ApiError::Trap(msg) => ConnectError::Protocol(msg),
    }
}

fn login_error(err: ApiError) -> ConnectError {
    match err {
        // A trap during /login is the device rejecting the credentials
        ApiError::Trap(msg) => ConnectError::AuthRejected(msg),
        other => connect_error(other),
    }
}

/// Established binary API session
struct BinaryApiAdapter {
    conn: Mutex<ApiConnection>,
    host: String,
}

impl std::fmt::Debug for BinaryApiAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryApiAdapter").field("host", &self.host).finish()
    }
}

impl BinaryApiAdapter {
    async fn command(&self, path: &str, words: &[String]) -> std::result::Result<Vec<Sentence>, ApiError> {
        self.conn.lock().await.command(path, words).await
    }
}

#[async_trait]
impl super::Transport for BinaryApiAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::BinaryApi
    }

    async fn fetch_identity(&self) -> Result<DeviceIdentity> {
        let resource = self.command("/system/resource/print", &[]).await?;
        let identity = self.command("/system/identity/print", &[]).await?;

        let first = resource.iter().find(|s| s.contains_key("version"));
        Ok(DeviceIdentity {
            version: first
                .and_then(|s| s.get("version").cloned())
                .unwrap_or_else(|| "unknown".to_string()),
            uptime: first.and_then(|s| s.get("uptime").cloned()),
            identity: identity
                .first()
                .and_then(|s| s.get("name").cloned())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn list_address_entries(&self) -> Result<AddressListCollection> {
        let sentences = self.command("/ip/firewall/address-list/print", &[]).await?;

        let mut lists = AddressListCollection::new();
        for s in &sentences {
            let (Some(list), Some(address)) = (s.get("list"), s.get("address")) else {
                continue;
            };
            lists
                .entry(list.clone())
                .or_default()
                .push(AddressListEntry {
                    address: address.clone(),
                    comment: s.get("comment").cloned().unwrap_or_default(),
                    id: NativeId::Api(s.get(".id").cloned().unwrap_or_default()),
                });
        }
        Ok(lists)
    }

    async fn add_address_entry(&self, list: &str, address: &str, comment: &str) -> Result<()> {
        self.command(
            "/ip/firewall/address-list/add",
            &[
                format!("=list={list}"),
                format!("=address={address}"),
                format!("=comment={comment}"),
            ],
        )
        .await?;
        Ok(())
    }

    async fn remove_address_entry(&self, list: &str, address: &str) -> Result<()> {
        let matches = self
            .command(
                "/ip/firewall/address-list/print",
                &[format!("?list={list}"), format!("?address={address}")],
            )
            .await?;

        let Some(id) = matches.first().and_then(|s| s.get(".id")) else {
            tracing::debug!("{} not present in {} on {}, nothing to remove", address, list, self.host);
            return Ok(());
        };
        self.command("/ip/firewall/address-list/remove", &[format!("=.id={id}")])
            .await?;
        Ok(())
    }

    async fn create_backup(&self, name: &str) -> Result<BackupResult> {
        self.command("/system/backup/save", &[format!("=name={name}")])
            .await?;

        // Give the device time to finish writing before reading the file back
        tokio::time::sleep(BACKUP_SETTLE).await;

        let filename = format!("{name}.backup");
        let files = self
            .command("/file/print", &[format!("?name={filename}")])
            .await?;
        let size = files
            .first()
            .and_then(|s| s.get("size"))
            .and_then(|v| v.parse().ok());

        Ok(BackupResult {
            success: true,
            filename,
            size,
        })
    }

    async fn run_command(&self, command: &str) -> Result<CommandResult> {
        let (path, words) = match parse_command(command) {
            Ok(parsed) => parsed,
            Err(reason) => {
                return Ok(CommandResult {
                    success: false,
                    output: reason,
                });
            }
        };

        // Command failures are business outcomes, not infrastructure errors
        match self.command(&path, &words).await {
            Ok(sentences) => Ok(CommandResult {
                success: true,
                output: render_sentences(&sentences),
            }),
            Err(e) => Ok(CommandResult {
                success: false,
                output: e.to_string(),
            }),
        }
    }

    async fn disconnect(&self) {
        tracing::debug!("Closing binary API session with {}", self.host);
        self.conn.lock().await.shutdown().await;
    }
}

/// Splits a raw command line into an API path plus attribute/query words.
fn parse_command(command: &str) -> std::result::Result<(String, Vec<String>), String> {
    let mut parts = command.split_whitespace();
    let path = parts
        .next()
        .filter(|p| p.starts_with('/'))
        .ok_or_else(|| {
            "command must start with an API path, e.g. /system/resource/print".to_string()
        })?;

    let mut words = Vec::new();
    for part in parts {
        if part.starts_with('=') || part.starts_with('?') {
            words.push(part.to_string());
        } else if part.contains('=') {
            words.push(format!("={part}"));
        } else {
            return Err(format!("unrecognized word '{part}': expected key=value"));
        }
    }
    Ok((path.to_string(), words))
}

/// Pretty-prints decoded reply sentences for display. Keys are sorted so
/// output is stable across runs.
fn render_sentences(sentences: &[Sentence]) -> String {
    let rows: Vec<BTreeMap<&String, &String>> =
        sentences.iter().map(|s| s.iter().collect()).collect();
    serde_json::to_string_pretty(&rows).unwrap_or_else(|e| format!("<unprintable reply: {e}>"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_path_only() {
        let (path, words) = parse_command("/system/resource/print").unwrap();
        assert_eq!(path, "/system/resource/print");
        assert!(words.is_empty());
    }

    #[test]
    fn test_parse_command_normalizes_bare_pairs() {
        let (path, words) =
            parse_command("/ip/firewall/address-list/add list=Blocked address=10.0.0.5").unwrap();
        assert_eq!(path, "/ip/firewall/address-list/add");
        assert_eq!(words, ["=list=Blocked", "=address=10.0.0.5"]);
    }

    #[test]
    fn test_parse_command_keeps_query_words() {
        let (_, words) =
            parse_command("/ip/firewall/address-list/print ?list=Blocked_IPs").unwrap();
        assert_eq!(words, ["?list=Blocked_IPs"]);
    }

    #[test]
    fn test_parse_command_rejects_missing_path() {
        assert!(parse_command("system resource print").is_err());
        assert!(parse_command("").is_err());
    }

    #[test]
    fn test_parse_command_rejects_bare_word() {
        let err = parse_command("/system/resource/print verbose").unwrap_err();
        assert!(err.contains("verbose"));
    }

    #[test]
    fn test_render_sentences_stable_output() {
        let mut s = Sentence::new();
        s.insert("version".to_string(), "7.12".to_string());
        s.insert("board-name".to_string(), "RB750Gr3".to_string());

        let out = render_sentences(&[s]);
        assert!(out.contains("\"version\": \"7.12\""));
        // BTreeMap ordering: board-name before version
        assert!(out.find("board-name").unwrap() < out.find("version").unwrap());
    }
}
