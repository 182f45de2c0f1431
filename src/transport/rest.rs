// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! REST API adapter (RouterOS 7.1+)
//!
//! Stateless per call: every operation re-sends Basic Auth, no persistent
//! socket. The "handle" is just the host plus credentials held here.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{AppError, ConnectError, Result};
use crate::types::{
    AddressListCollection, AddressListEntry, BackupResult, CommandResult, DeviceIdentity,
    NativeId, RouterCredential, TransportKind,
};

/// Upper bound on every REST request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed wait between triggering a backup and reading the file back
const BACKUP_SETTLE: Duration = Duration::from_secs(2);

// ── Response row shapes ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AddressRow {
    #[serde(rename = ".id")]
    id: String,
    list: String,
    address: String,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Deserialize)]
struct ResourceRow {
    version: String,
    #[serde(default)]
    uptime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdentityRow {
    name: String,
}

#[derive(Debug, Deserialize)]
struct FileRow {
    // RouterOS REST returns numeric properties as strings
    #[serde(default)]
    size: Option<String>,
}

/// RouterOS REST error body, e.g. `{"error":400,"message":"Bad Request","detail":"..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Connection strategy for the REST transport
pub struct RestConnector {
    enabled: bool,
}

impl RestConnector {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

#[async_trait]
impl super::TransportConnector for RestConnector {
    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }

    fn available(&self) -> bool {
        self.enabled
    }

    async fn connect(
        &self,
        credential: &RouterCredential,
    ) -> std::result::Result<Box<dyn super::Transport>, ConnectError> {
        let adapter = RestAdapter::new(
            &credential.host,
            &credential.username,
            &credential.password,
        )
        .map_err(|e| ConnectError::Protocol(e.to_string()))?;

        // Probe the device to confirm reachability and credentials; REST
        // only exists on RouterOS 7.1+, older devices fail here and the
        // chain moves on.
        let resp = adapter
            .client
            .get(adapter.url("system/resource"))
            .basic_auth(&adapter.username, Some(&adapter.password))
            .send()
            .await
            .map_err(probe_error)?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ConnectError::AuthRejected(format!(
                "device returned HTTP {status}"
            )));
        }
        if !status.is_success() {
            return Err(ConnectError::Protocol(format!(
                "unexpected HTTP {status} from REST probe"
            )));
        }

        tracing::debug!("REST session established with {}", credential.host);
        Ok(Box::new(adapter))
    }
}

fn probe_error(err: reqwest::Error) -> ConnectError {
    if err.is_timeout() {
        ConnectError::Timeout(REQUEST_TIMEOUT)
    } else if err.is_connect() {
        ConnectError::Network(err.to_string())
    } else {
        ConnectError::Protocol(err.to_string())
    }
}

/// Established REST "session": host plus pre-validated credentials
struct RestAdapter {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for RestAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestAdapter").field("base_url", &self.base_url).finish()
    }
}

impl RestAdapter {
    fn new(host: &str, username: &str, password: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: format!("http://{host}/rest"),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .basic_auth(&self.username, Some(&self.password))
    }

    /// Sends a request and decodes the reply, turning HTTP-level failures
    /// into operation errors with whatever detail the device offered.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let resp = req
            .send()
            .await
            .map_err(|e| AppError::Operation(format!("REST request failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|b| b.detail.or(b.message))
            .unwrap_or_else(|| "no detail".to_string());
        Err(AppError::Operation(format!("HTTP {status}: {detail}")))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.send(self.request(reqwest::Method::GET, path)).await?;
        resp.json()
            .await
            .map_err(|e| AppError::Operation(format!("malformed REST reply: {e}")))
    }
}

#[async_trait]
impl super::Transport for RestAdapter {
    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }

    async fn fetch_identity(&self) -> Result<DeviceIdentity> {
        let resource: ResourceRow = self.get_json("system/resource").await?;
        let identity: IdentityRow = self.get_json("system/identity").await?;
        Ok(DeviceIdentity {
            version: resource.version,
            uptime: resource.uptime,
            identity: identity.name,
        })
    }

    async fn list_address_entries(&self) -> Result<AddressListCollection> {
        let rows: Vec<AddressRow> = self.get_json("ip/firewall/address-list").await?;

        let mut lists = AddressListCollection::new();
        for row in rows {
            lists.entry(row.list).or_default().push(AddressListEntry {
                address: row.address,
                comment: row.comment,
                id: NativeId::Rest(row.id),
            });
        }
        Ok(lists)
    }

    async fn add_address_entry(&self, list: &str, address: &str, comment: &str) -> Result<()> {
        self.send(
            self.request(reqwest::Method::PUT, "ip/firewall/address-list")
                .json(&serde_json::json!({
                    "list": list,
                    "address": address,
                    "comment": comment,
                })),
        )
        .await?;
        Ok(())
    }

    async fn remove_address_entry(&self, list: &str, address: &str) -> Result<()> {
        let resp = self
            .send(
                self.request(reqwest::Method::GET, "ip/firewall/address-list")
                    .query(&[("list", list), ("address", address)]),
            )
            .await?;
        let rows: Vec<AddressRow> = resp
            .json()
            .await
            .map_err(|e| AppError::Operation(format!("malformed REST reply: {e}")))?;

        let Some(row) = rows.first() else {
            tracing::debug!("{} not present in {}, nothing to remove", address, list);
            return Ok(());
        };
        self.send(self.request(
            reqwest::Method::DELETE,
            &format!("ip/firewall/address-list/{}", row.id),
        ))
        .await?;
        Ok(())
    }

    async fn create_backup(&self, name: &str) -> Result<BackupResult> {
        self.send(
            self.request(reqwest::Method::POST, "system/backup/save")
                .json(&serde_json::json!({ "name": name })),
        )
        .await?;

        // Give the device time to finish writing before reading the file back
        tokio::time::sleep(BACKUP_SETTLE).await;

        let filename = format!("{name}.backup");
        let resp = self
            .send(
                self.request(reqwest::Method::GET, "file")
                    .query(&[("name", filename.as_str())]),
            )
            .await?;
        let files: Vec<FileRow> = resp
            .json()
            .await
            .map_err(|e| AppError::Operation(format!("malformed REST reply: {e}")))?;
        let size = files
            .first()
            .and_then(|f| f.size.as_ref())
            .and_then(|v| v.parse().ok());

        Ok(BackupResult {
            success: true,
            filename,
            size,
        })
    }

    async fn run_command(&self, command: &str) -> Result<CommandResult> {
        tracing::debug!("Refusing raw command over REST: {}", command);
        Ok(CommandResult {
            success: false,
            output: "Custom commands are not supported over the REST transport; \
                     reconnect via the API or SSH transport to run raw commands."
                .to_string(),
        })
    }

    async fn disconnect(&self) {
        // Stateless transport, nothing to tear down
        tracing::debug!("REST session dropped (stateless)");
    }
}
