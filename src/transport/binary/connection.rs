// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Low-level RouterOS API connection handling

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::protocol::{encode_length, read_length};

/// Connection timeout (10 seconds)
pub(super) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read operation timeout (30 seconds)
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// One reply row: the `=key=value` attributes of a `!re` sentence
pub(super) type Sentence = HashMap<String, String>;

/// Errors from the wire-level API session
#[derive(Debug, Error)]
pub(super) enum ApiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The device answered with a `!trap` sentence
    #[error("RouterOS trap: {0}")]
    Trap(String),

    #[error("RouterOS did not respond within {0:?}")]
    Timeout(Duration),
}

/// Persistent authenticated socket session on the management port
pub(super) struct ApiConnection {
    stream: TcpStream,
}

impl ApiConnection {
    pub(super) async fn connect(addr: &str) -> Result<Self, ApiError> {
        tracing::trace!("Attempting TCP connection to: {}", addr);
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| ApiError::Timeout(CONNECT_TIMEOUT))??;
        tracing::trace!("TCP connection established to: {}", addr);
        Ok(Self { stream })
    }

    /// Issues one command sentence: the path word followed by attribute
    /// (`=key=value`) and query (`?key=value`) words.
    pub(super) async fn command(
        &mut self,
        path: &str,
        words: &[String],
    ) -> Result<Vec<Sentence>, ApiError> {
        let mut all: Vec<String> = Vec::with_capacity(1 + words.len());
        all.push(path.to_string());
        all.extend(words.iter().cloned());
        self.raw_command(all).await
    }

    pub(super) async fn raw_command(
        &mut self,
        words: Vec<String>,
    ) -> Result<Vec<Sentence>, ApiError> {
        self.send_words(&words).await?;
        self.read_sentences().await
    }

    /// Closes the socket. Best-effort.
    pub(super) async fn shutdown(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::debug!("API socket shutdown failed: {}", e);
        }
    }

    async fn send_words(&mut self, words: &[String]) -> Result<(), ApiError> {
        for w in words {
            self.write_word(w).await?;
        }
        // zero length word terminator
        self.stream.write_all(&[0]).await?;
        Ok(())
    }

    async fn write_word(&mut self, word: &str) -> Result<(), ApiError> {
        let bytes = word.as_bytes();
        self.stream.write_all(&encode_length(bytes.len())).await?;
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    async fn read_sentences(&mut self) -> Result<Vec<Sentence>, ApiError> {
        // Bound the whole exchange so a dead router can't hang the request
        timeout(READ_TIMEOUT, async {
            let mut sentences: Vec<Sentence> = Vec::new();
            let mut current: Option<Sentence> = None;
            loop {
                let word = self.read_word().await?;
                if word.is_empty() {
                    continue;
                }
                tracing::trace!("Received word: {}", word);
                if word == "!done" {
                    if let Some(s) = current.take() {
                        sentences.push(s);
                    }
                    tracing::trace!("Command complete, {} sentences received", sentences.len());
                    break;
                }
                if word == "!trap" {
                    return Err(ApiError::Trap(self.read_trap_message().await?));
                }
                if word == "!re" {
                    if let Some(s) = current.take() {
                        sentences.push(s);
                    }
                    current = Some(Sentence::new());
                    continue;
                }
                if let Some(stripped) = word.strip_prefix('=') {
                    let tgt = current.get_or_insert_with(Sentence::new);
                    if let Some((k, v)) = stripped.split_once('=') {
                        tgt.insert(k.to_string(), v.to_string());
                    }
                }
                // ignore other headers
            }
            Ok(sentences)
        })
        .await
        .map_err(|_| ApiError::Timeout(READ_TIMEOUT))?
    }

    /// Drains a `!trap` sentence and extracts its `message` attribute.
    async fn read_trap_message(&mut self) -> Result<String, ApiError> {
        tracing::trace!("Trap received, reading trap details");
        let mut trap = Sentence::new();
        loop {
            let w = self.read_word().await?;
            if w.is_empty() {
                continue;
            }
            if let Some(stripped) = w.strip_prefix('=') {
                if let Some((k, v)) = stripped.split_once('=') {
                    trap.insert(k.to_string(), v.to_string());
                }
                continue;
            }
            if w.starts_with('!') {
                break;
            }
        }
        Ok(trap
            .get("message")
            .cloned()
            .unwrap_or_else(|| "trap".to_string()))
    }

    async fn read_word(&mut self) -> Result<String, ApiError> {
        let len = read_length(&mut self.stream).await?;
        if len == 0 {
            return Ok(String::new());
        }
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf).await?;
        Ok(String::from_utf8_lossy(&buf).into())
    }
}
