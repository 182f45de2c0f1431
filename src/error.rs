// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Error types for the MikroTik Manager gateway

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::types::TransportKind;

/// Failure of a single transport's connection attempt
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Transport disabled by configuration
    #[error("{0} transport is disabled")]
    Unavailable(TransportKind),

    /// Host unreachable, connection refused, DNS failure
    #[error("network error: {0}")]
    Network(String),

    /// Credentials rejected by the device
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// Handshake or response decoding failure
    #[error("protocol error: {0}")]
    Protocol(String),

    /// No answer within the transport's connect timeout
    #[error("connection timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Every transport in the fallback chain failed. All attempts are kept
    /// for logging; the rendered message names only the last one.
    #[error("all transports failed, last attempt ({}): {}", last_kind(.attempts), last_reason(.attempts))]
    AllFailed {
        attempts: Vec<(TransportKind, ConnectError)>,
    },
}

fn last_kind(attempts: &[(TransportKind, ConnectError)]) -> String {
    attempts
        .last()
        .map_or_else(|| "none".to_string(), |(kind, _)| kind.to_string())
}

fn last_reason(attempts: &[(TransportKind, ConnectError)]) -> String {
    attempts.last().map_or_else(
        || "no transports were attempted".to_string(),
        |(_, err)| err.to_string(),
    )
}

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or IO error
    #[error("IO error")]
    Io(#[from] std::io::Error),

    /// No live session exists for the router
    #[error("Router {0} is not connected")]
    RouterNotConnected(i64),

    /// Connection establishment failed on every transport
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// An operation against an established session failed. The session
    /// itself stays valid.
    #[error("Operation failed: {0}")]
    Operation(String),

    /// Address parsing error
    #[error("Address parse error")]
    AddrParse(#[from] std::net::AddrParseError),
}

/// The dashboard contract: every gateway error is a flat 500 `{error}` body,
/// whatever its kind.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::warn!("Request failed: {}", self);
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Convenient alias for Result with application error
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_not_connected_display() {
        let err = AppError::RouterNotConnected(7);
        assert_eq!(err.to_string(), "Router 7 is not connected");
    }

    #[test]
    fn test_operation_error_display() {
        let err = AppError::Operation("add failed".to_string());
        assert_eq!(err.to_string(), "Operation failed: add failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Io(_)));
    }

    #[test]
    fn test_unavailable_display() {
        let err = ConnectError::Unavailable(TransportKind::Ssh);
        assert_eq!(err.to_string(), "ssh transport is disabled");
    }

    #[test]
    fn test_all_failed_surfaces_last_attempt_only() {
        let err = ConnectError::AllFailed {
            attempts: vec![
                (
                    TransportKind::Rest,
                    ConnectError::AuthRejected("401".to_string()),
                ),
                (
                    TransportKind::BinaryApi,
                    ConnectError::Timeout(std::time::Duration::from_secs(10)),
                ),
                (
                    TransportKind::Ssh,
                    ConnectError::Network("connection refused".to_string()),
                ),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("ssh"));
        assert!(msg.contains("connection refused"));
        assert!(!msg.contains("401"));
    }

    #[test]
    fn test_all_failed_empty_attempts() {
        let err = ConnectError::AllFailed { attempts: vec![] };
        assert!(err.to_string().contains("no transports were attempted"));
    }

    #[tokio::test]
    async fn test_error_response_is_flat_500() {
        let err = AppError::RouterNotConnected(3);
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Router 3 is not connected");
    }
}
