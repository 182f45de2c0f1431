// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Configuration module for the MikroTik Manager gateway
//!
//! Loads configuration from environment variables (with `.env` support).

/// Default configuration values
pub mod defaults {
    pub const BIND_ADDR: &str = "0.0.0.0";
    pub const PORT: u16 = 3001;
    /// How many successive ports to probe when the preferred one is taken
    pub const PORT_SCAN_LIMIT: u16 = 20;
}

/// Environment variable names used by the application
pub mod env_vars {
    pub const BIND_ADDR: &str = "BIND_ADDR";
    pub const PORT: &str = "PORT";
    pub const DISABLE_REST: &str = "GATEWAY_DISABLE_REST";
    pub const DISABLE_API: &str = "GATEWAY_DISABLE_API";
    pub const DISABLE_SSH: &str = "GATEWAY_DISABLE_SSH";
}

/// Per-transport capability flags.
///
/// A disabled transport is skipped by the connect fallback chain and
/// reported as `disabled` on the status endpoint.
#[derive(Debug, Clone, Copy)]
pub struct TransportToggles {
    pub rest: bool,
    pub binary_api: bool,
    pub ssh: bool,
}

impl Default for TransportToggles {
    fn default() -> Self {
        TransportToggles {
            rest: true,
            binary_api: true,
            ssh: true,
        }
    }
}

impl TransportToggles {
    #[must_use]
    pub fn status(enabled: bool) -> &'static str {
        if enabled { "available" } else { "disabled" }
    }
}

/// Application-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub transports: TransportToggles,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: defaults::BIND_ADDR.to_string(),
            port: defaults::PORT,
            transports: TransportToggles::default(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bind_addr = std::env::var(env_vars::BIND_ADDR)
            .unwrap_or_else(|_| defaults::BIND_ADDR.to_string());

        let port = std::env::var(env_vars::PORT)
            .ok()
            .and_then(|v| match v.parse::<u16>() {
                Ok(p) => Some(p),
                Err(e) => {
                    tracing::warn!("Invalid {}={}: {}. Using default.", env_vars::PORT, v, e);
                    None
                }
            })
            .unwrap_or(defaults::PORT);

        let transports = TransportToggles {
            rest: !env_flag(env_vars::DISABLE_REST),
            binary_api: !env_flag(env_vars::DISABLE_API),
            ssh: !env_flag(env_vars::DISABLE_SSH),
        };

        Config {
            bind_addr,
            port,
            transports,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| truthy(&v))
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
