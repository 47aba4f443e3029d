// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::DEFAULT_ERROR_REQUEUE_SECS;
use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Restrict the service watch to a single namespace. Endpoints are watched
    /// cluster-wide.
    pub watch_namespace: Option<String>,
    /// Delay before a failed reconcile is retried
    pub error_requeue: Duration,
    pub log_format: LogFormat,
    /// Run the DynamicSchema status controller
    pub dynamic_schema_status: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_namespace: None,
            error_requeue: Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
            log_format: LogFormat::Text,
            dynamic_schema_status: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());

        let error_requeue = match lookup("ERROR_REQUEUE_SECS") {
            Some(value) => Duration::from_secs(
                value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("ERROR_REQUEUE_SECS is not a number: {}", value))?,
            ),
            None => Duration::from_secs(DEFAULT_ERROR_REQUEUE_SECS),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => bail!("LOG_FORMAT must be 'text' or 'json', got '{}'", other),
        };

        let dynamic_schema_status = lookup("DYNAMIC_SCHEMA_STATUS");
        let dynamic_schema_status = match dynamic_schema_status.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(value) => value.parse::<bool>().with_context(|| {
                format!(
                    "DYNAMIC_SCHEMA_STATUS must be 'true' or 'false', got '{}'",
                    value
                )
            })?,
        };

        Ok(Config {
            watch_namespace,
            error_requeue,
            log_format,
            dynamic_schema_status,
        })
    }
}
