// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use clap::Parser;
use kube::{Client, CustomResourceExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dnsrecord::cli::{Args, Command};
use dnsrecord::config::{Config, LogFormat};
use dnsrecord::reconcilers::{DnsRecordController, DynamicSchemaController};
use dnsrecord::types::DynamicSchema;

fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(env_filter).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if Args::parse().command() == Command::Crd {
        print!("{}", serde_yaml::to_string(&DynamicSchema::crd())?);
        return Ok(());
    }

    // Load configuration
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    info!("Starting DNS record operator");
    info!(
        "Configuration loaded: watch_namespace={}, error_requeue={:?}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.error_requeue
    );

    // Create Kubernetes client
    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    let dns_records = DnsRecordController::new(client.clone(), config.clone());
    if config.dynamic_schema_status {
        info!("Starting reconcilers including DynamicSchema status...");
        tokio::try_join!(
            dns_records.run(),
            DynamicSchemaController::new(client, config).run()
        )?;
    } else {
        dns_records.run().await?;
    }

    warn!("Reconcilers stopped");
    Ok(())
}
