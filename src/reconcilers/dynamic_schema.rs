// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! DynamicSchema status controller - validates registered schemas and reports
//! the outcome on the `Registered` condition.

use crate::config::Config;
use crate::constants::DYNAMIC_SCHEMA_STATUS_HANDLER;
use crate::error::{ControllerError, Result};
use crate::generic::{register_status_handler, Cond, HandlerConfig, KubeStatusClient};
use crate::types::dynamic_schema::{DynamicSchema, DynamicSchemaStatus};
use kube::{Api, Client};
use std::sync::Arc;

pub const REGISTERED: &str = "Registered";

/// Rejects schemas carrying fields without a type
pub fn validate_schema(
    schema: &DynamicSchema,
    status: DynamicSchemaStatus,
) -> Result<DynamicSchemaStatus> {
    let untyped: Vec<&str> = schema
        .spec
        .resource_fields
        .iter()
        .chain(schema.spec.collection_fields.iter())
        .filter(|(_, field)| field.field_type.trim().is_empty())
        .map(|(name, _)| name.as_str())
        .collect();

    if !untyped.is_empty() {
        return Err(ControllerError::Handler(format!(
            "fields without a type: {}",
            untyped.join(", ")
        )));
    }
    Ok(status)
}

pub struct DynamicSchemaController {
    client: Client,
    config: Config,
}

impl DynamicSchemaController {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let schemas: Api<DynamicSchema> = Api::all(self.client.clone());
        let handler_config = HandlerConfig::new(DYNAMIC_SCHEMA_STATUS_HANDLER)
            .with_condition(Cond::new(REGISTERED))
            .with_error_requeue(self.config.error_requeue);

        register_status_handler(
            schemas,
            Arc::new(KubeStatusClient::<DynamicSchema>::new(self.client)),
            handler_config,
            Arc::new(validate_schema),
        )
        .await
    }
}
