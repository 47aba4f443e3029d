// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::generic::{ConditionedStatus, GenericCondition, WithStatus};
use kube::CustomResource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A schema registered at runtime with the management API
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, Default, schemars::JsonSchema)]
#[kube(group = "management.cattle.io", version = "v3", kind = "DynamicSchema")]
#[kube(status = "DynamicSchemaStatus")]
#[serde(rename_all = "camelCase")]
pub struct DynamicSchemaSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub schema_name: String,
    #[serde(default)]
    pub embed: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub embed_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub plural_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_methods: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_fields: BTreeMap<String, Field>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_actions: BTreeMap<String, Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collection_methods: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub collection_fields: BTreeMap<String, Field>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub collection_actions: BTreeMap<String, Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_links: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Values>,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub create: bool,
    #[serde(default)]
    pub write_only: bool,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub update: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub valid_chars: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub invalid_chars: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Default value of a field; only the member matching the field type is set
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Values {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub string_slice_value: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
pub struct Action {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub input: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSchemaStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<GenericCondition>,
}

impl ConditionedStatus for DynamicSchemaStatus {
    fn conditions(&self) -> &[GenericCondition] {
        &self.conditions
    }

    fn conditions_mut(&mut self) -> Option<&mut Vec<GenericCondition>> {
        Some(&mut self.conditions)
    }
}

impl WithStatus for DynamicSchema {
    type Status = DynamicSchemaStatus;

    fn status(&self) -> Option<&DynamicSchemaStatus> {
        self.status.as_ref()
    }

    fn status_mut(&mut self) -> &mut Option<DynamicSchemaStatus> {
        &mut self.status
    }
}
