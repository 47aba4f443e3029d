// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Custom resource types.

pub mod dynamic_schema;

pub use dynamic_schema::{DynamicSchema, DynamicSchemaSpec, DynamicSchemaStatus};
