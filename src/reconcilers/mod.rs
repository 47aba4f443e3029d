// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes reconcilers that react to watch events.

pub mod dnsrecord;
pub mod dynamic_schema;
pub mod endpoints;

pub use dnsrecord::{DnsRecordController, DnsRecordReconciler};
pub use dynamic_schema::DynamicSchemaController;
pub use endpoints::EndpointRouter;
