// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys read by the DNS-record controller
pub mod annotations {
    /// JSON array of `"<namespace>:<name>"` target service references
    pub const TARGET_DNS_RECORD_IDS: &str = "field.cattle.io/targetDnsRecordIds";
}

/// Labels and annotations stamped on declaratively applied object sets
pub mod objectset {
    /// Label selecting every object applied for one owner + set-id
    pub const HASH_LABEL: &str = "objectset.rio.cattle.io/hash";
    pub const ID_ANNOTATION: &str = "objectset.rio.cattle.io/id";
    pub const OWNER_GVK_ANNOTATION: &str = "objectset.rio.cattle.io/owner-gvk";
    pub const OWNER_NAME_ANNOTATION: &str = "objectset.rio.cattle.io/owner-name";
    pub const OWNER_NAMESPACE_ANNOTATION: &str = "objectset.rio.cattle.io/owner-namespace";
    /// Length of the hex digest kept in the hash label
    pub const HASH_LENGTH: usize = 40;
}

/// Handler name of the service reconciler
pub const DNS_RECORD_CONTROLLER: &str = "dnsRecordController";

/// Handler name of the endpoint change router
pub const DNS_RECORD_ENDPOINTS_CONTROLLER: &str = "dnsRecordEndpointsController";

/// Handler name of the DynamicSchema status controller
pub const DYNAMIC_SCHEMA_STATUS_HANDLER: &str = "dynamicSchemaStatus";

/// Default requeue delay after a failed reconcile
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;
