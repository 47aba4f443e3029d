// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes object store access used by the reconcilers.

pub mod endpoints;

pub use endpoints::{EndpointStore, KubeEndpointStore};
