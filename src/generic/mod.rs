// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Generic status and apply handlers for resources with a status sub-object.
//!
//! A [`StatusSync`] runs a [`StatusHandler`] and persists the returned status
//! when it changed. A [`GeneratingSync`] is a status handler that additionally
//! asks a [`GeneratingHandler`] for desired child objects and applies them as a
//! set scoped by owner and set-id, pruning children that are no longer desired.

pub mod apply;
pub mod condition;
pub mod controller;
pub mod generating;
pub mod status;

pub use apply::{Applier, GeneratingOptions, KubeApplier, OwnerKey};
pub use condition::{Cond, ConditionedStatus, GenericCondition};
pub use controller::{register_generating_handler, register_status_handler, HandlerConfig};
pub use generating::GeneratingSync;
pub use status::{KubeStatusClient, StatusClient, StatusSync};

use crate::error::Result;
use async_trait::async_trait;
use kube::{api::DynamicObject, Resource};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;

/// A resource with a typed status sub-object
pub trait WithStatus:
    Resource<DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    type Status: ConditionedStatus + Clone + PartialEq + Default + Debug + Send + Sync + 'static;

    fn status(&self) -> Option<&Self::Status>;

    fn status_mut(&mut self) -> &mut Option<Self::Status>;
}

/// Computes the next status of an object
#[async_trait]
pub trait StatusHandler<K: WithStatus>: Send + Sync {
    async fn on_status(&self, obj: &K, status: K::Status) -> Result<K::Status>;
}

#[async_trait]
impl<K, F> StatusHandler<K> for F
where
    K: WithStatus,
    F: Fn(&K, K::Status) -> Result<K::Status> + Send + Sync,
{
    async fn on_status(&self, obj: &K, status: K::Status) -> Result<K::Status> {
        self(obj, status)
    }
}

/// Computes the desired child objects of an object along with its next status
#[async_trait]
pub trait GeneratingHandler<K: WithStatus>: Send + Sync {
    async fn generate(&self, obj: &K, status: K::Status) -> Result<(Vec<DynamicObject>, K::Status)>;
}

#[async_trait]
impl<K, F> GeneratingHandler<K> for F
where
    K: WithStatus,
    F: Fn(&K, K::Status) -> Result<(Vec<DynamicObject>, K::Status)> + Send + Sync,
{
    async fn generate(
        &self,
        obj: &K,
        status: K::Status,
    ) -> Result<(Vec<DynamicObject>, K::Status)> {
        self(obj, status)
    }
}

/// `namespace/name` for namespaced objects, `name` otherwise
pub fn object_key(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{}/{}", ns, name),
        _ => name.to_string(),
    }
}
