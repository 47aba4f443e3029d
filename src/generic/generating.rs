// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Child-object generation applied as an owner-scoped set.

use super::apply::{Applier, GeneratingOptions, OwnerKey};
use super::{GeneratingHandler, StatusHandler, WithStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct GeneratingSync<K: WithStatus> {
    generator: Arc<dyn GeneratingHandler<K>>,
    applier: Arc<dyn Applier>,
    options: GeneratingOptions,
    set_id: String,
}

impl<K: WithStatus> Clone for GeneratingSync<K> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            applier: self.applier.clone(),
            options: self.options.clone(),
            set_id: self.set_id.clone(),
        }
    }
}

impl<K: WithStatus> GeneratingSync<K> {
    pub fn new(
        generator: Arc<dyn GeneratingHandler<K>>,
        applier: Arc<dyn Applier>,
        set_id: impl Into<String>,
        options: GeneratingOptions,
    ) -> Self {
        Self {
            generator,
            applier,
            options,
            set_id: set_id.into(),
        }
    }

    /// Prunes every child applied for `key` once the object is gone.
    /// Does nothing while the object still exists.
    #[instrument(skip(self, obj))]
    pub async fn remove(&self, key: &str, obj: Option<&K>) -> Result<()> {
        if obj.is_some() {
            return Ok(());
        }

        info!("{} {} removed, pruning set {}", K::kind(&()), key, self.set_id);
        let owner = OwnerKey::from_key::<K>(key);
        self.applier
            .apply(&owner, &self.set_id, &self.options, Vec::new())
            .await
    }

    /// Generates and applies the children of `obj`. Objects being deleted keep
    /// their status and get no new children.
    pub async fn handle(&self, obj: &K, status: K::Status) -> Result<K::Status> {
        if obj.meta().deletion_timestamp.is_some() {
            return Ok(status);
        }

        let (objects, new_status) = self.generator.generate(obj, status).await?;
        debug!(
            "Applying {} objects for {} {}",
            objects.len(),
            K::kind(&()),
            obj.meta().name.as_deref().unwrap_or_default()
        );

        let owner = OwnerKey::from_resource(obj);
        self.applier
            .apply(&owner, &self.set_id, &self.options, objects)
            .await?;

        Ok(new_status)
    }
}

#[async_trait]
impl<K: WithStatus> StatusHandler<K> for GeneratingSync<K> {
    async fn on_status(&self, obj: &K, status: K::Status) -> Result<K::Status> {
        self.handle(obj, status).await
    }
}
