// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Status transition and persistence.

use super::condition::{now_rfc3339, Cond};
use super::{StatusHandler, WithStatus};
use crate::error::Result;
use async_trait::async_trait;
use kube::{
    api::{ApiResource, DynamicObject, PostParams},
    Api, Client, ResourceExt,
};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Writes the status subresource of an object
#[async_trait]
pub trait StatusClient<K: WithStatus>: Send + Sync {
    async fn update_status(&self, obj: &K) -> Result<K>;
}

/// [`StatusClient`] issuing `PUT .../status` against the Kubernetes API.
/// Carries the object's `resourceVersion`, so stale writes fail with 409.
pub struct KubeStatusClient<K> {
    client: Client,
    _resource: PhantomData<fn() -> K>,
}

impl<K> KubeStatusClient<K> {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }
}

impl<K> Clone for KubeStatusClient<K> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

#[async_trait]
impl<K: WithStatus> StatusClient<K> for KubeStatusClient<K> {
    async fn update_status(&self, obj: &K) -> Result<K> {
        // erased, `K` may be namespaced or cluster-scoped
        let resource = ApiResource::erase::<K>(&());
        let api: Api<DynamicObject> = match obj.namespace() {
            Some(ns) => Api::namespaced_with(self.client.clone(), &ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        };
        let data = serde_json::to_vec(obj).map_err(kube::Error::SerdeError)?;
        let updated = api
            .replace_status(&obj.name_any(), &PostParams::default(), data)
            .await?;
        let updated = serde_json::to_value(updated).map_err(kube::Error::SerdeError)?;
        Ok(serde_json::from_value(updated).map_err(kube::Error::SerdeError)?)
    }
}

/// Runs a [`StatusHandler`] and persists the resulting status when it changed
pub struct StatusSync<K: WithStatus> {
    client: Arc<dyn StatusClient<K>>,
    condition: Option<Cond>,
    handler: Arc<dyn StatusHandler<K>>,
}

impl<K: WithStatus> Clone for StatusSync<K> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            condition: self.condition.clone(),
            handler: self.handler.clone(),
        }
    }
}

impl<K: WithStatus> StatusSync<K> {
    pub fn new(
        client: Arc<dyn StatusClient<K>>,
        condition: Option<Cond>,
        handler: Arc<dyn StatusHandler<K>>,
    ) -> Self {
        Self {
            client,
            condition,
            handler,
        }
    }

    /// Returns the object as last persisted. When the handler fails its status
    /// is discarded; the first of the handler and persist errors is returned.
    #[instrument(skip(self, obj))]
    pub async fn sync(&self, key: &str, obj: Option<&K>) -> Result<Option<K>> {
        let Some(obj) = obj else {
            return Ok(None);
        };

        let orig_status = obj.status().cloned().unwrap_or_default();
        let mut obj = obj.clone();

        let handled = self.handler.on_status(&obj, orig_status.clone()).await;
        let (mut new_status, mut err) = match handled {
            Ok(status) => (status, None),
            Err(e) => (orig_status.clone(), Some(e)),
        };

        if let Some(condition) = &self.condition {
            // a conflict is retried with a fresh read, not reported
            let reported = err.as_ref().filter(|e| !e.is_conflict());
            condition.set_error(&mut new_status, "", reported);
        }

        if new_status != orig_status {
            if let Some(condition) = &self.condition {
                condition.last_updated(&mut new_status, now_rfc3339());
            }

            debug!("Status of {} changed, updating", key);
            *obj.status_mut() = Some(new_status);
            match self.client.update_status(&obj).await {
                Ok(updated) => obj = updated,
                Err(update_err) => match err {
                    None => err = Some(update_err),
                    Some(_) => warn!("Failed to update status of {}: {}", key, update_err),
                },
            }
        }

        match err {
            Some(e) => Err(e),
            None => Ok(Some(obj)),
        }
    }
}
