// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Endpoints access: cached reads, direct writes.

use crate::error::{ControllerError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Endpoints;
use kube::{
    api::PostParams,
    runtime::reflector::{ObjectRef, Store},
    Api, Client, ResourceExt,
};
use tracing::instrument;

/// Object store for `Endpoints`.
///
/// `get` reads through the informer cache and returns `Ok(None)` when the object
/// is not known. It waits for the initial list to complete. Writes go to the API
/// server and fail with a 409 conflict when the object's `resourceVersion` is stale.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Endpoints>>;

    async fn create(&self, endpoints: &Endpoints) -> Result<Endpoints>;

    async fn update(&self, endpoints: &Endpoints) -> Result<Endpoints>;
}

/// [`EndpointStore`] backed by a reflector cache and the Kubernetes API
#[derive(Clone)]
pub struct KubeEndpointStore {
    client: Client,
    cache: Store<Endpoints>,
}

impl KubeEndpointStore {
    pub fn new(client: Client, cache: Store<Endpoints>) -> Self {
        Self { client, cache }
    }

    fn api(&self, namespace: &str) -> Api<Endpoints> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl EndpointStore for KubeEndpointStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Endpoints>> {
        // lookups before the initial list completes would miss existing objects
        self.cache
            .wait_until_ready()
            .await
            .map_err(|e| ControllerError::CacheUnavailable(e.to_string()))?;
        let key = ObjectRef::<Endpoints>::new(name).within(namespace);
        Ok(self.cache.get(&key).map(|ep| (*ep).clone()))
    }

    #[instrument(
        skip(self, endpoints),
        fields(
            namespace = %endpoints.namespace().unwrap_or_default(),
            name = %endpoints.name_any()
        )
    )]
    async fn create(&self, endpoints: &Endpoints) -> Result<Endpoints> {
        let namespace = endpoints.namespace().unwrap_or_default();
        Ok(self
            .api(&namespace)
            .create(&PostParams::default(), endpoints)
            .await?)
    }

    #[instrument(
        skip(self, endpoints),
        fields(
            namespace = %endpoints.namespace().unwrap_or_default(),
            name = %endpoints.name_any()
        )
    )]
    async fn update(&self, endpoints: &Endpoints) -> Result<Endpoints> {
        let namespace = endpoints.namespace().unwrap_or_default();
        Ok(self
            .api(&namespace)
            .replace(&endpoints.name_any(), &PostParams::default(), endpoints)
            .await?)
    }
}
