// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! DNS-record reconciler - aggregates the endpoints of target services into the
//! endpoints of a front service.

use crate::config::Config;
use crate::constants::{annotations, DNS_RECORD_CONTROLLER};
use crate::error::{ControllerError, Result};
use crate::generic::object_key;
use crate::index::ReverseIndex;
use crate::kubernetes::{EndpointStore, KubeEndpointStore};
use crate::reconcilers::endpoints::EndpointRouter;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{EndpointSubset, Endpoints, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{
    api::ObjectMeta,
    runtime::{
        controller::{self, Action},
        reflector, watcher, Controller, WatchStreamExt,
    },
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// A `"<namespace>:<name>"` entry of the target annotation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetRef {
    pub namespace: String,
    pub name: String,
}

/// Parse the target annotation value. Any malformed entry fails the whole list.
/// Parts after the second `:` are ignored.
pub fn parse_target_references(value: &str) -> Result<Vec<TargetRef>> {
    let records: Vec<String> =
        serde_json::from_str(value).map_err(|e| ControllerError::InvalidAnnotation {
            annotation: annotations::TARGET_DNS_RECORD_IDS.to_string(),
            reason: format!("{} is not a JSON string array: {}", value, e),
        })?;

    records
        .iter()
        .map(|record| {
            let groomed = record.trim();
            let mut parts = groomed.split(':');
            match (parts.next(), parts.next()) {
                (Some(namespace), Some(name)) => Ok(TargetRef {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                }),
                _ => Err(ControllerError::InvalidTargetReference(groomed.to_string())),
            }
        })
        .collect()
}

fn owner_reference(service: &Service) -> OwnerReference {
    OwnerReference {
        api_version: "v1".to_string(),
        kind: "Service".to_string(),
        name: service.name_any(),
        uid: service.uid().unwrap_or_default(),
        controller: Some(true),
        ..Default::default()
    }
}

/// Keeps the endpoints of every annotated front service equal to the
/// concatenated subsets of its targets, and records which endpoints each front
/// service depends on.
#[derive(Clone)]
pub struct DnsRecordReconciler {
    endpoints: Arc<dyn EndpointStore>,
    index: ReverseIndex,
}

impl DnsRecordReconciler {
    pub fn new(endpoints: Arc<dyn EndpointStore>, index: ReverseIndex) -> Self {
        Self { endpoints, index }
    }

    pub fn index(&self) -> &ReverseIndex {
        &self.index
    }

    /// `service` is `None` once the front service is gone from the cache.
    #[instrument(skip(self, service))]
    pub async fn sync(&self, key: &str, service: Option<&Service>) -> Result<()> {
        match service {
            Some(service) if service.metadata.deletion_timestamp.is_none() => {
                self.reconcile_endpoints(key, service).await
            }
            // the synthetic endpoints are garbage collected through the owner reference
            _ => {
                if self.index.remove(key) {
                    debug!("Forgot targets of DNSRecord service [{}]", key);
                }
                Ok(())
            }
        }
    }

    async fn reconcile_endpoints(&self, key: &str, service: &Service) -> Result<()> {
        let Some(value) = service.annotations().get(annotations::TARGET_DNS_RECORD_IDS) else {
            return Ok(());
        };
        let targets = parse_target_references(value)?;

        let mut subsets: Vec<EndpointSubset> = Vec::new();
        let mut target_keys = HashSet::new();
        for target in &targets {
            let endpoints = match self.endpoints.get(&target.namespace, &target.name).await {
                Ok(Some(endpoints)) => endpoints,
                Ok(None) => {
                    warn!(
                        "Failed to fetch endpoints for dns record [{}:{}]: not found",
                        target.namespace, target.name
                    );
                    continue;
                }
                Err(e) => {
                    warn!(
                        "Failed to fetch endpoints for dns record [{}:{}]: [{}]",
                        target.namespace, target.name, e
                    );
                    continue;
                }
            };
            if endpoints.metadata.deletion_timestamp.is_some() {
                warn!(
                    "Failed to fetch endpoints for dns record [{}:{}]: endpoint is being removed",
                    target.namespace, target.name
                );
                continue;
            }
            target_keys.insert(format!(
                "{}/{}",
                endpoints.namespace().unwrap_or_default(),
                endpoints.name_any()
            ));
            subsets.extend(endpoints.subsets.unwrap_or_default());
        }
        self.index.store(key, target_keys);

        let namespace = service.namespace().unwrap_or_default();
        let name = service.name_any();
        let existing = self
            .endpoints
            .get(&namespace, &name)
            .await
            .map_err(|e| ControllerError::EndpointLookup {
                namespace: namespace.clone(),
                name: name.clone(),
                source: Box::new(e),
            })?;

        match existing {
            None => {
                let endpoints = Endpoints {
                    metadata: ObjectMeta {
                        name: Some(name),
                        namespace: Some(namespace),
                        owner_references: Some(vec![owner_reference(service)]),
                        ..Default::default()
                    },
                    subsets: (!subsets.is_empty()).then_some(subsets),
                };
                info!(
                    "Creating endpoints for targetDnsRecordIds service [{}]: {:?}",
                    key, endpoints.subsets
                );
                self.endpoints.create(&endpoints).await?;
            }
            Some(current)
                if current.subsets.as_deref().unwrap_or_default() == subsets.as_slice() =>
            {
                debug!("Endpoints are up to date for DNSRecord service [{}]", name);
            }
            Some(current) => {
                info!(
                    "Updating endpoints for DNSRecord service [{}]. Old: [{:?}], new: [{:?}]",
                    name, current.subsets, subsets
                );
                let mut to_update = current;
                to_update.subsets = (!subsets.is_empty()).then_some(subsets);
                self.endpoints
                    .update(&to_update)
                    .await
                    .map_err(|e| ControllerError::EndpointUpdate {
                        name,
                        source: Box::new(e),
                    })?;
            }
        }

        Ok(())
    }
}

struct Context {
    reconciler: DnsRecordReconciler,
    error_requeue: Duration,
}

impl Context {
    /// Called once the controller finds `namespace/name` gone from its cache
    async fn on_removed(&self, namespace: Option<&str>, name: &str) -> Result<()> {
        self.reconciler.sync(&object_key(namespace, name), None).await
    }
}

/// The services to reconcile are limited to `watch_namespace`. Targets may live in
/// any namespace, so endpoints are always watched cluster-wide.
fn watched_apis(client: &Client, config: &Config) -> (Api<Service>, Api<Endpoints>) {
    let services = match &config.watch_namespace {
        Some(ns) => Api::namespaced(client.clone(), ns),
        None => Api::all(client.clone()),
    };
    (services, Api::all(client.clone()))
}

/// Runs the DNS-record reconciler over every service, re-enqueued by changes to
/// the endpoints the services depend on.
pub struct DnsRecordController {
    client: Client,
    config: Config,
    index: ReverseIndex,
}

impl DnsRecordController {
    pub fn new(client: Client, config: Config) -> Self {
        Self {
            client,
            config,
            index: ReverseIndex::new(),
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let (services, endpoints) = watched_apis(&self.client, &self.config);

        let (endpoint_cache, endpoint_writer) = reflector::store::<Endpoints>();
        let endpoint_changes = watcher(endpoints, WatcherConfig::default())
            .default_backoff()
            .reflect(endpoint_writer)
            .touched_objects();

        let (service_cache, service_writer) = reflector::store::<Service>();
        let service_changes = watcher(services, WatcherConfig::default())
            .default_backoff()
            .reflect(service_writer)
            .touched_objects();

        let router = EndpointRouter::new(self.index.clone());
        let store = KubeEndpointStore::new(self.client.clone(), endpoint_cache);
        let context = Arc::new(Context {
            reconciler: DnsRecordReconciler::new(Arc::new(store), self.index.clone()),
            error_requeue: self.config.error_requeue,
        });
        let removals = context.clone();

        info!("Starting {}", DNS_RECORD_CONTROLLER);

        Controller::for_stream(service_changes, service_cache)
            .watches_stream(endpoint_changes, move |endpoints| {
                router.on_endpoint_change(&endpoints)
            })
            .shutdown_on_signal()
            .run(reconcile, error_policy, context)
            .for_each(|res| {
                let ctx = removals.clone();
                async move {
                    match res {
                        Ok((obj, _)) => debug!("Reconciled service: {}", obj),
                        Err(controller::Error::ObjectNotFound(obj)) => {
                            let removed = ctx.on_removed(obj.namespace.as_deref(), &obj.name);
                            if let Err(e) = removed.await {
                                error!("Failed to forget service {}: {}", obj, e);
                            }
                        }
                        Err(e) => warn!("Reconciliation error: {:?}", e),
                    }
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile(service: Arc<Service>, ctx: Arc<Context>) -> Result<Action> {
    let key = object_key(service.namespace().as_deref(), &service.name_any());
    ctx.reconciler.sync(&key, Some(&service)).await?;
    Ok(Action::await_change())
}

fn error_policy(_service: Arc<Service>, error: &ControllerError, ctx: Arc<Context>) -> Action {
    error!("Reconciliation error: {}", error);
    Action::requeue(ctx.error_requeue)
}
