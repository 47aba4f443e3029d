// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controllers running the status and generating handlers for a resource.

use super::apply::{Applier, GeneratingOptions};
use super::generating::GeneratingSync;
use super::status::{StatusClient, StatusSync};
use super::{object_key, Cond, GeneratingHandler, StatusHandler, WithStatus};
use crate::error::{ControllerError, Result};
use futures::StreamExt;
use kube::{
    runtime::{
        controller::{self, Action},
        reflector, watcher, Controller, WatchStreamExt,
    },
    Api, ResourceExt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Settings shared by every registered handler
#[derive(Clone, Debug)]
pub struct HandlerConfig {
    /// Handler name, also the set-id of generated objects
    pub name: String,
    /// Condition reflecting the outcome of the last sync
    pub condition: Option<Cond>,
    pub error_requeue: Duration,
}

impl HandlerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: None,
            error_requeue: Duration::from_secs(crate::constants::DEFAULT_ERROR_REQUEUE_SECS),
        }
    }

    pub fn with_condition(mut self, condition: Cond) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_error_requeue(mut self, error_requeue: Duration) -> Self {
        self.error_requeue = error_requeue;
        self
    }
}

struct Context<K: WithStatus> {
    name: String,
    status: StatusSync<K>,
    generating: Option<GeneratingSync<K>>,
    error_requeue: Duration,
}

impl<K: WithStatus> Context<K> {
    /// Called once the controller finds `namespace/name` gone from its cache
    async fn on_removed(&self, namespace: Option<&str>, name: &str) -> Result<()> {
        let key = object_key(namespace, name);
        debug!("{}: {} {} no longer exists", self.name, K::kind(&()), key);
        self.status.sync(&key, None).await?;
        if let Some(generating) = &self.generating {
            generating.remove(&key, None).await?;
        }
        Ok(())
    }
}

/// Run a controller persisting the status computed by `handler` for every
/// object of `api`.
pub async fn register_status_handler<K: WithStatus>(
    api: Api<K>,
    status_client: Arc<dyn StatusClient<K>>,
    config: HandlerConfig,
    handler: Arc<dyn StatusHandler<K>>,
) -> anyhow::Result<()> {
    let context = Context {
        name: config.name.clone(),
        status: StatusSync::new(status_client, config.condition, handler),
        generating: None,
        error_requeue: config.error_requeue,
    };
    run(api, context).await
}

/// Run a controller applying the children produced by `generator` for every
/// object of `api` and persisting the returned status. Children of deleted
/// objects are pruned.
pub async fn register_generating_handler<K: WithStatus>(
    api: Api<K>,
    status_client: Arc<dyn StatusClient<K>>,
    applier: Arc<dyn Applier>,
    config: HandlerConfig,
    generator: Arc<dyn GeneratingHandler<K>>,
    options: GeneratingOptions,
) -> anyhow::Result<()> {
    let generating = GeneratingSync::new(generator, applier, config.name.clone(), options);
    let context = Context {
        name: config.name.clone(),
        status: StatusSync::new(status_client, config.condition, Arc::new(generating.clone())),
        generating: Some(generating),
        error_requeue: config.error_requeue,
    };
    run(api, context).await
}

async fn run<K: WithStatus>(api: Api<K>, context: Context<K>) -> anyhow::Result<()> {
    info!("Starting {} handler for {}", context.name, K::kind(&()));

    let (reader, writer) = reflector::store();
    let stream = watcher(api, watcher::Config::default())
        .default_backoff()
        .reflect(writer)
        .touched_objects();

    let context = Arc::new(context);
    let removals = context.clone();

    Controller::for_stream(stream, reader)
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|res| {
            let ctx = removals.clone();
            async move {
                match res {
                    Ok((obj, _)) => debug!("{}: synced {}", ctx.name, obj),
                    Err(controller::Error::ObjectNotFound(obj)) => {
                        if let Err(e) = ctx.on_removed(obj.namespace.as_deref(), &obj.name).await {
                            error!("{}: failed to clean up {}: {}", ctx.name, obj, e);
                        }
                    }
                    Err(e) => warn!("{}: reconciliation error: {:?}", ctx.name, e),
                }
            }
        })
        .await;

    Ok(())
}

async fn reconcile<K: WithStatus>(obj: Arc<K>, ctx: Arc<Context<K>>) -> Result<Action> {
    let key = object_key(obj.namespace().as_deref(), &obj.name_any());
    ctx.status.sync(&key, Some(&obj)).await?;
    Ok(Action::await_change())
}

fn error_policy<K: WithStatus>(
    obj: Arc<K>,
    error: &ControllerError,
    ctx: Arc<Context<K>>,
) -> Action {
    if error.is_conflict() {
        debug!("{}: conflict on {}, retrying", ctx.name, obj.name_any());
    } else {
        error!("{}: failed to sync {}: {}", ctx.name, obj.name_any(), error);
    }
    Action::requeue(ctx.error_requeue)
}
