// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Declarative apply of object sets scoped by owner and set-id.
//!
//! Every applied object is labelled with a hash of its owner identity and
//! set-id. Applying a new desired set server-side-applies each object and then
//! deletes every object carrying the same label that is no longer desired, so an
//! empty desired set prunes everything applied before.

use crate::constants::objectset::{
    HASH_LABEL, HASH_LENGTH, ID_ANNOTATION, OWNER_GVK_ANNOTATION, OWNER_NAMESPACE_ANNOTATION,
    OWNER_NAME_ANNOTATION,
};
use crate::error::{ControllerError, Result};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{
    api::{ApiResource, DeleteParams, DynamicObject, ListParams, Patch, PatchParams},
    Api, Client, Resource, ResourceExt,
};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// Identity of the object owning an applied set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerKey {
    pub api_version: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
    pub uid: Option<String>,
}

impl OwnerKey {
    pub fn from_resource<K: Resource<DynamicType = ()>>(obj: &K) -> Self {
        Self {
            api_version: K::api_version(&()).to_string(),
            kind: K::kind(&()).to_string(),
            namespace: obj.meta().namespace.clone(),
            name: obj.meta().name.clone().unwrap_or_default(),
            uid: obj.meta().uid.clone(),
        }
    }

    /// Placeholder owner for an object that no longer exists, from its
    /// `namespace/name` (or cluster-scoped `name`) key. Splits on the last `/`.
    pub fn from_key<K: Resource<DynamicType = ()>>(key: &str) -> Self {
        let (namespace, name) = match key.rsplit_once('/') {
            Some((namespace, name)) => (namespace.trim(), name.trim()),
            None => ("", key.trim()),
        };
        Self {
            api_version: K::api_version(&()).to_string(),
            kind: K::kind(&()).to_string(),
            namespace: (!namespace.is_empty()).then(|| namespace.to_string()),
            name: name.to_string(),
            uid: None,
        }
    }

    /// `group/version, Kind=Kind`
    pub fn gvk(&self) -> String {
        format!("{}, Kind={}", self.api_version, self.kind)
    }

    /// Label value selecting every object applied for this owner and `set_id`
    pub fn set_hash(&self, set_id: &str) -> String {
        let gvk = self.gvk();
        let mut hasher = Sha256::new();
        for part in [
            set_id,
            gvk.as_str(),
            self.namespace.as_deref().unwrap_or_default(),
            self.name.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest = format!("{:x}", hasher.finalize());
        digest[..HASH_LENGTH].to_string()
    }
}

/// Options controlling where generated objects may land
#[derive(Clone, Debug, Default)]
pub struct GeneratingOptions {
    /// Allow children in a namespace other than the owner's
    pub allow_cross_namespace: bool,
    /// Allow cluster-scoped children of a namespaced owner
    pub allow_cluster_scoped: bool,
    /// Do not add an owner reference to the owner on generated children
    pub no_owner_reference: bool,
}

/// Reconciles the actual children of `owner` under `set_id` to `desired`
#[async_trait]
pub trait Applier: Send + Sync {
    async fn apply(
        &self,
        owner: &OwnerKey,
        set_id: &str,
        options: &GeneratingOptions,
        desired: Vec<DynamicObject>,
    ) -> Result<()>;
}

/// A child kind the applier may create and prune
#[derive(Clone, Debug)]
pub struct ManagedKind {
    pub resource: ApiResource,
    pub namespaced: bool,
}

/// [`Applier`] using server-side apply against the Kubernetes API
#[derive(Clone)]
pub struct KubeApplier {
    client: Client,
    field_manager: String,
    kinds: Vec<ManagedKind>,
}

/// (api_version, kind, namespace, name)
type ObjectKey = (String, String, Option<String>, String);

impl KubeApplier {
    pub fn new(client: Client, field_manager: impl Into<String>) -> Self {
        Self {
            client,
            field_manager: field_manager.into(),
            kinds: Vec::new(),
        }
    }

    /// Register a child kind. Only registered kinds are applied and pruned.
    pub fn with_kind(mut self, resource: ApiResource, namespaced: bool) -> Self {
        self.kinds.push(ManagedKind {
            resource,
            namespaced,
        });
        self
    }

    fn kind_for(&self, obj: &DynamicObject) -> Result<&ManagedKind> {
        let types = obj.types.as_ref().ok_or_else(|| {
            ControllerError::ApplyError(format!(
                "object {} has no apiVersion/kind",
                obj.name_any()
            ))
        })?;
        self.kinds
            .iter()
            .find(|k| k.resource.api_version == types.api_version && k.resource.kind == types.kind)
            .ok_or_else(|| {
                ControllerError::ApplyError(format!(
                    "{}, Kind={} is not managed by this applier",
                    types.api_version, types.kind
                ))
            })
    }

    /// Place, validate and label the desired objects
    pub fn prepare(
        &self,
        owner: &OwnerKey,
        set_id: &str,
        options: &GeneratingOptions,
        desired: Vec<DynamicObject>,
    ) -> Result<Vec<(ManagedKind, DynamicObject)>> {
        let hash = owner.set_hash(set_id);
        let mut prepared = Vec::with_capacity(desired.len());

        for mut obj in desired {
            let kind = self.kind_for(&obj)?.clone();
            let name = obj.name_any();

            if kind.namespaced {
                let namespace = obj
                    .metadata
                    .namespace
                    .clone()
                    .or_else(|| owner.namespace.clone())
                    .ok_or_else(|| {
                        ControllerError::ApplyError(format!(
                            "{} {} needs a namespace",
                            kind.resource.kind, name
                        ))
                    })?;
                if let Some(owner_ns) = &owner.namespace {
                    if *owner_ns != namespace && !options.allow_cross_namespace {
                        return Err(ControllerError::ApplyError(format!(
                            "{} {}/{} is outside owner namespace {}",
                            kind.resource.kind, namespace, name, owner_ns
                        )));
                    }
                }
                obj.metadata.namespace = Some(namespace);
            } else {
                if owner.namespace.is_some() && !options.allow_cluster_scoped {
                    return Err(ControllerError::ApplyError(format!(
                        "cluster-scoped {} {} is not allowed for a namespaced owner",
                        kind.resource.kind, name
                    )));
                }
                obj.metadata.namespace = None;
            }

            obj.labels_mut().insert(HASH_LABEL.to_string(), hash.clone());
            let annotations = obj.annotations_mut();
            annotations.insert(ID_ANNOTATION.to_string(), set_id.to_string());
            annotations.insert(OWNER_GVK_ANNOTATION.to_string(), owner.gvk());
            annotations.insert(OWNER_NAME_ANNOTATION.to_string(), owner.name.clone());
            if let Some(owner_ns) = &owner.namespace {
                annotations.insert(OWNER_NAMESPACE_ANNOTATION.to_string(), owner_ns.clone());
            }

            // owner references may not cross namespaces
            let same_scope =
                owner.namespace.is_none() || owner.namespace == obj.metadata.namespace;
            let owned = same_scope && !options.no_owner_reference;
            if let Some(uid) = owner.uid.as_ref().filter(|_| owned) {
                obj.owner_references_mut().push(OwnerReference {
                    api_version: owner.api_version.clone(),
                    kind: owner.kind.clone(),
                    name: owner.name.clone(),
                    uid: uid.clone(),
                    ..Default::default()
                });
            }

            prepared.push((kind, obj));
        }

        Ok(prepared)
    }

    fn api_for(&self, kind: &ManagedKind, namespace: Option<&str>) -> Api<DynamicObject> {
        match (kind.namespaced, namespace) {
            (true, Some(ns)) => Api::namespaced_with(self.client.clone(), ns, &kind.resource),
            _ => Api::all_with(self.client.clone(), &kind.resource),
        }
    }
}

fn object_key(kind: &ManagedKind, obj: &DynamicObject) -> ObjectKey {
    (
        kind.resource.api_version.clone(),
        kind.resource.kind.clone(),
        obj.metadata.namespace.clone(),
        obj.name_any(),
    )
}

#[async_trait]
impl Applier for KubeApplier {
    #[instrument(
        skip(self, options, desired),
        fields(owner = %owner.name, set_id = %set_id, desired = desired.len())
    )]
    async fn apply(
        &self,
        owner: &OwnerKey,
        set_id: &str,
        options: &GeneratingOptions,
        desired: Vec<DynamicObject>,
    ) -> Result<()> {
        let prepared = self.prepare(owner, set_id, options, desired)?;
        let pp = PatchParams::apply(&self.field_manager).force();

        let mut keep = HashSet::new();
        for (kind, obj) in &prepared {
            let name = obj.name_any();
            self.api_for(kind, obj.metadata.namespace.as_deref())
                .patch(&name, &pp, &Patch::Apply(obj))
                .await?;
            debug!("Applied {} {}", kind.resource.kind, name);
            keep.insert(object_key(kind, obj));
        }

        let selector = format!("{}={}", HASH_LABEL, owner.set_hash(set_id));
        for kind in &self.kinds {
            let existing = self
                .api_for(kind, None)
                .list(&ListParams::default().labels(&selector))
                .await?;
            for obj in existing.items {
                if keep.contains(&object_key(kind, &obj)) {
                    continue;
                }
                let name = obj.name_any();
                info!(
                    "Pruning {} {}/{} from set {}",
                    kind.resource.kind,
                    obj.metadata.namespace.as_deref().unwrap_or_default(),
                    name,
                    set_id
                );
                let deleted = self
                    .api_for(kind, obj.metadata.namespace.as_deref())
                    .delete(&name, &DeleteParams::default())
                    .await;
                if let Err(e) = deleted {
                    let e = ControllerError::from(e);
                    // already gone
                    if !e.is_not_found() {
                        return Err(e);
                    }
                }
            }
        }

        Ok(())
    }
}
