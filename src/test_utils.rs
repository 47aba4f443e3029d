// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a mock Kubernetes API and in-memory fakes of the store traits.

use crate::error::{ControllerError, Result};
use crate::generic::{Applier, GeneratingOptions, OwnerKey, StatusClient, WithStatus};
use crate::kubernetes::EndpointStore;
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::Endpoints;
use kube::api::DynamicObject;
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, ResourceExt};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
/// Every request is recorded as `(method, path)`.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, status, body)
    }

    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, status, body)
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Longest registered prefix wins for paths like /api/v1/namespaces/foo
        responses
            .iter()
            .filter(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .max_by_key(|((_, p), _)| p.len())
            .map(|(_, resp)| resp.clone())
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<
            dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>>
                + Send,
        >,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests
            .lock()
            .unwrap()
            .push((method.clone(), path.clone()));
        let response = self.find_response(&method, &path);

        Box::pin(async move {
            let (status, body) =
                response.unwrap_or_else(|| (404, status_json(404, "NotFound", "not found")));
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// A `Status` response body
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    let status = if code < 400 { "Success" } else { "Failure" };
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": status,
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}

/// An `Endpoints` object without subsets
pub fn endpoints_json(namespace: &str, name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Endpoints",
        "metadata": {
            "name": name,
            "namespace": namespace,
            "resourceVersion": "1",
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// A list response wrapping `items`
pub fn list_json(items: Vec<serde_json::Value>) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "List",
        "metadata": {"resourceVersion": "1"},
        "items": items
    })
    .to_string()
}

pub fn api_error(code: u16, reason: &str) -> ControllerError {
    ControllerError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{} error", reason),
        reason: reason.to_string(),
        code,
    }))
}

/// The error a write returns when it lost an optimistic-concurrency race
pub fn conflict_error() -> ControllerError {
    api_error(409, "Conflict")
}

/// A recorded endpoint write
#[derive(Clone, Debug)]
pub enum EndpointWrite {
    Create(Endpoints),
    Update(Endpoints),
}

type Key = (String, String);

fn key_of(endpoints: &Endpoints) -> Key {
    (endpoints.namespace().unwrap_or_default(), endpoints.name_any())
}

/// In-memory [`EndpointStore`]. Writes land in the store, so a second
/// reconcile observes the first one's result.
#[derive(Default)]
pub struct FakeEndpointStore {
    objects: Mutex<HashMap<Key, Endpoints>>,
    failing: Mutex<HashSet<Key>>,
    writes: Mutex<Vec<EndpointWrite>>,
    fail_writes: AtomicBool,
}

impl FakeEndpointStore {
    pub fn with_endpoints(self, endpoints: Endpoints) -> Self {
        self.insert(endpoints);
        self
    }

    pub fn insert(&self, endpoints: Endpoints) {
        self.objects
            .lock()
            .unwrap()
            .insert(key_of(&endpoints), endpoints);
    }

    /// Make lookups of `namespace/name` fail with a server error
    pub fn fail_lookup(&self, namespace: &str, name: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()));
    }

    /// Make every create and update fail with a conflict
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn stored(&self, namespace: &str, name: &str) -> Option<Endpoints> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn writes(&self) -> Vec<EndpointWrite> {
        self.writes.lock().unwrap().clone()
    }

    fn write(
        &self,
        endpoints: &Endpoints,
        record: fn(Endpoints) -> EndpointWrite,
    ) -> Result<Endpoints> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(conflict_error());
        }
        let mut stored = endpoints.clone();
        let version = stored
            .metadata
            .resource_version
            .as_deref()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        stored.metadata.resource_version = Some((version + 1).to_string());
        self.writes.lock().unwrap().push(record(endpoints.clone()));
        self.insert(stored.clone());
        Ok(stored)
    }
}

#[async_trait]
impl EndpointStore for FakeEndpointStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Endpoints>> {
        let key = (namespace.to_string(), name.to_string());
        if self.failing.lock().unwrap().contains(&key) {
            return Err(api_error(500, "InternalError"));
        }
        Ok(self.objects.lock().unwrap().get(&key).cloned())
    }

    async fn create(&self, endpoints: &Endpoints) -> Result<Endpoints> {
        self.write(endpoints, EndpointWrite::Create)
    }

    async fn update(&self, endpoints: &Endpoints) -> Result<Endpoints> {
        self.write(endpoints, EndpointWrite::Update)
    }
}

/// In-memory [`StatusClient`] recording every update it receives
pub struct FakeStatusClient<K> {
    updates: Mutex<Vec<K>>,
    conflict: AtomicBool,
}

impl<K> Default for FakeStatusClient<K> {
    fn default() -> Self {
        Self {
            updates: Mutex::new(Vec::new()),
            conflict: AtomicBool::new(false),
        }
    }
}

impl<K: Clone> FakeStatusClient<K> {
    pub fn updates(&self) -> Vec<K> {
        self.updates.lock().unwrap().clone()
    }

    /// Make every update fail with a conflict
    pub fn fail_with_conflict(&self) {
        self.conflict.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl<K: WithStatus> StatusClient<K> for FakeStatusClient<K> {
    async fn update_status(&self, obj: &K) -> Result<K> {
        self.updates.lock().unwrap().push(obj.clone());
        if self.conflict.load(Ordering::SeqCst) {
            return Err(conflict_error());
        }
        Ok(obj.clone())
    }
}

/// A set handed to [`FakeApplier`]
#[derive(Clone, Debug)]
pub struct AppliedSet {
    pub owner: OwnerKey,
    pub set_id: String,
    pub objects: Vec<DynamicObject>,
}

/// [`Applier`] recording the sets it is asked to apply
#[derive(Default)]
pub struct FakeApplier {
    calls: Mutex<Vec<AppliedSet>>,
    failure: Mutex<Option<String>>,
}

impl FakeApplier {
    pub fn calls(&self) -> Vec<AppliedSet> {
        self.calls.lock().unwrap().clone()
    }

    /// Make every apply fail with `message`
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait]
impl Applier for FakeApplier {
    async fn apply(
        &self,
        owner: &OwnerKey,
        set_id: &str,
        _options: &GeneratingOptions,
        desired: Vec<DynamicObject>,
    ) -> Result<()> {
        if let Some(message) = self.failure.lock().unwrap().clone() {
            return Err(ControllerError::ApplyError(message));
        }
        self.calls.lock().unwrap().push(AppliedSet {
            owner: owner.clone(),
            set_id: set_id.to_string(),
            objects: desired,
        });
        Ok(())
    }
}
