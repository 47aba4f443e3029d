// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Endpoint router - maps endpoint changes to the DNS-record services that
//! aggregate them.

use crate::constants::DNS_RECORD_ENDPOINTS_CONTROLLER;
use crate::index::ReverseIndex;
use k8s_openapi::api::core::v1::{Endpoints, Service};
use kube::{runtime::reflector::ObjectRef, ResourceExt};
use tracing::debug;

#[derive(Clone, Debug)]
pub struct EndpointRouter {
    index: ReverseIndex,
}

impl EndpointRouter {
    pub fn new(index: ReverseIndex) -> Self {
        Self { index }
    }

    /// Services depending on the endpoints `namespace/name`, each once
    pub fn dependents(&self, endpoint_key: &str) -> Vec<ObjectRef<Service>> {
        self.index
            .dependents(endpoint_key)
            .into_iter()
            .map(|front| match front.split_once('/') {
                Some((namespace, name)) => ObjectRef::new(name).within(namespace),
                None => ObjectRef::new(&front),
            })
            .collect()
    }

    /// Called for every applied or deleted `Endpoints` object
    pub fn on_endpoint_change(&self, endpoints: &Endpoints) -> Vec<ObjectRef<Service>> {
        let key = format!(
            "{}/{}",
            endpoints.namespace().unwrap_or_default(),
            endpoints.name_any()
        );
        let services = self.dependents(&key);
        if !services.is_empty() {
            debug!(
                "{}: endpoints [{}] changed, enqueuing {} services",
                DNS_RECORD_ENDPOINTS_CONTROLLER,
                key,
                services.len()
            );
        }
        services
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::annotations;
    use crate::reconcilers::dnsrecord::DnsRecordReconciler;
    use crate::test_utils::FakeEndpointStore;
    use kube::api::ObjectMeta;
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Arc;

    fn set(keys: &[&str]) -> HashSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn endpoints(namespace: &str, name: &str) -> Endpoints {
        Endpoints {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            subsets: None,
        }
    }

    #[test]
    fn test_shared_endpoint_routes_every_front_once() {
        let index = ReverseIndex::new();
        index.store("default/one", set(&["ns1/svcA", "ns2/svcB"]));
        index.store("apps/two", set(&["ns2/svcB"]));
        let router = EndpointRouter::new(index);

        let routed = router.on_endpoint_change(&endpoints("ns2", "svcB"));

        assert_eq!(
            routed,
            vec![
                ObjectRef::<Service>::new("two").within("apps"),
                ObjectRef::<Service>::new("one").within("default"),
            ]
        );
        assert_eq!(
            router.on_endpoint_change(&endpoints("ns1", "svcA")),
            vec![ObjectRef::<Service>::new("one").within("default")]
        );
    }

    #[test]
    fn test_unknown_endpoint_routes_nothing() {
        let index = ReverseIndex::new();
        index.store("default/one", set(&["ns1/svcA"]));
        let router = EndpointRouter::new(index);

        assert!(router.on_endpoint_change(&endpoints("ns1", "other")).is_empty());
        assert!(router.dependents("ns9/svcA").is_empty());
    }

    #[tokio::test]
    async fn test_deleted_front_is_no_longer_routed() {
        let store = FakeEndpointStore::default().with_endpoints(endpoints("ns1", "svcA"));
        let index = ReverseIndex::new();
        let reconciler = DnsRecordReconciler::new(Arc::new(store), index.clone());
        let router = EndpointRouter::new(index);
        let service = Service {
            metadata: ObjectMeta {
                name: Some("front".to_string()),
                namespace: Some("default".to_string()),
                annotations: Some(BTreeMap::from([(
                    annotations::TARGET_DNS_RECORD_IDS.to_string(),
                    r#"["ns1:svcA"]"#.to_string(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        };

        reconciler.sync("default/front", Some(&service)).await.unwrap();
        assert_eq!(
            router.on_endpoint_change(&endpoints("ns1", "svcA")),
            vec![ObjectRef::<Service>::new("front").within("default")]
        );

        reconciler.sync("default/front", None).await.unwrap();
        assert!(router.on_endpoint_change(&endpoints("ns1", "svcA")).is_empty());
    }
}
