// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Reverse index from DNS-record services to the endpoints they aggregate.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Concurrency-safe map of front-service key (`namespace/name`) to the set of
/// target endpoint keys it currently depends on.
///
/// Cloning yields another handle to the same map. Writers (the service
/// reconciler) and readers (the endpoint router) run on different workers.
#[derive(Clone, Debug, Default)]
pub struct ReverseIndex {
    entries: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl ReverseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the target set of `front` wholesale
    pub fn store(&self, front: &str, targets: HashSet<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(front.to_string(), targets);
    }

    /// Forget `front`, returning whether an entry existed
    pub fn remove(&self, front: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(front)
            .is_some()
    }

    /// Snapshot of the targets recorded for `front`
    pub fn targets(&self, front: &str) -> Option<HashSet<String>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(front)
            .cloned()
    }

    /// Every front-service key whose target set contains `endpoint`.
    /// Visits all entries; the result is sorted for stable enqueue order.
    pub fn dependents(&self, endpoint: &str) -> Vec<String> {
        let mut fronts: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, targets)| targets.contains(endpoint))
            .map(|(front, _)| front.clone())
            .collect();
        fronts.sort();
        fronts
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
