//! Scaled-object registry.
//!
//! Holds every registered `ScaledObjectSpec`, keyed by `namespace/name`.
//! A `BTreeMap` keeps iteration in key order so lookups that pick "the
//! first matching object" are deterministic across calls.
//!
//! Read methods clone specs out under the read guard and drop it before
//! returning, so callers never hold the registry lock while they talk
//! to metric sources.

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::RwLock;
use tracing::debug;

use crate::types::ScaledObjectSpec;

/// Registry of scaled objects, keyed `namespace/name`.
#[derive(Default)]
pub struct ScaledObjectRegistry {
    objects: RwLock<BTreeMap<String, ScaledObjectSpec>>,
}

impl ScaledObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scaled object. Re-registering the same
    /// `namespace/name` replaces the previous spec.
    pub async fn register(&self, spec: ScaledObjectSpec) {
        let key = spec.object_key();
        let mut objects = self.objects.write().await;
        let replaced = objects.insert(key.clone(), spec).is_some();
        debug!(object = %key, replaced, "scaled object registered");
    }

    /// Remove a scaled object. Returns false when it was not present.
    pub async fn unregister(&self, namespace: &str, name: &str) -> bool {
        let key = format!("{namespace}/{name}");
        let mut objects = self.objects.write().await;
        let removed = objects.remove(&key).is_some();
        debug!(object = %key, removed, "scaled object unregistered");
        removed
    }

    /// Look up one scaled object.
    pub async fn get(&self, namespace: &str, name: &str) -> Option<ScaledObjectSpec> {
        let key = format!("{namespace}/{name}");
        self.objects.read().await.get(&key).cloned()
    }

    /// All scaled objects, in key order.
    pub async fn list(&self) -> Vec<ScaledObjectSpec> {
        self.objects.read().await.values().cloned().collect()
    }

    /// All scaled objects in one namespace, in name order.
    pub async fn list_namespace(&self, namespace: &str) -> Vec<ScaledObjectSpec> {
        let prefix = format!("{namespace}/");
        self.objects
            .read()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, spec)| spec.clone())
            .collect()
    }

    /// Distinct metric names served by any registered trigger, sorted.
    /// Infallible: an empty registry yields an empty list.
    pub async fn metric_names(&self) -> Vec<String> {
        let objects = self.objects.read().await;
        let names: BTreeSet<String> = objects
            .values()
            .flat_map(|spec| spec.triggers.iter().map(|t| t.metric.clone()))
            .collect();
        names.into_iter().collect()
    }

    /// First scaled object in `namespace` with a trigger serving
    /// `metric_name`, in name order.
    pub async fn metric_owner(&self, namespace: &str, metric_name: &str) -> Option<ScaledObjectSpec> {
        let prefix = format!("{namespace}/");
        self.objects
            .read()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, spec)| spec)
            .find(|spec| spec.serves_metric(metric_name))
            .cloned()
    }

    /// Number of registered scaled objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}
