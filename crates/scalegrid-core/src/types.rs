//! Domain types shared across the ScaleGrid metrics provider.
//!
//! These types describe metric identities and resolved metric values as
//! they cross the boundary between the scaling subsystem, the provider
//! facade, and the host metrics-query API. All types are serializable
//! so the host server can render them in API responses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Legal metric names: alphanumeric start/end, with `_`, `.`, `-`
/// allowed in between. Single characters are legal.
static METRIC_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9_.-]*[a-zA-Z0-9])?$").unwrap());

/// Returns true when `name` is a legal metric name.
pub fn is_valid_metric_name(name: &str) -> bool {
    METRIC_NAME_RE.is_match(name)
}

// ── Metric identity ────────────────────────────────────────────────

/// Identity of an external metric: a metric that does not describe any
/// cluster object, only a name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExternalMetricInfo {
    /// Metric name, e.g. `queueLength`.
    pub metric: String,
}

impl ExternalMetricInfo {
    pub fn new(metric: impl Into<String>) -> Self {
        Self { metric: metric.into() }
    }
}

impl fmt::Display for ExternalMetricInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.metric)
    }
}

/// Identity of a custom metric: a metric describing one kind of
/// cluster object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CustomMetricInfo {
    /// Fully qualified group-resource, e.g. `deployments.apps`.
    pub group_resource: String,
    /// Whether the described resource lives in a namespace.
    pub namespaced: bool,
    /// Metric name.
    pub metric: String,
}

impl fmt::Display for CustomMetricInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group_resource, self.metric)
    }
}

/// Namespace-qualified object name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

impl NamespacedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { namespace: namespace.into(), name: name.into() }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// ── Metric values ──────────────────────────────────────────────────

/// A resolved external metric sample.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalMetricValue {
    /// Name of the metric this sample answers.
    pub metric_name: String,
    /// Labels of the scaled object the sample was computed from.
    pub labels: BTreeMap<String, String>,
    /// Sampled value.
    pub value: f64,
    /// Unix timestamp (seconds) when the sample was taken.
    pub timestamp: u64,
}

/// List envelope for external metric samples, as the host API expects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalMetricValueList {
    pub items: Vec<ExternalMetricValue>,
}

impl From<Vec<ExternalMetricValue>> for ExternalMetricValueList {
    fn from(items: Vec<ExternalMetricValue>) -> Self {
        Self { items }
    }
}

/// A resolved custom metric sample. Declared for capability
/// completeness; this provider never produces one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomMetricValue {
    /// Object the sample describes.
    pub described_object: NamespacedName,
    /// Name of the metric this sample answers.
    pub metric: String,
    /// Sampled value.
    pub value: f64,
    /// Unix timestamp (seconds) when the sample was taken.
    pub timestamp: u64,
}

/// List envelope for custom metric samples.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomMetricValueList {
    pub items: Vec<CustomMetricValue>,
}
