//! Domain types for the scaling subsystem.
//!
//! A scaled object is a namespace-scoped workload registration that
//! declares which metrics drive its scaling and where each metric's
//! value comes from. Registrations are loaded from TOML files (see
//! `config`) and held in the `ScaledObjectRegistry`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registered scaled object: a workload plus its metric triggers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScaledObjectSpec {
    /// Namespace the workload lives in.
    pub namespace: String,
    /// Workload name, unique within its namespace.
    pub name: String,
    /// Labels used for selector-scoped metric queries.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Metric triggers. At least one.
    pub triggers: Vec<TriggerSpec>,
}

impl ScaledObjectSpec {
    /// Registry key, `namespace/name`.
    pub fn object_key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// Whether any trigger serves `metric_name`.
    pub fn serves_metric(&self, metric_name: &str) -> bool {
        self.triggers.iter().any(|t| t.metric == metric_name)
    }
}

/// One metric trigger of a scaled object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerSpec {
    /// Metric name this trigger serves, e.g. `queueLength`.
    pub metric: String,
    /// Where the metric value comes from.
    #[serde(flatten)]
    pub source: TriggerSource,
}

/// Trigger source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TriggerSource {
    /// A fixed value. Useful for wiring tests and manual overrides.
    Static { value: f64 },
    /// An HTTP endpoint that reports the current value.
    Http {
        /// Endpoint URL, e.g. `http://queue-stats:8080/depth`.
        endpoint: String,
        /// JSON pointer to the value within the response body, e.g.
        /// `/queue/depth`. When absent the whole body is parsed as a
        /// bare number.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_path: Option<String>,
        /// Request timeout, e.g. `2s` or `500ms`. Defaults to 2s.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout: Option<String>,
    },
}
