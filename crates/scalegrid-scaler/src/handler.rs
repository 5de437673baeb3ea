//! Scale handler: answers metric queries from registered scaled objects.
//!
//! Resolution is two-tier. A query for `(namespace, metric)` first
//! looks for a scaled object in that namespace with a trigger serving
//! the metric; an exact match answers alone and the query's selector
//! is ignored. Only when no object in the namespace serves the metric
//! does the handler fall back to a selector scan over the whole
//! registry: every scaled object whose labels satisfy the selector
//! contributes its triggers for the requested metric, and the union of
//! their samples is the answer.
//!
//! Either tier fetches from trigger sources with no registry lock held,
//! and a single source failure fails the whole query rather than
//! returning a partial union.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tracing::debug;

use scalegrid_core::{ExternalMetricValue, LabelSelector};

use crate::error::ScalerResult;
use crate::registry::ScaledObjectRegistry;
use crate::source::build_source;
use crate::types::ScaledObjectSpec;

/// The scaling subsystem as the provider sees it.
#[async_trait]
pub trait ScaleHandler: Send + Sync {
    /// Resolve current values for `metric_name` in `namespace`,
    /// scoped by `selector`. An empty result is a successful answer,
    /// not an error.
    async fn get_scaled_object_metrics(
        &self,
        namespace: &str,
        selector: &LabelSelector,
        metric_name: &str,
    ) -> ScalerResult<Vec<ExternalMetricValue>>;

    /// Distinct metric names served by registered scaled objects.
    /// Infallible so capability listings never depend on source health.
    async fn get_external_metric_names(&self) -> Vec<String>;
}

/// `ScaleHandler` over the trigger registry.
pub struct TriggerScaleHandler {
    registry: Arc<ScaledObjectRegistry>,
}

impl TriggerScaleHandler {
    pub fn new(registry: Arc<ScaledObjectRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ScaledObjectRegistry> {
        &self.registry
    }

    /// Fetch one sample per trigger of `spec` serving `metric_name`.
    async fn resolve_object(
        &self,
        spec: &ScaledObjectSpec,
        metric_name: &str,
    ) -> ScalerResult<Vec<ExternalMetricValue>> {
        let mut values = Vec::new();
        let timestamp = epoch_secs();
        for trigger in spec.triggers.iter().filter(|t| t.metric == metric_name) {
            let source = build_source(&trigger.source)?;
            let value = source.fetch().await?;
            values.push(ExternalMetricValue {
                metric_name: trigger.metric.clone(),
                labels: spec.labels.clone(),
                value,
                timestamp,
            });
        }
        Ok(values)
    }
}

#[async_trait]
impl ScaleHandler for TriggerScaleHandler {
    async fn get_scaled_object_metrics(
        &self,
        namespace: &str,
        selector: &LabelSelector,
        metric_name: &str,
    ) -> ScalerResult<Vec<ExternalMetricValue>> {
        if let Some(owner) = self.registry.metric_owner(namespace, metric_name).await {
            debug!(
                %namespace,
                metric = %metric_name,
                object = %owner.object_key(),
                "resolving metric from exact-match scaled object"
            );
            return self.resolve_object(&owner, metric_name).await;
        }

        let candidates = self.registry.list().await;
        debug!(
            %namespace,
            metric = %metric_name,
            selector = %selector,
            candidates = candidates.len(),
            "no exact match, scanning registered objects by selector"
        );
        let mut values = Vec::new();
        for spec in candidates.iter().filter(|s| selector.matches(&s.labels)) {
            values.extend(self.resolve_object(spec, metric_name).await?);
        }
        Ok(values)
    }

    async fn get_external_metric_names(&self) -> Vec<String> {
        self.registry.metric_names().await
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScalerError;
    use crate::types::{TriggerSpec, TriggerSource};
    use std::collections::BTreeMap;

    fn static_spec(
        namespace: &str,
        name: &str,
        labels: &[(&str, &str)],
        triggers: &[(&str, f64)],
    ) -> ScaledObjectSpec {
        ScaledObjectSpec {
            namespace: namespace.to_string(),
            name: name.to_string(),
            labels: labels
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            triggers: triggers
                .iter()
                .map(|(metric, value)| TriggerSpec {
                    metric: metric.to_string(),
                    source: TriggerSource::Static { value: *value },
                })
                .collect(),
        }
    }

    async fn handler_with(specs: Vec<ScaledObjectSpec>) -> TriggerScaleHandler {
        let registry = Arc::new(ScaledObjectRegistry::new());
        for spec in specs {
            registry.register(spec).await;
        }
        TriggerScaleHandler::new(registry)
    }

    fn all() -> LabelSelector {
        LabelSelector::default()
    }

    #[tokio::test]
    async fn exact_match_answers_alone() {
        let handler = handler_with(vec![
            static_spec("prod", "worker", &[("app", "worker")], &[("queueLength", 42.0)]),
            static_spec("prod", "web", &[("app", "web")], &[("rps", 10.0)]),
        ])
        .await;

        let values = handler
            .get_scaled_object_metrics("prod", &all(), "queueLength")
            .await
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].metric_name, "queueLength");
        assert_eq!(values[0].value, 42.0);
        assert_eq!(values[0].labels.get("app").map(String::as_str), Some("worker"));
    }

    #[tokio::test]
    async fn exact_match_ignores_selector() {
        let handler = handler_with(vec![static_spec(
            "prod",
            "worker",
            &[("app", "worker")],
            &[("queueLength", 42.0)],
        )])
        .await;

        // The owner's labels do not satisfy this selector, but the
        // exact match wins before the selector is consulted.
        let selector = LabelSelector::parse("app=somethingelse").unwrap();
        let values = handler
            .get_scaled_object_metrics("prod", &selector, "queueLength")
            .await
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, 42.0);
    }

    #[tokio::test]
    async fn exact_match_short_circuits_scan() {
        // staging/other also serves queueLength and matches the
        // selector, but the prod owner answers alone.
        let handler = handler_with(vec![
            static_spec("prod", "worker", &[("team", "pay")], &[("queueLength", 42.0)]),
            static_spec("staging", "other", &[("team", "pay")], &[("queueLength", 7.0)]),
        ])
        .await;

        let selector = LabelSelector::parse("team=pay").unwrap();
        let values = handler
            .get_scaled_object_metrics("prod", &selector, "queueLength")
            .await
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].value, 42.0);
    }

    #[tokio::test]
    async fn selector_scan_unions_across_registry() {
        // No object in prod serves queueLength, so the selector scan
        // runs over everything registered.
        let handler = handler_with(vec![
            static_spec("staging", "a", &[("team", "pay")], &[("queueLength", 2.0)]),
            static_spec("staging", "b", &[("team", "pay")], &[("queueLength", 3.0)]),
            static_spec("dev", "c", &[("team", "ads")], &[("queueLength", 9.0)]),
        ])
        .await;

        let selector = LabelSelector::parse("team=pay").unwrap();
        let values = handler
            .get_scaled_object_metrics("prod", &selector, "queueLength")
            .await
            .unwrap();
        let mut got: Vec<f64> = values.iter().map(|v| v.value).collect();
        got.sort_by(f64::total_cmp);
        assert_eq!(got, [2.0, 3.0]);
    }

    #[tokio::test]
    async fn selector_scan_skips_non_matching_labels() {
        let handler = handler_with(vec![static_spec(
            "staging",
            "worker",
            &[("team", "ads")],
            &[("queueLength", 9.0)],
        )])
        .await;

        let selector = LabelSelector::parse("team=pay").unwrap();
        let values = handler
            .get_scaled_object_metrics("prod", &selector, "queueLength")
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn no_owner_and_no_match_yields_empty() {
        let handler = handler_with(vec![]).await;
        let values = handler
            .get_scaled_object_metrics("prod", &all(), "queueLength")
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn multiple_triggers_same_metric_all_contribute() {
        let handler = handler_with(vec![static_spec(
            "prod",
            "worker",
            &[],
            &[("queueLength", 1.0), ("queueLength", 2.0), ("other", 9.0)],
        )])
        .await;

        let values = handler
            .get_scaled_object_metrics("prod", &all(), "queueLength")
            .await
            .unwrap();
        let mut got: Vec<f64> = values.iter().map(|v| v.value).collect();
        got.sort_by(f64::total_cmp);
        assert_eq!(got, [1.0, 2.0]);
    }

    #[tokio::test]
    async fn source_failure_fails_whole_query() {
        // One healthy static trigger plus one http trigger pointing at
        // a closed port: the query must surface the error, not a
        // partial answer.
        let registry = Arc::new(ScaledObjectRegistry::new());
        registry
            .register(ScaledObjectSpec {
                namespace: "prod".to_string(),
                name: "worker".to_string(),
                labels: BTreeMap::new(),
                triggers: vec![
                    TriggerSpec {
                        metric: "queueLength".to_string(),
                        source: TriggerSource::Static { value: 1.0 },
                    },
                    TriggerSpec {
                        metric: "queueLength".to_string(),
                        source: TriggerSource::Http {
                            endpoint: unreachable_endpoint().await,
                            value_path: None,
                            timeout: Some("250ms".to_string()),
                        },
                    },
                ],
            })
            .await;
        let handler = TriggerScaleHandler::new(registry);

        let err = handler
            .get_scaled_object_metrics("prod", &all(), "queueLength")
            .await
            .unwrap_err();
        assert!(matches!(err, ScalerError::Connection(_) | ScalerError::Timeout(_)));
    }

    #[tokio::test]
    async fn metric_names_reflect_registry() {
        let handler = handler_with(vec![
            static_spec("prod", "worker", &[], &[("queueLength", 1.0)]),
            static_spec("staging", "api", &[], &[("rps", 1.0), ("queueLength", 2.0)]),
        ])
        .await;

        assert_eq!(
            handler.get_external_metric_names().await,
            ["queueLength", "rps"]
        );
    }

    /// An endpoint whose port was just closed.
    async fn unreachable_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}/depth")
    }
}
