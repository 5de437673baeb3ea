//! Provider facade: the full capability set the host metrics-query
//! API server consumes.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use scalegrid_core::{
    CustomMetricInfo, CustomMetricValue, CustomMetricValueList, ExternalMetricInfo,
    ExternalMetricValue, ExternalMetricValueList, LabelSelector, NamespacedName,
};
use scalegrid_scaler::{ScaleHandler, ScaledObjectRegistry};

use crate::catalog::MetricCatalog;
use crate::error::{ProviderError, ProviderResult};
use crate::resolver::MetricResolver;

/// The operations the host metrics-query API server drives.
///
/// A provider must answer all five even when it declines to implement
/// one: unimplemented operations answer `Unavailable` rather than
/// being absent, and the custom-metric listing answers an empty list
/// because the host treats that listing as infallible.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Every external metric this provider can currently serve.
    /// Infallible per the host contract.
    async fn list_all_external_metrics(&self) -> Vec<ExternalMetricInfo>;

    /// Resolve an external metric query.
    async fn get_external_metric(
        &self,
        namespace: &str,
        selector: &LabelSelector,
        info: &ExternalMetricInfo,
    ) -> ProviderResult<ExternalMetricValueList>;

    /// Custom metric for one named object.
    async fn get_metric_by_name(
        &self,
        name: &NamespacedName,
        info: &CustomMetricInfo,
    ) -> ProviderResult<CustomMetricValue>;

    /// Custom metric for all objects matching a selector.
    async fn get_metric_by_selector(
        &self,
        namespace: &str,
        selector: &LabelSelector,
        info: &CustomMetricInfo,
    ) -> ProviderResult<CustomMetricValueList>;

    /// Every custom metric this provider can serve. Infallible per the
    /// host contract.
    async fn list_all_metrics(&self) -> Vec<CustomMetricInfo>;
}

/// A locally held external-metric descriptor.
#[derive(Debug, Clone)]
pub struct ExternalMetric {
    pub info: ExternalMetricInfo,
    pub labels: BTreeMap<String, String>,
    pub value: ExternalMetricValue,
}

/// The ScaleGrid provider: external metrics resolved through the
/// scaling subsystem, custom metrics declared unimplemented.
///
/// Construction takes ready handles and the provider is immediately
/// serviceable. All fields are read-only afterwards, so concurrent
/// queries share `&self` with no locking at this layer.
pub struct Provider {
    catalog: MetricCatalog,
    resolver: MetricResolver,
    /// Scaled-object accessor, reserved for the custom-metric path.
    #[allow(dead_code)]
    registry: Arc<ScaledObjectRegistry>,
    /// Placeholder custom-metric values; nothing populates this yet.
    #[allow(dead_code)]
    values: HashMap<CustomMetricInfo, i64>,
    /// Local descriptor collection. The catalog reads through to the
    /// scaling subsystem instead of consulting this.
    #[allow(dead_code)]
    external_metrics: Vec<ExternalMetric>,
}

impl Provider {
    /// Build a provider over a ready scale handler and registry.
    pub fn new(registry: Arc<ScaledObjectRegistry>, handler: Arc<dyn ScaleHandler>) -> Self {
        Self {
            catalog: MetricCatalog::new(handler.clone()),
            resolver: MetricResolver::new(handler),
            registry,
            values: HashMap::new(),
            external_metrics: Vec::new(),
        }
    }
}

#[async_trait]
impl MetricsProvider for Provider {
    async fn list_all_external_metrics(&self) -> Vec<ExternalMetricInfo> {
        self.catalog.list().await
    }

    async fn get_external_metric(
        &self,
        namespace: &str,
        selector: &LabelSelector,
        info: &ExternalMetricInfo,
    ) -> ProviderResult<ExternalMetricValueList> {
        let items = self
            .resolver
            .get_external_metric(namespace, selector, info)
            .await?;
        Ok(ExternalMetricValueList { items })
    }

    async fn get_metric_by_name(
        &self,
        _name: &NamespacedName,
        _info: &CustomMetricInfo,
    ) -> ProviderResult<CustomMetricValue> {
        Err(ProviderError::Unavailable("not implemented yet".to_string()))
    }

    async fn get_metric_by_selector(
        &self,
        namespace: &str,
        selector: &LabelSelector,
        info: &CustomMetricInfo,
    ) -> ProviderResult<CustomMetricValueList> {
        info!(
            group_resource = %info.group_resource,
            %namespace,
            metric = %info.metric,
            selector = %selector,
            "received request for custom metric"
        );
        Err(ProviderError::Unavailable("not implemented yet".to_string()))
    }

    async fn list_all_metrics(&self) -> Vec<CustomMetricInfo> {
        // No custom metrics supported: the empty listing is the
        // declared answer, not an omission.
        Vec::new()
    }
}
