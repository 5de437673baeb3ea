//! Metric resolver: turns one metric query into concrete values.

use std::sync::Arc;

use tracing::{debug, error};

use scalegrid_core::{ExternalMetricInfo, ExternalMetricValue, LabelSelector};
use scalegrid_scaler::ScaleHandler;

use crate::error::ProviderResult;

/// Resolves external metric queries against the scaling subsystem.
///
/// One handler round trip per query, no retry: retry and backoff, if
/// any, belong to the subsystem. Failures pass through unchanged so
/// the caller sees the subsystem's own error text.
pub struct MetricResolver {
    handler: Arc<dyn ScaleHandler>,
}

impl MetricResolver {
    pub fn new(handler: Arc<dyn ScaleHandler>) -> Self {
        Self { handler }
    }

    /// Resolve `info.metric` within `namespace`, scoped by `selector`.
    /// An empty answer is a successful empty list, not an error.
    pub async fn get_external_metric(
        &self,
        namespace: &str,
        selector: &LabelSelector,
        info: &ExternalMetricInfo,
    ) -> ProviderResult<Vec<ExternalMetricValue>> {
        debug!(
            %namespace,
            metric = %info.metric,
            selector = %selector,
            "received external metric request"
        );
        match self
            .handler
            .get_scaled_object_metrics(namespace, selector, &info.metric)
            .await
        {
            Ok(values) => Ok(values),
            Err(e) => {
                error!(
                    %namespace,
                    metric = %info.metric,
                    selector = %selector,
                    error = %e,
                    "cannot resolve external metric"
                );
                Err(e.into())
            }
        }
    }
}
