//! Metric catalog: which external metrics this provider can serve.

use std::sync::Arc;

use scalegrid_core::ExternalMetricInfo;
use scalegrid_scaler::ScaleHandler;

/// Lists the external metrics currently served by the scaling
/// subsystem.
///
/// The host contract forbids this listing from failing, so the catalog
/// reads through to the handler's infallible name enumeration and
/// keeps no cache of its own: every call reflects the live
/// scaled-object set.
pub struct MetricCatalog {
    handler: Arc<dyn ScaleHandler>,
}

impl MetricCatalog {
    pub fn new(handler: Arc<dyn ScaleHandler>) -> Self {
        Self { handler }
    }

    /// One `ExternalMetricInfo` per distinct metric name. An empty
    /// subsystem yields an empty list, never an error.
    pub async fn list(&self) -> Vec<ExternalMetricInfo> {
        self.handler
            .get_external_metric_names()
            .await
            .into_iter()
            .map(ExternalMetricInfo::new)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use scalegrid_core::{ExternalMetricValue, LabelSelector};
    use scalegrid_scaler::{ScalerError, ScalerResult};

    /// Handler stub with fixed names and a failing resolution path,
    /// proving the listing never touches resolution.
    struct FixedNames(Vec<&'static str>);

    #[async_trait]
    impl ScaleHandler for FixedNames {
        async fn get_scaled_object_metrics(
            &self,
            _namespace: &str,
            _selector: &LabelSelector,
            _metric_name: &str,
        ) -> ScalerResult<Vec<ExternalMetricValue>> {
            Err(ScalerError::Connection("unreachable".to_string()))
        }

        async fn get_external_metric_names(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    #[tokio::test]
    async fn lists_one_info_per_name() {
        let catalog = MetricCatalog::new(Arc::new(FixedNames(vec!["cpu", "queueLength"])));
        let infos = catalog.list().await;
        assert_eq!(
            infos,
            vec![
                ExternalMetricInfo::new("cpu"),
                ExternalMetricInfo::new("queueLength"),
            ]
        );
    }

    #[tokio::test]
    async fn empty_subsystem_lists_empty() {
        let catalog = MetricCatalog::new(Arc::new(FixedNames(vec![])));
        assert!(catalog.list().await.is_empty());
    }
}
