//! scalegrid-core: types shared across the ScaleGrid metrics provider.
//!
//! Holds the metric identity and value types exchanged with the host
//! metrics-query API, plus the label selector grammar used to scope
//! metric queries. Everything here is plain data; behavior lives in
//! `scalegrid-scaler` and `scalegrid-provider`.

pub mod selector;
pub mod types;

pub use selector::{
    LabelSelector, Requirement, SelectorParseError, is_valid_label_key, is_valid_label_value,
};
pub use types::{
    CustomMetricInfo, CustomMetricValue, CustomMetricValueList, ExternalMetricInfo,
    ExternalMetricValue, ExternalMetricValueList, NamespacedName, is_valid_metric_name,
};
