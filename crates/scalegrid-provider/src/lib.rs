//! scalegrid-provider: the external-metrics adapter between the
//! scaling subsystem and the host metrics-query API.
//!
//! Three parts:
//! - `MetricCatalog` lists which external metrics exist (infallible).
//! - `MetricResolver` resolves one metric query into values, logging
//!   each request and passing subsystem errors through verbatim.
//! - `Provider` implements the host's five-operation capability set,
//!   routing external-metric operations to the catalog and resolver
//!   and answering `Unavailable` on the custom-metric operations.
//!
//! The provider holds shared, read-only handles after construction;
//! concurrent queries need no locking at this layer.

pub mod catalog;
pub mod error;
pub mod provider;
pub mod resolver;

pub use catalog::MetricCatalog;
pub use error::{ProviderError, ProviderResult};
pub use provider::{MetricsProvider, Provider};
pub use resolver::MetricResolver;
