//! scalegrid-scaler: the scaling subsystem behind the metrics provider.
//!
//! Scaled objects register here with their metric triggers. A trigger
//! names a metric and a source for its value (a fixed number or an
//! HTTP endpoint). The `ScaleHandler` answers metric queries from the
//! registered set with a two-tier policy: an exact `(namespace,
//! metric)` owner answers alone; otherwise a label-selector scan over
//! all registered objects unions the matching samples.
//!
//! The provider layer above treats this crate as the authority on
//! which metrics exist and what their current values are.

pub mod config;
pub mod error;
pub mod handler;
pub mod registry;
pub mod source;
pub mod types;

pub use config::load_dir;
pub use error::{ScalerError, ScalerResult};
pub use handler::{ScaleHandler, TriggerScaleHandler};
pub use registry::ScaledObjectRegistry;
pub use source::{DEFAULT_HTTP_TIMEOUT, HttpSource, MetricSource, StaticSource, build_source};
pub use types::{ScaledObjectSpec, TriggerSpec, TriggerSource};
