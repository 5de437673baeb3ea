//! Declarative scaled-object configuration.
//!
//! Scaled objects are described in TOML files, one object per file:
//!
//! ```toml
//! namespace = "prod"
//! name = "worker-scaler"
//!
//! [labels]
//! app = "worker"
//!
//! [[triggers]]
//! metric = "queueLength"
//! source = "http"
//! endpoint = "http://queue-stats:8080/depth"
//! value_path = "/queue/depth"
//! timeout = "500ms"
//! ```
//!
//! Loading verifies every rule the registry and the sources rely on,
//! so a spec that loads is a spec that can serve queries.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, bail};
use walkdir::WalkDir;

use scalegrid_core::{is_valid_label_key, is_valid_label_value, is_valid_metric_name};

use crate::source::parse_duration;
use crate::types::{ScaledObjectSpec, TriggerSource};

impl ScaledObjectSpec {
    /// Load and verify one scaled-object spec from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let spec: ScaledObjectSpec = toml::from_str(&content)?;
        spec.verify()?;
        Ok(spec)
    }

    /// Check the spec against the rules the registry and the trigger
    /// sources rely on.
    pub fn verify(&self) -> anyhow::Result<()> {
        if self.namespace.is_empty() || self.namespace.contains('/') {
            bail!("namespace {:?} must be non-empty and slash-free", self.namespace);
        }
        if self.name.is_empty() || self.name.contains('/') {
            bail!("name {:?} must be non-empty and slash-free", self.name);
        }
        if self.triggers.is_empty() {
            bail!("scaled object {} declares no triggers", self.object_key());
        }
        for trigger in &self.triggers {
            if !is_valid_metric_name(&trigger.metric) {
                bail!("invalid metric name {:?}", trigger.metric);
            }
            if let TriggerSource::Http { endpoint, value_path, timeout } = &trigger.source {
                let uri: http::Uri = endpoint
                    .parse()
                    .with_context(|| format!("bad endpoint {endpoint:?}"))?;
                if uri.scheme_str() != Some("http") {
                    bail!("endpoint {endpoint:?} must use plain http");
                }
                if uri.authority().is_none() {
                    bail!("endpoint {endpoint:?} has no host");
                }
                if let Some(pointer) = value_path
                    && !pointer.starts_with('/')
                {
                    bail!("value_path {pointer:?} must be a JSON pointer starting with '/'");
                }
                if let Some(text) = timeout
                    && parse_duration(text).is_none()
                {
                    bail!("unparseable timeout {text:?}");
                }
            }
        }
        for (key, value) in &self.labels {
            if !is_valid_label_key(key) {
                bail!("invalid label key {key:?}");
            }
            if !is_valid_label_value(value) {
                bail!("invalid label value {value:?} for key {key:?}");
            }
        }
        Ok(())
    }
}

/// Load every `*.toml` under `dir`, in file-name order. Duplicate
/// `namespace/name` registrations across files are an error.
pub fn load_dir(dir: &Path) -> anyhow::Result<Vec<ScaledObjectSpec>> {
    let mut specs = Vec::new();
    let mut seen = BTreeSet::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        let spec = ScaledObjectSpec::from_file(path)
            .with_context(|| format!("loading scaled object from {}", path.display()))?;
        if !seen.insert(spec.object_key()) {
            bail!(
                "duplicate scaled object {} in {}",
                spec.object_key(),
                path.display()
            );
        }
        specs.push(spec);
    }
    Ok(specs)
}
