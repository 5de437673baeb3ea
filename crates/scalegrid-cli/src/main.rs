//! scalegrid: operator CLI for the ScaleGrid metrics provider.
//!
//! Loads scaled-object TOML files, assembles the same registry,
//! handler, and provider stack the host server embeds, and runs one
//! query against it:
//!
//! ```text
//! scalegrid list-metrics --config-dir ./scaledobjects
//! scalegrid get-metric queueLength --namespace prod --selector 'app=worker'
//! scalegrid objects --namespace prod
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use scalegrid_core::{ExternalMetricInfo, LabelSelector};
use scalegrid_provider::{MetricsProvider, Provider};
use scalegrid_scaler::{ScaledObjectRegistry, TriggerScaleHandler, load_dir};

#[derive(Parser)]
#[command(name = "scalegrid", about = "ScaleGrid external metrics provider", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every external metric the registered scaled objects serve.
    ListMetrics {
        /// Directory of scaled-object TOML files.
        #[arg(long, default_value = "scaledobjects")]
        config_dir: PathBuf,
    },
    /// Resolve one external metric and print the values as JSON.
    GetMetric {
        /// Metric name to resolve.
        metric: String,
        /// Namespace to resolve in.
        #[arg(long)]
        namespace: String,
        /// Label selector, e.g. 'app=worker,env in (prod, staging)'.
        /// Empty matches everything.
        #[arg(long, default_value = "")]
        selector: String,
        /// Directory of scaled-object TOML files.
        #[arg(long, default_value = "scaledobjects")]
        config_dir: PathBuf,
    },
    /// Show the registered scaled objects and their triggers.
    Objects {
        /// Restrict to one namespace.
        #[arg(long)]
        namespace: Option<String>,
        /// Directory of scaled-object TOML files.
        #[arg(long, default_value = "scaledobjects")]
        config_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scalegrid=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::ListMetrics { config_dir } => list_metrics(&config_dir).await,
        Command::GetMetric { metric, namespace, selector, config_dir } => {
            get_metric(&config_dir, &namespace, &metric, &selector).await
        }
        Command::Objects { namespace, config_dir } => {
            objects(&config_dir, namespace.as_deref())
        }
    }
}

/// Assemble the registry, handler, and provider from a config dir.
async fn build_provider(config_dir: &Path) -> anyhow::Result<Provider> {
    let specs = load_dir(config_dir)?;
    info!(count = specs.len(), dir = %config_dir.display(), "loaded scaled objects");
    let registry = Arc::new(ScaledObjectRegistry::new());
    for spec in specs {
        registry.register(spec).await;
    }
    let handler = Arc::new(TriggerScaleHandler::new(registry.clone()));
    Ok(Provider::new(registry, handler))
}

async fn list_metrics(config_dir: &Path) -> anyhow::Result<()> {
    let provider = build_provider(config_dir).await?;
    for info in provider.list_all_external_metrics().await {
        println!("{}", info.metric);
    }
    Ok(())
}

async fn get_metric(
    config_dir: &Path,
    namespace: &str,
    metric: &str,
    selector: &str,
) -> anyhow::Result<()> {
    let selector = LabelSelector::parse(selector)?;
    let provider = build_provider(config_dir).await?;
    let list = provider
        .get_external_metric(namespace, &selector, &ExternalMetricInfo::new(metric))
        .await?;
    println!("{}", serde_json::to_string_pretty(&list)?);
    Ok(())
}

fn objects(config_dir: &Path, namespace: Option<&str>) -> anyhow::Result<()> {
    let specs = load_dir(config_dir)?;
    for spec in specs
        .iter()
        .filter(|s| namespace.is_none_or(|ns| s.namespace == ns))
    {
        let metrics: Vec<&str> = spec.triggers.iter().map(|t| t.metric.as_str()).collect();
        let labels: Vec<String> = spec
            .labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!(
            "{}  metrics: {}  labels: {}",
            spec.object_key(),
            metrics.join(","),
            if labels.is_empty() { "-".to_string() } else { labels.join(",") },
        );
    }
    Ok(())
}
