use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::Store;
use crate::services::roadmap::RoadmapSeed;

#[derive(Args, Debug)]
pub struct SeedRoadmapArgs {
    #[arg(long, default_value = "seeds/roadmap.yaml", help = "YAML seed file")]
    pub file: PathBuf,

    #[arg(long, help = "Keep existing items instead of clearing them first")]
    pub keep: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub cleared: u64,
    pub created: usize,
    pub by_status: BTreeMap<&'static str, usize>,
}

/// Parse and insert a seed. The seed is validated before anything is
/// cleared, so a bad file leaves existing items alone.
pub async fn seed(store: &Store, source: &str, keep: bool) -> anyhow::Result<SeedSummary> {
    let items = RoadmapSeed::from_yaml(source)
        .context("failed to parse roadmap seed")?
        .into_items()
        .map_err(anyhow::Error::msg)?;

    let mut summary = SeedSummary::default();
    if !keep {
        summary.cleared = store.roadmap.clear().await?;
        tracing::info!(cleared = summary.cleared, "Cleared roadmap items");
    }

    for item in items {
        let status = item.status.as_str();
        store.roadmap.create(item).await?;
        summary.created += 1;
        *summary.by_status.entry(status).or_default() += 1;
    }

    Ok(summary)
}

pub async fn handle(
    store: &Store,
    args: SeedRoadmapArgs,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let summary = seed(store, &source, args.keep).await?;

    if output_format == OutputFormat::Text {
        for (status, count) in &summary.by_status {
            println!("  {:<12} {}", status, count);
        }
    }

    output_success(
        output_format,
        &format!(
            "Seeded {} roadmap items ({} cleared)",
            summary.created, summary.cleared
        ),
        Some(json!({
            "created": summary.created,
            "cleared": summary.cleared,
            "byStatus": summary.by_status,
        })),
    )
}
