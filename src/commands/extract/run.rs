use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::ExtractArgs;
use crate::model::{ExtractCounts, ExtractRunManifest, NormalizedModel};
use crate::util::{now_utc_string, read_text, sha256_hex, utc_compact_string, write_json_pretty};

use super::extract;

pub fn run(args: ExtractArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let snapshot_path = args
        .snapshot_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("snapshot.json"));
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("extract_run_{}.json", utc_compact_string(Utc::now())))
    });

    let csv_text = read_text(&args.csv_path)?;
    let source_sha256 = sha256_hex(csv_text.as_bytes());

    let extraction = extract(&csv_text)
        .with_context(|| format!("failed to extract metrics from {}", args.csv_path.display()))?;
    for warning in &extraction.warnings {
        warn!(warning = %warning, "extraction warning");
    }

    write_json_pretty(&snapshot_path, &extraction.model)?;

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_path: args.csv_path.display().to_string(),
        source_sha256,
        snapshot_path: snapshot_path.display().to_string(),
        counts: count_extraction(&extraction.model, extraction.warnings.len()),
        warnings: extraction.warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        snapshot = %snapshot_path.display(),
        manifest = %manifest_path.display(),
        markets = manifest.counts.market_count,
        records = manifest.counts.market_record_count,
        quarters = manifest.counts.quarter_count,
        at_risk = manifest.counts.at_risk_count,
        warnings = manifest.warnings.len(),
        "extraction completed"
    );

    Ok(())
}

fn count_extraction(model: &NormalizedModel, warning_count: usize) -> ExtractCounts {
    ExtractCounts {
        market_count: model.markets.len(),
        market_record_count: model.market_record_count(),
        quarter_count: model.quarterly.len(),
        projection_year_count: model.projections.years.len(),
        at_risk_count: model.at_risk.len(),
        warning_count,
    }
}
