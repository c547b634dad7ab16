use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{ExtractRunManifest, ValidationRunManifest};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let snapshot_path = args.cache_root.join("snapshot.json");
    let report_path = manifest_dir.join("discrepancy_report.json");

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_extract_manifest(&manifest_dir)? {
        Some((name, manifest)) => {
            info!(
                manifest = %name,
                generated_at = %manifest.generated_at,
                source = %manifest.source_path,
                markets = manifest.counts.market_count,
                records = manifest.counts.market_record_count,
                quarters = manifest.counts.quarter_count,
                at_risk = manifest.counts.at_risk_count,
                warnings = manifest.warnings.len(),
                "latest extract run"
            );
        }
        None => warn!(dir = %manifest_dir.display(), "no extract-run manifest found"),
    }

    if snapshot_path.exists() {
        info!(path = %snapshot_path.display(), "snapshot present");
    } else {
        warn!(path = %snapshot_path.display(), "snapshot missing");
    }

    if report_path.exists() {
        let raw = fs::read(&report_path)
            .with_context(|| format!("failed to read {}", report_path.display()))?;
        let report: ValidationRunManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", report_path.display()))?;

        info!(
            generated_at = %report.generated_at,
            status = %report.status,
            overall = report.overall_discrepancy_count,
            markets = report.market_discrepancy_count,
            tolerance = report.tolerance,
            "latest validation"
        );
    } else {
        warn!(path = %report_path.display(), "no discrepancy report found");
    }

    Ok(())
}

fn latest_extract_manifest(
    manifest_dir: &Path,
) -> Result<Option<(String, ExtractRunManifest)>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<(String, PathBuf)> = None;
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to list {}", manifest_dir.display()))?
    {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !file_name.starts_with("extract_run_") || !file_name.ends_with(".json") {
            continue;
        }

        // Timestamped names sort chronologically.
        match &latest {
            Some((current, _)) if file_name <= *current => {}
            _ => latest = Some((file_name, entry.path())),
        }
    }

    let Some((name, path)) = latest else {
        return Ok(None);
    };

    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: ExtractRunManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    Ok(Some((name, manifest)))
}
