use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::ValidateArgs;
use crate::model::{NormalizedModel, ValidationRunManifest};
use crate::util::{now_utc_string, read_json, read_text, sha256_hex, write_json_pretty};

use crate::commands::extract::extract;

use super::{MissingPolicy, ValidateOptions, validate};

pub fn run(args: ValidateArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let baseline_path = args
        .baseline_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("baseline.json"));
    let report_path = args
        .report_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join("discrepancy_report.json"));

    let csv_text = read_text(&args.csv_path)?;
    let source_sha256 = sha256_hex(csv_text.as_bytes());

    let extraction = extract(&csv_text)
        .with_context(|| format!("failed to extract metrics from {}", args.csv_path.display()))?;
    for warning in &extraction.warnings {
        warn!(warning = %warning, "extraction warning");
    }

    let baseline: NormalizedModel = read_json(&baseline_path)?;

    let options = ValidateOptions {
        tolerance: args.tolerance,
        missing: if args.report_missing {
            MissingPolicy::Report
        } else {
            MissingPolicy::Skip
        },
    };
    let report = validate(&extraction.model, &baseline, &options);

    let status = if report.is_clean() {
        "clean"
    } else {
        "discrepancies"
    };
    let manifest = ValidationRunManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_path: args.csv_path.display().to_string(),
        source_sha256,
        baseline_path: baseline_path.display().to_string(),
        tolerance: options.tolerance,
        missing_policy: match options.missing {
            MissingPolicy::Skip => "skip".to_string(),
            MissingPolicy::Report => "report".to_string(),
        },
        status: status.to_string(),
        overall_discrepancy_count: report.overall.len(),
        market_discrepancy_count: report.market_discrepancy_count(),
        report,
    };

    write_json_pretty(&report_path, &manifest)?;

    info!(
        status = %manifest.status,
        overall = manifest.overall_discrepancy_count,
        markets = manifest.market_discrepancy_count,
        report = %report_path.display(),
        "validation completed"
    );

    Ok(())
}
