use anyhow::{Context, Result};
use tracing::info;

use crate::cli::CorrectArgs;
use crate::model::NormalizedModel;
use crate::util::{read_json, write_json_pretty};

use super::{Correction, apply_corrections};

pub fn run(args: CorrectArgs) -> Result<()> {
    let snapshot_path = args
        .snapshot_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("baseline.json"));
    let out_path = args.out_path.clone().unwrap_or_else(|| snapshot_path.clone());

    let model: NormalizedModel = read_json(&snapshot_path)?;
    let corrections: Vec<Correction> = read_json(&args.corrections_path)?;

    let updated = apply_corrections(&model, &corrections).with_context(|| {
        format!(
            "failed to apply corrections from {}",
            args.corrections_path.display()
        )
    })?;

    write_json_pretty(&out_path, &updated)?;

    info!(
        snapshot = %snapshot_path.display(),
        out = %out_path.display(),
        corrections = corrections.len(),
        at_risk = updated.at_risk.len(),
        "corrections applied"
    );

    Ok(())
}
