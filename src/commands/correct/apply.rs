use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AtRiskEntry, MarketMetrics, Metric, NormalizedModel, round1};

/// One hand-maintained data correction: overwrite a market/metric value
/// and/or its vs-target delta in the canonical snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub market: String,
    pub metric: Metric,
    pub new_value: Option<f64>,
    pub new_vs_target: Option<f64>,
}

/// Corrections are hand-written; a typo must surface, never silently drop.
#[derive(Debug, Error)]
pub enum CorrectError {
    #[error("unknown market in correction: '{0}'")]
    UnknownMarket(String),
    #[error("market '{market}' has no record for metric '{metric}'")]
    UnknownMetric { market: String, metric: Metric },
    #[error("correction for '{market}'/'{metric}' sets neither a value nor a vs-target")]
    EmptyCorrection { market: String, metric: Metric },
}

/// Apply a correction set and regenerate every derived view. The input
/// model is left untouched; the result is a fresh model with recomputed
/// targets and a rebuilt at-risk list. Applying the same set twice yields
/// the same model.
pub fn apply_corrections(
    model: &NormalizedModel,
    corrections: &[Correction],
) -> Result<NormalizedModel, CorrectError> {
    let mut updated = model.clone();

    for correction in corrections {
        if correction.new_value.is_none() && correction.new_vs_target.is_none() {
            return Err(CorrectError::EmptyCorrection {
                market: correction.market.clone(),
                metric: correction.metric,
            });
        }

        let record = updated
            .markets
            .get_mut(&correction.market)
            .ok_or_else(|| CorrectError::UnknownMarket(correction.market.clone()))?
            .get_mut(&correction.metric)
            .ok_or_else(|| CorrectError::UnknownMetric {
                market: correction.market.clone(),
                metric: correction.metric,
            })?;

        if let Some(value) = correction.new_value {
            record.value = value;
        }
        if let Some(vs_target) = correction.new_vs_target {
            record.vs_target = vs_target;
        }
        record.target_value = round1(record.value - record.vs_target);
    }

    updated.at_risk = regenerate_at_risk(&updated.markets);
    Ok(updated)
}

fn regenerate_at_risk(markets: &MarketMetrics) -> Vec<AtRiskEntry> {
    let mut entries = Vec::new();
    for (market, metrics) in markets {
        for (metric, record) in metrics {
            if let Some(entry) = AtRiskEntry::evaluate(market, *metric, record) {
                entries.push(entry);
            }
        }
    }
    entries
}
