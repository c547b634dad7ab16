use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    Comparison, Discrepancy, DiscrepancyReport, MarketRecord, Metric, NormalizedModel,
};

/// Matches the market-level tolerance the dashboard always used; applied
/// to the overall path as well so formatting artifacts cannot produce
/// spurious mismatches.
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// What to do when a market or metric exists on only one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Nothing to compare, nothing to report.
    Skip,
    /// Emit a `missing` discrepancy naming the absent side.
    Report,
}

#[derive(Debug, Clone, Copy)]
pub struct ValidateOptions {
    pub tolerance: f64,
    pub missing: MissingPolicy,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        ValidateOptions {
            tolerance: DEFAULT_TOLERANCE,
            missing: MissingPolicy::Skip,
        }
    }
}

/// Compare the CSV-derived model against the maintained baseline.
///
/// Mismatches are report entries, never errors; an empty report means
/// everything matched within tolerance.
pub fn validate(
    csv: &NormalizedModel,
    code: &NormalizedModel,
    options: &ValidateOptions,
) -> DiscrepancyReport {
    let mut report = DiscrepancyReport::default();

    for metric in Metric::ALL {
        let csv_reading = csv.overall.get(metric);
        let code_reading = code.overall.get(metric);

        flag(
            &mut report.overall,
            metric,
            Comparison::VsTarget,
            csv_reading.vs_target,
            code_reading.vs_target,
            options.tolerance,
        );
        flag(
            &mut report.overall,
            metric,
            Comparison::VsQ4,
            csv_reading.vs_q4,
            code_reading.vs_q4,
            options.tolerance,
        );
        flag(
            &mut report.overall,
            metric,
            Comparison::VsYoY,
            csv_reading.vs_yoy,
            code_reading.vs_yoy,
            options.tolerance,
        );
    }

    for (market, csv_metrics) in &csv.markets {
        let entries = match code.markets.get(market) {
            Some(code_metrics) => compare_market(csv_metrics, code_metrics, options),
            None => missing_market_entries(csv_metrics, "code", options),
        };
        if !entries.is_empty() {
            report.markets.insert(market.clone(), entries);
        }
    }

    for (market, code_metrics) in &code.markets {
        if csv.markets.contains_key(market) {
            continue;
        }
        let entries = missing_market_entries(code_metrics, "csv", options);
        if !entries.is_empty() {
            report.markets.insert(market.clone(), entries);
        }
    }

    report
}

fn compare_market(
    csv_metrics: &BTreeMap<Metric, MarketRecord>,
    code_metrics: &BTreeMap<Metric, MarketRecord>,
    options: &ValidateOptions,
) -> Vec<Discrepancy> {
    let mut entries = Vec::new();

    for metric in Metric::ALL {
        match (csv_metrics.get(&metric), code_metrics.get(&metric)) {
            (Some(csv_record), Some(code_record)) => {
                compare_records(&mut entries, metric, csv_record, code_record, options);
            }
            (Some(_), None) => push_missing(&mut entries, metric, "code", options),
            (None, Some(_)) => push_missing(&mut entries, metric, "csv", options),
            (None, None) => {}
        }
    }

    entries
}

fn compare_records(
    entries: &mut Vec<Discrepancy>,
    metric: Metric,
    csv_record: &MarketRecord,
    code_record: &MarketRecord,
    options: &ValidateOptions,
) {
    flag(
        entries,
        metric,
        Comparison::Value,
        csv_record.value,
        code_record.value,
        options.tolerance,
    );
    flag(
        entries,
        metric,
        Comparison::VsTarget,
        csv_record.vs_target,
        code_record.vs_target,
        options.tolerance,
    );
    flag(
        entries,
        metric,
        Comparison::VsQ4,
        csv_record.vs_q4,
        code_record.vs_q4,
        options.tolerance,
    );
    flag(
        entries,
        metric,
        Comparison::VsYoY,
        csv_record.vs_yoy,
        code_record.vs_yoy,
        options.tolerance,
    );

    // The planning target is the invariant both sources must agree on:
    // re-derive it from the baseline and check the CSV's own vs-target
    // against it.
    let target = code_record.value - code_record.vs_target;
    let calculated_vs_target = csv_record.value - target;
    let difference = measured_difference(calculated_vs_target, csv_record.vs_target);
    if difference > options.tolerance {
        entries.push(Discrepancy {
            metric,
            comparison: Comparison::Calculation,
            csv_value: Some(csv_record.vs_target),
            code_value: None,
            calculated_value: Some(calculated_vs_target),
            difference,
            note: Some(format!(
                "Target value: {target}, Current value: {}",
                csv_record.value
            )),
        });
    }
}

fn missing_market_entries(
    metrics: &BTreeMap<Metric, MarketRecord>,
    absent_side: &str,
    options: &ValidateOptions,
) -> Vec<Discrepancy> {
    let mut entries = Vec::new();
    for metric in metrics.keys() {
        push_missing(&mut entries, *metric, absent_side, options);
    }
    entries
}

fn push_missing(
    entries: &mut Vec<Discrepancy>,
    metric: Metric,
    absent_side: &str,
    options: &ValidateOptions,
) {
    if options.missing == MissingPolicy::Skip {
        return;
    }

    entries.push(Discrepancy {
        metric,
        comparison: Comparison::Missing,
        csv_value: None,
        code_value: None,
        calculated_value: None,
        difference: 0.0,
        note: Some(format!("absent from the {absent_side} dataset")),
    });
}

fn flag(
    entries: &mut Vec<Discrepancy>,
    metric: Metric,
    comparison: Comparison,
    csv_value: f64,
    code_value: f64,
    tolerance: f64,
) {
    let difference = measured_difference(csv_value, code_value);
    if difference > tolerance {
        entries.push(Discrepancy {
            metric,
            comparison,
            csv_value: Some(csv_value),
            code_value: Some(code_value),
            calculated_value: None,
            difference,
            note: None,
        });
    }
}

/// |a - b| rounded to six decimal places, so values that differ by exactly
/// the tolerance never trip it on representation noise.
fn measured_difference(a: f64, b: f64) -> f64 {
    ((a - b).abs() * 1e6).round() / 1e6
}
