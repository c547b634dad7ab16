use std::collections::BTreeMap;

use super::*;
use crate::model::{
    Comparison, MarketRecord, Metric, MetricReading, NormalizedModel, round1,
};

fn record(value: f64, vs_target: f64, vs_q4: f64, vs_yoy: f64) -> MarketRecord {
    MarketRecord {
        value,
        target_value: round1(value - vs_target),
        vs_target,
        vs_q4,
        vs_yoy,
    }
}

fn model_with_market(market: &str, metric: Metric, rec: MarketRecord) -> NormalizedModel {
    let mut model = NormalizedModel::default();
    model
        .markets
        .entry(market.to_string())
        .or_insert_with(BTreeMap::new)
        .insert(metric, rec);
    model
}

#[test]
fn identical_models_produce_a_clean_report() {
    let model = model_with_market("US", Metric::Intent, record(11.2, 0.7, 1.0, 2.7));
    let report = validate(&model, &model, &ValidateOptions::default());

    assert!(report.is_clean());
    assert!(report.markets.is_empty());
}

#[test]
fn difference_of_exactly_the_tolerance_is_not_flagged() {
    let csv = model_with_market("US", Metric::Awareness, record(84.5, 1.4, 1.9, 2.7));
    // Value differs by exactly 0.1; vs-target kept consistent so the
    // calculation cross-check stays inside tolerance too.
    let code = model_with_market("US", Metric::Awareness, record(84.4, 1.4, 1.9, 2.7));

    let report = validate(&csv, &code, &ValidateOptions::default());
    assert!(report.is_clean());
}

#[test]
fn difference_just_past_the_tolerance_is_flagged_with_precise_difference() {
    let csv = model_with_market("US", Metric::Awareness, record(84.51, 1.51, 1.9, 2.7));
    let code = model_with_market("US", Metric::Awareness, record(84.4, 1.4, 1.9, 2.7));

    let report = validate(&csv, &code, &ValidateOptions::default());
    let entries = &report.markets["US"];

    let value_entry = entries
        .iter()
        .find(|d| d.comparison == Comparison::Value)
        .expect("value discrepancy");
    assert_eq!(value_entry.csv_value, Some(84.51));
    assert_eq!(value_entry.code_value, Some(84.4));
    assert_eq!(value_entry.difference, 0.11);

    let vs_target_entry = entries
        .iter()
        .find(|d| d.comparison == Comparison::VsTarget)
        .expect("vs-target discrepancy");
    assert_eq!(vs_target_entry.difference, 0.11);
}

#[test]
fn overall_comparison_uses_the_same_tolerance() {
    let mut csv = NormalizedModel::default();
    csv.overall.intent = MetricReading {
        value: 27.8,
        vs_target: 0.5,
        vs_q4: 1.0,
        vs_yoy: 1.4,
    };
    let mut code = csv.clone();
    code.overall.intent.vs_q4 = 1.5;
    code.overall.intent.vs_yoy = 1.45;

    let report = validate(&csv, &code, &ValidateOptions::default());

    assert_eq!(report.overall.len(), 1);
    assert_eq!(report.overall[0].metric, Metric::Intent);
    assert_eq!(report.overall[0].comparison, Comparison::VsQ4);
    assert_eq!(report.overall[0].difference, 0.5);
}

#[test]
fn calculation_cross_check_detects_inconsistent_targets() {
    // A stale vs-target left behind after the value was hand-patched:
    // the baseline's derived target no longer explains the CSV delta.
    let csv = model_with_market("US", Metric::Intent, record(11.2, 0.7, 1.0, 2.7));
    let code = model_with_market("US", Metric::Intent, record(11.2, 13.7, 1.0, 2.7));

    let report = validate(&csv, &code, &ValidateOptions::default());
    let entries = &report.markets["US"];

    let calculation = entries
        .iter()
        .find(|d| d.comparison == Comparison::Calculation)
        .expect("calculation discrepancy");
    assert_eq!(calculation.csv_value, Some(0.7));
    assert_eq!(calculation.calculated_value, Some(11.2 - (11.2 - 13.7)));
    assert_eq!(calculation.difference, 13.0);
    let note = calculation.note.as_deref().expect("note");
    assert!(note.contains("Target value: -2.5"));
    assert!(note.contains("Current value: 11.2"));
}

#[test]
fn internally_consistent_baseline_passes_the_cross_check() {
    // The legacy US intent bug: both value and vs-target were stale but
    // agreed on the same 10.5 target, so only value and vs-target fire.
    let csv = model_with_market("US", Metric::Intent, record(11.2, 0.7, 1.0, 2.7));
    let code = model_with_market("US", Metric::Intent, record(24.2, 13.7, 1.0, 2.7));

    let report = validate(&csv, &code, &ValidateOptions::default());
    let entries = &report.markets["US"];

    assert!(
        entries
            .iter()
            .any(|d| d.comparison == Comparison::Value && d.difference == 13.0)
    );
    assert!(entries.iter().any(|d| d.comparison == Comparison::VsTarget));
    assert!(
        entries
            .iter()
            .all(|d| d.comparison != Comparison::Calculation)
    );
}

#[test]
fn consistent_targets_pass_the_cross_check_despite_value_drift() {
    // Both sides derive the same 78.1 target, so only the value and
    // vs-target comparisons fire.
    let csv = model_with_market("US", Metric::Awareness, record(80.0, 1.9, 1.9, 2.7));
    let code = model_with_market("US", Metric::Awareness, record(79.5, 1.4, 1.9, 2.7));

    let report = validate(&csv, &code, &ValidateOptions::default());
    let entries = &report.markets["US"];
    assert!(
        entries
            .iter()
            .all(|d| d.comparison != Comparison::Calculation)
    );
}

#[test]
fn markets_on_one_side_are_skipped_by_default() {
    let csv = model_with_market("US", Metric::Intent, record(11.2, 0.7, 1.0, 2.7));
    let code = model_with_market("China", Metric::Intent, record(9.2, 0.3, 1.0, 1.8));

    let report = validate(&csv, &code, &ValidateOptions::default());
    assert!(report.is_clean());
}

#[test]
fn missing_markets_are_reported_when_the_policy_asks() {
    let csv = model_with_market("US", Metric::Intent, record(11.2, 0.7, 1.0, 2.7));
    let code = model_with_market("China", Metric::Intent, record(9.2, 0.3, 1.0, 1.8));

    let options = ValidateOptions {
        missing: MissingPolicy::Report,
        ..ValidateOptions::default()
    };
    let report = validate(&csv, &code, &options);

    let us = &report.markets["US"];
    assert_eq!(us.len(), 1);
    assert_eq!(us[0].comparison, Comparison::Missing);
    assert_eq!(us[0].note.as_deref(), Some("absent from the code dataset"));

    let china = &report.markets["China"];
    assert_eq!(china[0].comparison, Comparison::Missing);
    assert_eq!(china[0].note.as_deref(), Some("absent from the csv dataset"));
}

#[test]
fn missing_metric_within_a_shared_market_follows_the_policy() {
    let csv = model_with_market("US", Metric::Intent, record(11.2, 0.7, 1.0, 2.7));
    let mut code = model_with_market("US", Metric::Intent, record(11.2, 0.7, 1.0, 2.7));
    code.markets
        .get_mut("US")
        .expect("market present")
        .insert(Metric::Awareness, record(79.5, 1.4, 1.9, 2.7));

    let skip = validate(&csv, &code, &ValidateOptions::default());
    assert!(skip.is_clean());

    let options = ValidateOptions {
        missing: MissingPolicy::Report,
        ..ValidateOptions::default()
    };
    let report = validate(&csv, &code, &options);
    let us = &report.markets["US"];
    assert_eq!(us.len(), 1);
    assert_eq!(us[0].metric, Metric::Awareness);
    assert_eq!(us[0].comparison, Comparison::Missing);
    assert_eq!(us[0].note.as_deref(), Some("absent from the csv dataset"));
}

#[test]
fn clean_markets_are_omitted_from_the_report() {
    let mut csv = model_with_market("US", Metric::Intent, record(11.2, 0.7, 1.0, 2.7));
    csv.markets
        .entry("Germany".to_string())
        .or_insert_with(BTreeMap::new)
        .insert(Metric::Intent, record(23.3, 0.0, 0.8, -0.9));

    let mut code = csv.clone();
    code.markets
        .get_mut("US")
        .expect("market present")
        .insert(Metric::Intent, record(24.2, 13.7, 1.0, 2.7));

    let report = validate(&csv, &code, &ValidateOptions::default());
    assert!(report.markets.contains_key("US"));
    assert!(!report.markets.contains_key("Germany"));
}
