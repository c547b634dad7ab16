use std::collections::BTreeMap;

use super::*;
use crate::model::{MarketRecord, Metric, NormalizedModel, round1};

fn record(value: f64, vs_target: f64, vs_yoy: f64) -> MarketRecord {
    MarketRecord {
        value,
        target_value: round1(value - vs_target),
        vs_target,
        vs_q4: 1.0,
        vs_yoy,
    }
}

fn snapshot() -> NormalizedModel {
    let mut model = NormalizedModel::default();
    let mut us = BTreeMap::new();
    us.insert(Metric::Intent, record(24.2, 13.7, 2.7));
    model.markets.insert("US".to_string(), us);

    let mut china = BTreeMap::new();
    china.insert(Metric::Intent, record(18.5, 9.6, 1.8));
    model.markets.insert("China".to_string(), china);
    model
}

fn correction(market: &str, value: Option<f64>, vs_target: Option<f64>) -> Correction {
    Correction {
        market: market.to_string(),
        metric: Metric::Intent,
        new_value: value,
        new_vs_target: vs_target,
    }
}

#[test]
fn corrections_update_records_and_recompute_targets() {
    let model = snapshot();
    let corrections = vec![
        correction("US", Some(11.2), Some(0.7)),
        correction("China", Some(9.2), Some(0.3)),
    ];

    let updated = apply_corrections(&model, &corrections).expect("corrections apply");

    let us = &updated.markets["US"][&Metric::Intent];
    assert_eq!(us.value, 11.2);
    assert_eq!(us.vs_target, 0.7);
    assert_eq!(us.target_value, 10.5);

    let china = &updated.markets["China"][&Metric::Intent];
    assert_eq!(china.value, 9.2);
    assert_eq!(china.target_value, 8.9);

    // The input model is rebuilt, never patched in place.
    assert_eq!(model.markets["US"][&Metric::Intent].value, 24.2);
}

#[test]
fn applying_the_same_corrections_twice_is_idempotent() {
    let model = snapshot();
    let corrections = vec![correction("US", Some(11.2), Some(0.7))];

    let once = apply_corrections(&model, &corrections).expect("first application");
    let twice = apply_corrections(&once, &corrections).expect("second application");

    assert_eq!(once, twice);
}

#[test]
fn partial_corrections_keep_the_other_side_and_rederive_the_target() {
    let model = snapshot();

    let updated = apply_corrections(&model, &[correction("US", Some(11.2), None)])
        .expect("correction applies");

    let us = &updated.markets["US"][&Metric::Intent];
    assert_eq!(us.value, 11.2);
    assert_eq!(us.vs_target, 13.7);
    assert_eq!(us.target_value, round1(11.2 - 13.7));
}

#[test]
fn corrections_regenerate_the_at_risk_list() {
    let model = snapshot();
    assert!(model.at_risk.is_empty());

    let updated = apply_corrections(&model, &[correction("US", None, Some(-0.5))])
        .expect("correction applies");

    assert_eq!(updated.at_risk.len(), 1);
    assert_eq!(updated.at_risk[0].market, "US");
    assert_eq!(updated.at_risk[0].issue, "Below Target");

    // Correcting back above target clears the regenerated list.
    let cleared = apply_corrections(&updated, &[correction("US", None, Some(0.7))])
        .expect("correction applies");
    assert!(cleared.at_risk.is_empty());
}

#[test]
fn unknown_market_and_metric_are_hard_errors() {
    let model = snapshot();

    let err = apply_corrections(&model, &[correction("Atlantis", Some(1.0), None)])
        .expect_err("unknown market");
    assert!(matches!(err, CorrectError::UnknownMarket(name) if name == "Atlantis"));

    let missing_metric = Correction {
        market: "US".to_string(),
        metric: Metric::Awareness,
        new_value: Some(79.5),
        new_vs_target: None,
    };
    let err = apply_corrections(&model, &[missing_metric]).expect_err("unknown metric");
    assert!(matches!(
        err,
        CorrectError::UnknownMetric { market, metric: Metric::Awareness } if market == "US"
    ));
}

#[test]
fn a_correction_with_no_payload_is_rejected() {
    let model = snapshot();

    let err = apply_corrections(&model, &[correction("US", None, None)])
        .expect_err("empty correction");
    assert!(matches!(err, CorrectError::EmptyCorrection { .. }));
}
