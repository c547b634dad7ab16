use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The four tracked brand-health dimensions. Their title-case labels are
/// reserved in the CSV: a data row starting with one of them is a metric
/// header, never a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Awareness,
    Familiarity,
    Consideration,
    Intent,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Awareness,
        Metric::Familiarity,
        Metric::Consideration,
        Metric::Intent,
    ];

    /// Matches the case-sensitive, title-case row label used by the CSV.
    pub fn from_label(label: &str) -> Option<Metric> {
        match label {
            "Awareness" => Some(Metric::Awareness),
            "Familiarity" => Some(Metric::Familiarity),
            "Consideration" => Some(Metric::Consideration),
            "Intent" => Some(Metric::Intent),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Awareness => "Awareness",
            Metric::Familiarity => "Familiarity",
            Metric::Consideration => "Consideration",
            Metric::Intent => "Intent",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Metric::Awareness => "awareness",
            Metric::Familiarity => "familiarity",
            Metric::Consideration => "consideration",
            Metric::Intent => "intent",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One overall measurement for a metric, straight from a metric-header row.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricReading {
    pub value: f64,
    pub vs_target: f64,
    pub vs_q4: f64,
    #[serde(rename = "vsYoY")]
    pub vs_yoy: f64,
}

/// Exactly one reading per metric; the closed struct keeps that invariant
/// out of reach of parsing bugs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub awareness: MetricReading,
    pub familiarity: MetricReading,
    pub consideration: MetricReading,
    pub intent: MetricReading,
}

impl OverallMetrics {
    pub fn get(&self, metric: Metric) -> &MetricReading {
        match metric {
            Metric::Awareness => &self.awareness,
            Metric::Familiarity => &self.familiarity,
            Metric::Consideration => &self.consideration,
            Metric::Intent => &self.intent,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut MetricReading {
        match metric {
            Metric::Awareness => &mut self.awareness,
            Metric::Familiarity => &mut self.familiarity,
            Metric::Consideration => &mut self.consideration,
            Metric::Intent => &mut self.intent,
        }
    }
}

/// One market/metric measurement with its derived planning target.
/// Invariant: `target_value == round1(value - vs_target)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketRecord {
    pub value: f64,
    pub target_value: f64,
    pub vs_target: f64,
    pub vs_q4: f64,
    #[serde(rename = "vsYoY")]
    pub vs_yoy: f64,
}

pub type MarketMetrics = BTreeMap<String, BTreeMap<Metric, MarketRecord>>;

/// Sort key for quarterly columns: ascending by year, then quarter number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuarterKey {
    pub year: u16,
    pub quarter: u8,
}

impl fmt::Display for QuarterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} {}", self.quarter, self.year)
    }
}

/// One point of the quarterly trend. Cells are `None` when the export has
/// no reading for that metric/quarter; `0.0` always means a parsed "0%".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuarterPoint {
    pub quarter: QuarterKey,
    pub awareness: Option<f64>,
    pub familiarity: Option<f64>,
    pub consideration: Option<f64>,
    pub intent: Option<f64>,
}

impl QuarterPoint {
    pub fn new(quarter: QuarterKey) -> Self {
        QuarterPoint {
            quarter,
            awareness: None,
            familiarity: None,
            consideration: None,
            intent: None,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::Awareness => self.awareness = value,
            Metric::Familiarity => self.familiarity = value,
            Metric::Consideration => self.consideration = value,
            Metric::Intent => self.intent = value,
        }
    }
}

/// Per-metric yearly projections, one slot per 4-digit-year column in
/// column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectionSeries {
    pub years: Vec<u16>,
    pub awareness: Vec<Option<f64>>,
    pub familiarity: Vec<Option<f64>>,
    pub consideration: Vec<Option<f64>>,
    pub intent: Vec<Option<f64>>,
}

impl ProjectionSeries {
    pub fn push(&mut self, metric: Metric, value: Option<f64>) {
        match metric {
            Metric::Awareness => self.awareness.push(value),
            Metric::Familiarity => self.familiarity.push(value),
            Metric::Consideration => self.consideration.push(value),
            Metric::Intent => self.intent.push(value),
        }
    }
}

/// A market/metric combination failing its target or declining year over
/// year. Target failure takes precedence; one issue per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtRiskEntry {
    pub market: String,
    pub metric: Metric,
    pub value: f64,
    pub target: f64,
    pub vs_target: f64,
    pub issue: String,
}

impl AtRiskEntry {
    pub fn evaluate(market: &str, metric: Metric, record: &MarketRecord) -> Option<AtRiskEntry> {
        let issue = if record.vs_target < 0.0 {
            "Below Target".to_string()
        } else if record.vs_yoy < 0.0 {
            format!("YoY Decline ({}%)", record.vs_yoy)
        } else {
            return None;
        };

        Some(AtRiskEntry {
            market: market.to_string(),
            metric,
            value: record.value,
            target: record.target_value,
            vs_target: record.vs_target,
            issue,
        })
    }
}

/// The full normalized data model handed to presentation collaborators.
/// Built fresh on every extraction; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedModel {
    pub overall: OverallMetrics,
    pub markets: MarketMetrics,
    pub quarterly: Vec<QuarterPoint>,
    pub projections: ProjectionSeries,
    pub at_risk: Vec<AtRiskEntry>,
}

impl NormalizedModel {
    pub fn market_record_count(&self) -> usize {
        self.markets.values().map(BTreeMap::len).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "value")]
    Value,
    #[serde(rename = "vsTarget")]
    VsTarget,
    #[serde(rename = "vsQ4")]
    VsQ4,
    #[serde(rename = "vsYoY")]
    VsYoY,
    #[serde(rename = "calculation")]
    Calculation,
    #[serde(rename = "missing")]
    Missing,
}

/// A detected mismatch between the CSV-derived model and the maintained
/// baseline for one metric/comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discrepancy {
    pub metric: Metric,
    pub comparison: Comparison,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculated_value: Option<f64>,
    pub difference: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// An empty report is a successful "all matched" result. Markets with no
/// discrepancies are omitted entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscrepancyReport {
    pub overall: Vec<Discrepancy>,
    pub markets: BTreeMap<String, Vec<Discrepancy>>,
}

impl DiscrepancyReport {
    pub fn is_clean(&self) -> bool {
        self.overall.is_empty() && self.markets.is_empty()
    }

    pub fn market_discrepancy_count(&self) -> usize {
        self.markets.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractCounts {
    pub market_count: usize,
    pub market_record_count: usize,
    pub quarter_count: usize,
    pub projection_year_count: usize,
    pub at_risk_count: usize,
    pub warning_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRunManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub snapshot_path: String,
    pub counts: ExtractCounts,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRunManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub baseline_path: String,
    pub tolerance: f64,
    pub missing_policy: String,
    pub status: String,
    pub overall_discrepancy_count: usize,
    pub market_discrepancy_count: usize,
    pub report: DiscrepancyReport,
}

/// Round to one decimal place, the precision of every derived target in
/// the dashboard.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_keys_order_by_year_then_quarter() {
        let mut keys = vec![
            QuarterKey { year: 2024, quarter: 1 },
            QuarterKey { year: 2023, quarter: 3 },
            QuarterKey { year: 2024, quarter: 2 },
        ];
        keys.sort();

        assert_eq!(keys[0].to_string(), "Q3 2023");
        assert_eq!(keys[1].to_string(), "Q1 2024");
        assert_eq!(keys[2].to_string(), "Q2 2024");
    }

    #[test]
    fn at_risk_prefers_below_target_over_yoy_decline() {
        let record = MarketRecord {
            value: 50.0,
            target_value: 50.5,
            vs_target: -0.5,
            vs_q4: 0.0,
            vs_yoy: -2.0,
        };

        let entry = AtRiskEntry::evaluate("US", Metric::Intent, &record)
            .expect("record is at risk");
        assert_eq!(entry.issue, "Below Target");
    }

    #[test]
    fn at_risk_formats_yoy_decline_with_raw_delta() {
        let record = MarketRecord {
            value: 17.9,
            target_value: 17.6,
            vs_target: 0.3,
            vs_q4: 0.7,
            vs_yoy: -3.4,
        };

        let entry = AtRiskEntry::evaluate("Italy", Metric::Intent, &record)
            .expect("record is at risk");
        assert_eq!(entry.issue, "YoY Decline (-3.4%)");
        assert_eq!(entry.target, 17.6);
    }

    #[test]
    fn healthy_record_yields_no_at_risk_entry() {
        let record = MarketRecord {
            value: 79.5,
            target_value: 78.1,
            vs_target: 1.4,
            vs_q4: 1.9,
            vs_yoy: 2.7,
        };

        assert!(AtRiskEntry::evaluate("US", Metric::Awareness, &record).is_none());
    }

    #[test]
    fn round1_matches_target_derivation() {
        assert_eq!(round1(79.5 - 1.4), 78.1);
        assert_eq!(round1(44.0 - 3.3), 40.7);
        assert_eq!(round1(-0.05), -0.1);
    }

    #[test]
    fn metric_reading_serializes_with_dashboard_field_names() {
        let reading = MetricReading {
            value: 84.4,
            vs_target: 0.5,
            vs_q4: 0.9,
            vs_yoy: 1.9,
        };

        let json = serde_json::to_value(reading).expect("serializes");
        assert_eq!(json["value"], 84.4);
        assert_eq!(json["vsTarget"], 0.5);
        assert_eq!(json["vsQ4"], 0.9);
        assert_eq!(json["vsYoY"], 1.9);
    }

    #[test]
    fn discrepancy_omits_absent_sides() {
        let discrepancy = Discrepancy {
            metric: Metric::Intent,
            comparison: Comparison::Calculation,
            csv_value: Some(0.7),
            code_value: None,
            calculated_value: Some(13.7),
            difference: 13.0,
            note: None,
        };

        let json = serde_json::to_value(&discrepancy).expect("serializes");
        assert_eq!(json["comparison"], "calculation");
        assert!(json.get("codeValue").is_none());
        assert!(json.get("note").is_none());
    }
}
