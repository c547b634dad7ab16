use std::collections::BTreeMap;

use crate::model::{
    AtRiskEntry, MarketRecord, MetricReading, NormalizedModel, OverallMetrics, round1,
};

use super::{
    ExtractError, ExtractResult, KeyColumns, MalformedPercent, VALUE_COLUMN, VS_Q4_COLUMN,
    VS_TARGET_COLUMN, VS_YOY_COLUMN, build_projections, build_quarterly, detect_series_columns,
    parse_percent, partition_rows, resolve_key_columns, split_rows,
};

/// A freshly built model plus the row-level findings that did not abort
/// the parse: orphan rows, skipped records, duplicate series columns.
#[derive(Debug)]
pub struct Extraction {
    pub model: NormalizedModel,
    pub warnings: Vec<String>,
}

/// Parse raw CSV text into the normalized metrics model.
///
/// The four key columns are required; their absence aborts the parse. All
/// other findings degrade to warnings so one bad row cannot take down the
/// whole extraction.
pub fn extract(csv_text: &str) -> ExtractResult<Extraction> {
    let rows = split_rows(csv_text);
    let Some((header, data_rows)) = rows.split_first() else {
        return Err(ExtractError::EmptyInput);
    };

    let columns = resolve_key_columns(header)?;
    let mut warnings = Vec::new();

    let partition = partition_rows(data_rows);
    for orphan in &partition.orphan_rows {
        warnings.push(format!(
            "row '{orphan}' appears before any metric header and was dropped"
        ));
    }

    let mut overall = OverallMetrics::default();
    let mut markets = BTreeMap::new();
    let mut at_risk = Vec::new();

    for block in &partition.blocks {
        match parse_key_cells(&block.header_row, &columns, block.metric.label()) {
            Ok(cells) => *overall.get_mut(block.metric) = cells.reading(),
            Err(err) => warnings.push(err.to_string()),
        }

        for row in &block.market_rows {
            let market = row[0].as_str();
            let cells = match parse_key_cells(row, &columns, market) {
                Ok(cells) => cells,
                Err(err) => {
                    warnings.push(err.to_string());
                    continue;
                }
            };

            let record = cells.market_record();
            if let Some(entry) = AtRiskEntry::evaluate(market, block.metric, &record) {
                at_risk.push(entry);
            }
            markets
                .entry(market.to_string())
                .or_insert_with(BTreeMap::new)
                .insert(block.metric, record);
        }
    }

    let series = detect_series_columns(header, &mut warnings)?;
    let quarterly = build_quarterly(&partition.blocks, &series.quarters, &mut warnings);
    let projections = build_projections(&partition.blocks, &series.years, &mut warnings);

    Ok(Extraction {
        model: NormalizedModel {
            overall,
            markets,
            quarterly,
            projections,
            at_risk,
        },
        warnings,
    })
}

/// The four key cells of a metric or market row. Absent cells read as 0.0
/// here, the documented convention for the key columns; series cells keep
/// the distinction.
#[derive(Debug, Clone, Copy)]
struct KeyCells {
    value: f64,
    vs_target: f64,
    vs_q4: f64,
    vs_yoy: f64,
}

impl KeyCells {
    fn reading(self) -> MetricReading {
        MetricReading {
            value: self.value,
            vs_target: self.vs_target,
            vs_q4: self.vs_q4,
            vs_yoy: self.vs_yoy,
        }
    }

    fn market_record(self) -> MarketRecord {
        MarketRecord {
            value: self.value,
            target_value: round1(self.value - self.vs_target),
            vs_target: self.vs_target,
            vs_q4: self.vs_q4,
            vs_yoy: self.vs_yoy,
        }
    }
}

fn parse_key_cells(row: &[String], columns: &KeyColumns, label: &str) -> ExtractResult<KeyCells> {
    Ok(KeyCells {
        value: key_cell(row, columns.value, VALUE_COLUMN, label)?,
        vs_target: key_cell(row, columns.vs_target, VS_TARGET_COLUMN, label)?,
        vs_q4: key_cell(row, columns.vs_q4, VS_Q4_COLUMN, label)?,
        vs_yoy: key_cell(row, columns.vs_yoy, VS_YOY_COLUMN, label)?,
    })
}

fn key_cell(row: &[String], index: usize, column: &str, label: &str) -> ExtractResult<f64> {
    let raw = row.get(index).map(String::as_str).unwrap_or("");
    match parse_percent(raw) {
        Ok(cell) => Ok(cell.unwrap_or(0.0)),
        Err(MalformedPercent(raw)) => Err(ExtractError::MalformedValue {
            row: label.to_string(),
            column: column.to_string(),
            raw,
        }),
    }
}
