use regex::Regex;

use crate::model::{Metric, ProjectionSeries, QuarterKey, QuarterPoint};

use super::{ExtractResult, MetricBlock, parse_percent};

/// Header columns detected by pattern rather than by name: quarterly trend
/// columns ("Qn YYYY") and projection-year columns ("YYYY").
#[derive(Debug, Default)]
pub(crate) struct SeriesColumns {
    pub quarters: Vec<(QuarterKey, usize)>,
    pub years: Vec<(u16, usize)>,
}

pub(crate) fn detect_series_columns(
    header: &[String],
    warnings: &mut Vec<String>,
) -> ExtractResult<SeriesColumns> {
    let quarter_pattern = Regex::new(r"^Q([1-4]) (\d{4})$")?;
    let year_pattern = Regex::new(r"^\d{4}$")?;

    let mut columns = SeriesColumns::default();
    for (index, field) in header.iter().enumerate() {
        if let Some(captures) = quarter_pattern.captures(field) {
            let quarter: u8 = captures[1].parse().unwrap_or_default();
            let year: u16 = captures[2].parse().unwrap_or_default();
            let key = QuarterKey { year, quarter };

            if columns.quarters.iter().any(|(seen, _)| *seen == key) {
                warnings.push(format!("duplicate quarter column '{field}' ignored"));
            } else {
                columns.quarters.push((key, index));
            }
        } else if year_pattern.is_match(field) {
            columns.years.push((field.parse().unwrap_or_default(), index));
        }
    }

    Ok(columns)
}

/// One bounded rescan of the metric-header rows per quarter column.
pub(crate) fn build_quarterly(
    blocks: &[MetricBlock],
    quarters: &[(QuarterKey, usize)],
    warnings: &mut Vec<String>,
) -> Vec<QuarterPoint> {
    let mut points: Vec<QuarterPoint> = quarters
        .iter()
        .map(|(key, index)| {
            let mut point = QuarterPoint::new(*key);
            for block in blocks {
                point.set(
                    block.metric,
                    series_cell(&block.header_row, *index, block.metric, key, warnings),
                );
            }
            point
        })
        .collect();

    points.sort_by_key(|point| point.quarter);
    points
}

pub(crate) fn build_projections(
    blocks: &[MetricBlock],
    years: &[(u16, usize)],
    warnings: &mut Vec<String>,
) -> ProjectionSeries {
    let mut projections = ProjectionSeries::default();

    for (year, index) in years {
        projections.years.push(*year);
        for metric in Metric::ALL {
            let cell = blocks
                .iter()
                .find(|block| block.metric == metric)
                .and_then(|block| {
                    let key = format!("{year}");
                    series_label_cell(&block.header_row, *index, metric, &key, warnings)
                });
            projections.push(metric, cell);
        }
    }

    projections
}

fn series_cell(
    row: &[String],
    index: usize,
    metric: Metric,
    quarter: &QuarterKey,
    warnings: &mut Vec<String>,
) -> Option<f64> {
    series_label_cell(row, index, metric, &quarter.to_string(), warnings)
}

fn series_label_cell(
    row: &[String],
    index: usize,
    metric: Metric,
    column: &str,
    warnings: &mut Vec<String>,
) -> Option<f64> {
    let raw = row.get(index).map(String::as_str).unwrap_or("");
    match parse_percent(raw) {
        Ok(cell) => cell,
        Err(malformed) => {
            warnings.push(format!(
                "row '{}': malformed percentage in column '{column}': '{}'",
                metric.label(),
                malformed.0
            ));
            None
        }
    }
}
