use super::{ExtractError, ExtractResult};

pub(crate) const VALUE_COLUMN: &str = "Q1 2025";
pub(crate) const VS_TARGET_COLUMN: &str = "Q1'25 VS Target";
pub(crate) const VS_Q4_COLUMN: &str = "Q1'25 vs Q4'24";
pub(crate) const VS_YOY_COLUMN: &str = "Q1'25 vs Q1'24";

/// Indices of the four key columns every metric and market row is read
/// from. Resolved by exact header match, not position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyColumns {
    pub value: usize,
    pub vs_target: usize,
    pub vs_q4: usize,
    pub vs_yoy: usize,
}

pub(crate) fn resolve_key_columns(header: &[String]) -> ExtractResult<KeyColumns> {
    Ok(KeyColumns {
        value: find_column(header, VALUE_COLUMN)?,
        vs_target: find_column(header, VS_TARGET_COLUMN)?,
        vs_q4: find_column(header, VS_Q4_COLUMN)?,
        vs_yoy: find_column(header, VS_YOY_COLUMN)?,
    })
}

fn find_column(header: &[String], name: &str) -> ExtractResult<usize> {
    header
        .iter()
        .position(|field| field == name)
        .ok_or_else(|| ExtractError::MissingColumn(name.to_string()))
}
