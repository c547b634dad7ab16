/// Raised when a cell holds something other than a percentage; carries the
/// offending text so callers can attach row/column context.
#[derive(Debug)]
pub(crate) struct MalformedPercent(pub String);

/// Parse one percentage cell. The empty string and the literal `"-"` are
/// the explicit no-data state; `0` is reserved for a parsed `"0%"`.
pub(crate) fn parse_percent(raw: &str) -> Result<Option<f64>, MalformedPercent> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(None);
    }

    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    number
        .parse::<f64>()
        .map(Some)
        .map_err(|_| MalformedPercent(trimmed.to_string()))
}
