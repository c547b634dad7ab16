use thiserror::Error;

mod blocks;
mod header;
mod percent;
mod pipeline;
mod run;
mod series;

pub use pipeline::{Extraction, extract};
pub use run::run;

use blocks::*;
use header::*;
use percent::*;
use series::*;

/// Extraction failures. A missing key column aborts the whole parse; a
/// malformed cell aborts only the record of the row it appears on.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("csv input contains no rows")]
    EmptyInput,
    #[error("required column missing from header: '{0}'")]
    MissingColumn(String),
    #[error("row '{row}': malformed percentage in column '{column}': '{raw}'")]
    MalformedValue {
        row: String,
        column: String,
        raw: String,
    },
    #[error("invalid header pattern: {0}")]
    Pattern(#[from] regex::Error),
}

pub type ExtractResult<T> = std::result::Result<T, ExtractError>;
