mod diff;
mod run;
#[cfg(test)]
mod tests;

pub use diff::{DEFAULT_TOLERANCE, MissingPolicy, ValidateOptions, validate};
pub use run::run;
