mod apply;
mod run;
#[cfg(test)]
mod tests;

pub use apply::{CorrectError, Correction, apply_corrections};
pub use run::run;
