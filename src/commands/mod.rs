pub mod correct;
pub mod extract;
pub mod status;
pub mod validate;
