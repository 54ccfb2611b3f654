pub mod dataset;
pub mod placeholder;
