pub mod case_model;
pub mod draft;
pub mod store;
