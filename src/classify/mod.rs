pub mod classifier;
pub mod field_model;
