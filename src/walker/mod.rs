pub mod guard;
pub mod walker;
pub mod walker_model;
