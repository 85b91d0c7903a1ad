pub mod ax_model;
pub mod normalize;
pub mod tree;
