pub mod examples;
pub mod matcher;
pub mod source;
pub mod resolver;
pub mod rules;
