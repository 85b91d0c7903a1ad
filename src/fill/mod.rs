pub mod executor;
pub mod pacing;
