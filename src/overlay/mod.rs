pub mod projector;
pub mod types;
