pub mod engine;
pub mod language;
