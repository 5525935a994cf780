//! Sentinel Code Agent — AI-powered security and code quality review.
//!
//! Thin orchestration over an external completion service: collect source
//! files, send each to the model, format the natural-language findings into
//! markdown reports, and optionally publish those reports to a GitHub branch.

pub mod analyzer;
pub mod config;
pub mod pipeline;
pub mod publisher;
pub mod report;
pub mod scanner;
pub mod server;
