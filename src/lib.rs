//! SENTINEL: Prediction Market Holder-Cohort Scanner
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod upstream;
pub mod storage;
pub mod engine;
pub mod sinks;
