//! Core engine: cursor, cohort aggregation, flag rule, scheduling.

pub mod aggregator;
pub mod cursor;
pub mod flag;
pub mod rundown;
pub mod window;
