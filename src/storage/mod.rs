//! Persistence layer.
//!
//! JSON-file-backed stores for the scanner's settings (including the
//! pagination cursor) and the dedupe sets. Each operation is a full
//! read-modify-write of its backing file; the stores are not designed
//! for concurrent writers, so callers keep mutations sequential.

pub mod dedupe;
pub mod settings;

pub use dedupe::MarketSet;
pub use settings::{Settings, SettingsStore};
