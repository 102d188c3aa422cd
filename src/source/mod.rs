//! Record source handling.
//!
//! This module loads a JSON array of flat records from a local file or a
//! remote URL. Any failure means there is no data to analyze.

pub mod loader;

pub use loader::{load_records, LoadOptions, RecordSource};
