//! Analysis modules.
//!
//! The aggregator ranks and summarizes field values; the filter engine
//! selects records. Both consume the same record collection independently.

pub mod aggregator;
pub mod filter;

pub use aggregator::*;
pub use filter::*;
