//! The report pipeline: filter-domain derivation, multi-criteria filtering,
//! and CSV/HTML materialization.
//!
//! Everything in this module is pure; file writes and network sends happen
//! in the caller.

pub mod export;
pub mod filter;
pub mod index;
pub mod settings;

pub use filter::{FilterCriteria, ReportRow, SignInStatus};
pub use index::DatasetIndex;
