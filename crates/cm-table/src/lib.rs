//! Two-level case-mapping tables for casemap.
//!
//! Searches the block sizes that minimise the encoded size of a domain,
//! verifies the result and packs it into the tables the generated lookup
//! code consumes.

pub mod emit;
pub mod keysym;
pub mod optimizer;
pub mod solution;
pub mod width;

#[cfg(test)]
mod proptests;

pub use emit::EmittedTables;
pub use keysym::{CaseMappingTables, UNICODE_MAX, UNICODE_MIN, UNICODE_OFFSET};
pub use optimizer::{
    BestUpdate, CandidateReport, Optimizer, Outcome, SearchParams, SearchReport, Stats,
};
pub use solution::{Solution, verify};
pub use width::IntWidth;
