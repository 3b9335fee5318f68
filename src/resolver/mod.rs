//! Place resolution against the geocoding service
//!
//! - [`query`]: ordered search strings for one place
//! - [`scoring`]: locality filter and best-candidate pick for one query
//! - [`resolve`]: per-place state machine with fallback tiers
//! - [`scheduler`]: bounded, paced resolution of many places

pub mod query;
pub mod resolve;
pub mod scheduler;
pub mod scoring;

pub use query::{build_queries, is_museum};
pub use resolve::{MatchTier, Resolution, Resolver};
pub use scheduler::BatchScheduler;
pub use scoring::{best_candidate, passes_locality, result_set};
