//! Tag reconciliation engine
//!
//! The engine runs in three stages:
//! 1. Classifying - infer each device's capability from its cellular identifiers
//! 2. Planning - queue tag additions and removals per capability
//! 3. Executing - submit the queues in batches, in a fixed order

pub mod classify;
pub mod executor;
pub mod planner;

pub use classify::TagPolicy;
pub use executor::{ExecuteOptions, ExecuteSummary, execute};
pub use planner::{PlanStats, plan};
