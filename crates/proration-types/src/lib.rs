//! Proration Types
//!
//! This crate defines the data structures shared by the proration workspace
//! (currently `proration-engine` and `proration-api`). It keeps the wire shape of
//! a request and of its result in one place so the engine and the HTTP boundary
//! never disagree about field names.

#![deny(clippy::all)]
#![deny(missing_docs)]

mod types;
pub use types::{AllocationRequest, Allocations, Claim, ClaimAllocation};
