//! The proration engine.
//!
//! Splits a fixed pool among competing claims in proportion to each claim's
//! weight, never granting a claim more than it requested, and hands surplus
//! freed by those caps to the claims that can still absorb it.
//!
//! The engine is a pure, synchronous computation: no I/O, no shared state, and
//! bounded run time. Callers are expected to validate request shape (unique
//! ids, non-empty claim list) before invoking it; the engine itself only
//! defends its arithmetic.

pub mod engine;
pub mod error;
pub mod policy;

pub use engine::{Proration, ProrationOutcome, allocate, prorate};
pub use error::AllocationError;
pub use policy::{SETTLING_PASSES, TOLERANCE, iteration_cap, round_cents};
pub use proration_types::{AllocationRequest, Allocations, Claim, ClaimAllocation};
