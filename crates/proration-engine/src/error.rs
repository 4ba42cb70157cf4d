//! Errors raised by the allocation engine.
//!
//! Every variant is a domain error: the request was well-formed but its numbers
//! make proration undefined. Shape problems (duplicate ids, empty claim lists)
//! belong to the caller's validation layer.

use thiserror::Error;

/// Failure of a single proration run
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// Demand exceeds the pool but the weights give nothing to prorate by
    #[error("no proration basis: total weight is {total_weight} while demand exceeds the pool")]
    NoProrationBasis { total_weight: f64 },

    /// The pool is negative, NaN or infinite
    #[error("invalid pool amount: {value}")]
    InvalidPool { value: f64 },

    /// A claim carries a negative, NaN or infinite number
    #[error("invalid {field} for claim '{claim}': {value}")]
    InvalidClaim { claim: String, field: &'static str, value: f64 },
}

impl AllocationError {
    /// Stable machine-readable code for logs and API payloads
    pub fn code(&self) -> &'static str {
        match self {
            AllocationError::NoProrationBasis { .. } => "NO_PRORATION_BASIS",
            AllocationError::InvalidPool { .. } => "INVALID_POOL",
            AllocationError::InvalidClaim { .. } => "INVALID_CLAIM",
        }
    }
}
