//! Request validation performed before a request reaches the engine.
//!
//! The engine trusts the shape of what it is given; everything a client can
//! get wrong is rejected here with a client error.

use std::collections::HashSet;

use proration_types::AllocationRequest;
use thiserror::Error;

use crate::config::LimitsConfig;

/// A request the client must fix before retrying
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("Malformed request body: {0}")]
    Malformed(String),

    #[error("Pool must be a positive amount, got {value}")]
    InvalidPool { value: f64 },

    #[error("At least one claim is required")]
    NoClaims,

    #[error("Too many claims: {count} exceeds the limit of {limit}")]
    TooManyClaims { count: usize, limit: usize },

    #[error("Claim #{index} has no id")]
    BlankId { index: usize },

    #[error("Duplicate claim id '{id}'")]
    DuplicateId { id: String },

    #[error("Claim '{id}' has an invalid {field}: {value}")]
    InvalidAmount { id: String, field: &'static str, value: f64 },
}

impl InputError {
    /// Name of the offending request field, when there is one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            InputError::Malformed(_) => None,
            InputError::InvalidPool { .. } => Some("pool"),
            InputError::NoClaims | InputError::TooManyClaims { .. } => Some("claims"),
            InputError::BlankId { .. } | InputError::DuplicateId { .. } => Some("id"),
            InputError::InvalidAmount { field, .. } => Some(*field),
        }
    }
}

/// Check a request against the input contract and the configured limits.
pub fn validate_request(
    request: &AllocationRequest,
    limits: &LimitsConfig,
) -> Result<(), InputError> {
    if !(request.pool.is_finite() && request.pool > 0.0) {
        return Err(InputError::InvalidPool { value: request.pool });
    }
    if request.claims.is_empty() {
        return Err(InputError::NoClaims);
    }
    if request.claims.len() > limits.max_claims_per_request {
        return Err(InputError::TooManyClaims {
            count: request.claims.len(),
            limit: limits.max_claims_per_request,
        });
    }

    let mut seen = HashSet::with_capacity(request.claims.len());
    for (index, claim) in request.claims.iter().enumerate() {
        if claim.id.trim().is_empty() {
            return Err(InputError::BlankId { index });
        }
        if !seen.insert(claim.id.as_str()) {
            return Err(InputError::DuplicateId { id: claim.id.clone() });
        }
        for (field, value) in [("requested_amount", claim.requested_amount), ("weight", claim.weight)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(InputError::InvalidAmount { id: claim.id.clone(), field, value });
            }
        }
    }
    Ok(())
}
