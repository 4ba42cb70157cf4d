//! Capped proportional allocation.
//!
//! ```text
//! claims ──► total requested <= pool? ──yes──► everyone gets their request
//!                    │ no
//!                    ▼
//!            seed by weight, cap at request
//!                    │
//!                    ▼
//!            surplus > 1 cent? ──► split surplus among unsaturated claims by weight
//!                    │                     (repeat, bounded by iteration_cap)
//!                    ▼
//!            round to cents
//! ```

use proration_types::{Allocations, Claim};
use tracing::{debug, trace, warn};

use crate::error::AllocationError;
use crate::policy::{TOLERANCE, iteration_cap, proportional_share, round_cents};

/// Which branch produced the allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProrationOutcome {
    /// Total demand fit in the pool; every claim received its request
    FullySatisfied,
    /// Demand exceeded the pool and amounts were prorated by weight
    Prorated,
}

/// Allocations plus a report of how the run went.
#[derive(Debug, Clone, PartialEq)]
pub struct Proration {
    pub allocations: Allocations,
    pub outcome: ProrationOutcome,
    /// Redistribution passes performed after the weighted seed
    pub iterations: usize,
    /// The bound `iterations` was held to
    pub iteration_cap: usize,
    /// Pool left undistributed, before rounding
    pub unallocated: f64,
    pub total_requested: f64,
}

/// Working record for one claim, alive only for the duration of a run.
#[derive(Debug)]
struct Slot {
    requested: f64,
    weight: f64,
    amount: f64,
    saturated: bool,
}

impl Slot {
    fn seeded(claim: &Claim, weight: f64, proportional: f64) -> Self {
        let mut slot = Self { requested: claim.requested_amount, weight, amount: 0.0, saturated: false };
        slot.grant(proportional);
        slot
    }

    fn room(&self) -> f64 {
        (self.requested - self.amount).max(0.0)
    }

    /// Add up to `share`, capped by the remaining room. Returns what was added.
    fn grant(&mut self, share: f64) -> f64 {
        let granted = share.min(self.room());
        self.amount += granted;
        if self.amount >= self.requested - TOLERANCE {
            self.saturated = true;
        }
        granted
    }
}

/// Allocate `pool` across `claims`, returning the id to amount mapping.
///
/// # Errors
///
/// See [`prorate`].
pub fn allocate(pool: f64, claims: &[Claim]) -> Result<Allocations, AllocationError> {
    prorate(pool, claims).map(|run| run.allocations)
}

/// Allocate `pool` across `claims` and report how the run converged.
///
/// If the claims fit in the pool each receives its request. Otherwise the pool
/// is seeded by weight with every share capped at its request, and the surplus
/// freed by those caps is handed to the remaining claims by weight until less
/// than a cent is left, nobody can take more, or a pass makes no progress.
/// Amounts are rounded to cents.
///
/// # Errors
///
/// - [`AllocationError::InvalidPool`] / [`AllocationError::InvalidClaim`] for
///   negative, NaN or infinite numbers.
/// - [`AllocationError::NoProrationBasis`] when demand exceeds the pool and the
///   weights sum to zero.
pub fn prorate(pool: f64, claims: &[Claim]) -> Result<Proration, AllocationError> {
    check_inputs(pool, claims)?;

    let cap = iteration_cap(claims.len());
    let total_requested: f64 = claims.iter().map(|c| c.requested_amount).sum();

    if total_requested <= pool {
        debug!(pool, total_requested, claims = claims.len(), "demand fits in pool");
        let allocations = claims
            .iter()
            .map(|c| (c.id.clone(), round_cents(c.requested_amount)))
            .collect();
        return Ok(Proration {
            allocations,
            outcome: ProrationOutcome::FullySatisfied,
            iterations: 0,
            iteration_cap: cap,
            unallocated: pool - total_requested,
            total_requested,
        });
    }

    let total_weight: f64 = claims.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return Err(AllocationError::NoProrationBasis { total_weight });
    }

    // Weights near f64::MAX overflow their sum; dividing by the largest keeps
    // every ratio and every later active-weight sum finite.
    let scale = if total_weight.is_finite() {
        1.0
    } else {
        claims.iter().map(|c| c.weight).fold(0.0, f64::max)
    };
    let scaled_total: f64 = claims.iter().map(|c| c.weight / scale).sum();

    let mut slots: Vec<Slot> = claims
        .iter()
        .map(|c| {
            let weight = c.weight / scale;
            Slot::seeded(c, weight, proportional_share(pool, weight, scaled_total))
        })
        .collect();
    let mut remaining = pool - slots.iter().map(|s| s.amount).sum::<f64>();
    debug!(pool, total_requested, total_weight, scale, remaining, "seeded by weight");

    let mut iterations = 0;
    while remaining > TOLERANCE {
        let (active_count, active_weight) = slots
            .iter()
            .filter(|s| !s.saturated)
            .fold((0usize, 0.0), |(n, w), s| (n + 1, w + s.weight));
        if active_count == 0 {
            break;
        }
        if iterations == cap {
            warn!(iterations, remaining, active_count, "redistribution hit iteration cap");
            break;
        }
        iterations += 1;

        let distributed = redistribute(&mut slots, remaining, active_count, active_weight);
        remaining -= distributed;
        trace!(iteration = iterations, active_count, distributed, remaining, "redistribution pass");

        if distributed < TOLERANCE {
            debug!(iterations, remaining, "redistribution stalled");
            break;
        }
    }

    let allocations = claims
        .iter()
        .zip(&slots)
        .map(|(claim, slot)| (claim.id.clone(), round_cents(slot.amount)))
        .collect();

    debug!(iterations, unallocated = remaining, "proration complete");
    Ok(Proration {
        allocations,
        outcome: ProrationOutcome::Prorated,
        iterations,
        iteration_cap: cap,
        unallocated: remaining,
        total_requested,
    })
}

/// One pass: split `remaining` among unsaturated slots and return the amount
/// actually handed out.
///
/// When every unsaturated slot has zero weight there is no ratio to follow, so
/// the surplus is split evenly between them.
fn redistribute(slots: &mut [Slot], remaining: f64, active_count: usize, active_weight: f64) -> f64 {
    let mut distributed = 0.0;
    for slot in slots.iter_mut().filter(|s| !s.saturated) {
        let share = if active_weight > 0.0 {
            proportional_share(remaining, slot.weight, active_weight)
        } else {
            remaining / active_count as f64
        };
        distributed += slot.grant(share);
    }
    distributed
}

fn check_inputs(pool: f64, claims: &[Claim]) -> Result<(), AllocationError> {
    if !is_amount(pool) {
        return Err(AllocationError::InvalidPool { value: pool });
    }
    for claim in claims {
        for (field, value) in [("requested_amount", claim.requested_amount), ("weight", claim.weight)] {
            if !is_amount(value) {
                return Err(AllocationError::InvalidClaim { claim: claim.id.clone(), field, value });
            }
        }
    }
    Ok(())
}

fn is_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}
