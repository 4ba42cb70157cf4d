//! Numeric policy shared by every phase of a proration run.
//!
//! `TOLERANCE` is tied to the two-decimal output: a claim within one cent of its
//! request is treated as full, and a remainder under one cent is not worth
//! another redistribution pass. The iteration cap below is derived from that
//! rule, so the two must change together.

/// One cent. Saturation threshold, loop-exit remainder and stall threshold.
pub const TOLERANCE: f64 = 0.01;

/// Passes allowed on top of one per claim for floating-point settling.
pub const SETTLING_PASSES: usize = 2;

/// Upper bound on redistribution passes for `claim_count` claims.
///
/// Every pass that leaves surplus behind saturates at least one more claim, so
/// at most `claim_count` passes can end with surplus and one more drains it.
pub const fn iteration_cap(claim_count: usize) -> usize {
    claim_count + SETTLING_PASSES
}

/// Round to two decimals, halves away from zero.
///
/// Amounts too large to scale by 100 carry no sub-cent digits and are
/// returned as they are.
pub fn round_cents(amount: f64) -> f64 {
    let cents = amount * 100.0;
    if !cents.is_finite() {
        return amount;
    }
    cents.round() / 100.0
}

/// `amount * (part / whole)`; the caller guarantees `whole > 0`.
pub(crate) fn proportional_share(amount: f64, part: f64, whole: f64) -> f64 {
    amount * (part / whole)
}
