use log::{debug, info};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use crate::error::{SplitError, SplitResult};
use crate::models::AllocationPool;
use crate::voting::{rational_from_u128, units_from_bigint};

/// Integer amounts produced by the splitter, in the same order as its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub amounts: Vec<u128>,
    /// Units left over after flooring, handed out one each from the front of the list
    pub dust: u128,
}

impl SplitOutcome {
    pub fn total(&self) -> u128 {
        self.amounts.iter().sum()
    }
}

/// Divide `pool.total_units` in proportion to each share of `pool.max_votes`.
///
/// Every exact share is floored, then the remaining dust is given one unit at a
/// time to the first contributors in list order, so the same input always
/// yields the same amounts. Pure: nothing outside the returned value changes.
pub fn split_allocation(
    pool: &AllocationPool,
    received: &[BigRational],
) -> SplitResult<SplitOutcome> {
    if pool.max_votes == 0 {
        return Err(SplitError::InvalidInput("max votes must be positive".to_string()));
    }

    let total = rational_from_u128(pool.total_units);
    let max_votes = rational_from_u128(pool.max_votes);

    let mut amounts = Vec::with_capacity(received.len());
    let mut floored_sum = BigInt::zero();
    for share in received {
        if share < &BigRational::zero() {
            return Err(SplitError::InvalidInput(format!("negative vote share {}", share)));
        }
        let base = (&total * share / &max_votes).floor().to_integer();
        floored_sum += &base;
        amounts.push(units_from_bigint(&base, "base amount")?);
    }

    let dust = BigInt::from(pool.total_units) - floored_sum;
    let contributor_count = BigInt::from(received.len());
    if dust < BigInt::zero() || dust > contributor_count {
        return Err(SplitError::AllocationInvariantViolation(format!(
            "dust of {} units is outside 0..={} for {} contributors",
            dust,
            received.len(),
            received.len()
        )));
    }
    let dust = units_from_bigint(&dust, "dust")?;

    for amount in amounts.iter_mut().take(dust as usize) {
        *amount += 1;
    }
    debug!("Assigned {} dust units to the first contributors in list order", dust);

    let outcome = SplitOutcome { amounts, dust };
    let allocated = outcome.amounts.iter().try_fold(0u128, |acc, a| acc.checked_add(*a));
    if allocated != Some(pool.total_units) {
        return Err(SplitError::AllocationInvariantViolation(format!(
            "allocations sum to {:?} instead of {}",
            allocated, pool.total_units
        )));
    }

    info!(
        "Split {} units across {} contributors ({} dust)",
        pool.total_units,
        outcome.amounts.len(),
        outcome.dust
    );
    Ok(outcome)
}
