pub mod normalize;
pub mod split;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

use crate::error::{SplitError, SplitResult};

pub use normalize::normalize_votes;
pub use split::{split_allocation, SplitOutcome};

// Exact sum of a sequence of rationals
pub fn sum_rationals<'a>(values: impl IntoIterator<Item = &'a BigRational>) -> BigRational {
    values
        .into_iter()
        .fold(BigRational::zero(), |acc, value| acc + value)
}

pub fn rational_from_u128(value: u128) -> BigRational {
    BigRational::from_integer(BigInt::from(value))
}

// Narrow an exact integer back to a unit count, failing instead of truncating
pub fn units_from_bigint(value: &BigInt, what: &str) -> SplitResult<u128> {
    value.to_u128().ok_or_else(|| {
        SplitError::AllocationInvariantViolation(format!(
            "{} {} is outside the unit range",
            what, value
        ))
    })
}
