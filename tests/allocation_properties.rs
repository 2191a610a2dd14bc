//! Property tests for vote normalization and allocation splitting.

use num_bigint::BigInt;
use num_rational::BigRational;
use proptest::prelude::*;

use trusty_split::models::{AllocationPool, ContributorVote};
use trusty_split::voting::{normalize_votes, split_allocation, sum_rationals};

const SENT_MAX: u64 = 100;

// Contributors whose received votes add up to the votes actually sent,
// as they do in a real export.
fn contributors() -> impl Strategy<Value = Vec<ContributorVote>> {
    prop::collection::vec((0..=SENT_MAX, 0u64..1_000), 2..12).prop_map(|rows| {
        let total_sent: u64 = rows.iter().map(|(sent, _)| sent).sum();
        let total_weight: u64 = rows.iter().map(|(_, weight)| weight + 1).sum();

        rows.iter()
            .enumerate()
            .map(|(i, (sent, weight))| {
                let received = BigRational::new(
                    BigInt::from(total_sent) * BigInt::from(weight + 1),
                    BigInt::from(total_weight),
                );
                ContributorVote::new(i.to_string(), format!("0x{:02}", i), *sent, received)
            })
            .collect()
    })
}

fn normalized(mut votes: Vec<ContributorVote>) -> Vec<BigRational> {
    normalize_votes(&mut votes, SENT_MAX).unwrap();
    votes.into_iter().map(|v| v.received).collect()
}

fn pool(total_units: u128, contributors: usize) -> AllocationPool {
    AllocationPool::new(total_units, SENT_MAX, contributors).unwrap()
}

proptest! {
    #[test]
    fn normalization_conserves_votes(votes in contributors()) {
        let count = votes.len();
        let received = normalized(votes);
        let total = sum_rationals(&received);

        prop_assert!(total.is_integer());
        prop_assert_eq!(total.to_integer(), BigInt::from(SENT_MAX * count as u64));
    }

    #[test]
    fn allocation_conserves_units(votes in contributors(), total_units in any::<u64>()) {
        let received = normalized(votes);
        let pool = pool(total_units as u128, received.len());
        let outcome = split_allocation(&pool, &received).unwrap();

        prop_assert_eq!(outcome.total(), total_units as u128);
        prop_assert!(outcome.dust <= received.len() as u128);
    }

    #[test]
    fn amounts_are_floor_or_floor_plus_one(votes in contributors(), total_units in any::<u64>()) {
        let received = normalized(votes);
        let pool = pool(total_units as u128, received.len());
        let outcome = split_allocation(&pool, &received).unwrap();

        let total = BigRational::from_integer(BigInt::from(total_units));
        let max_votes = BigRational::from_integer(BigInt::from(pool.max_votes));
        for (i, (share, amount)) in received.iter().zip(&outcome.amounts).enumerate() {
            let floor = (&total * share / &max_votes).floor().to_integer();
            let expected_bonus: u32 = if (i as u128) < outcome.dust { 1 } else { 0 };
            prop_assert_eq!(BigInt::from(*amount), floor + expected_bonus);
        }
    }

    #[test]
    fn splitting_is_deterministic(votes in contributors(), total_units in any::<u64>()) {
        let first = normalized(votes.clone());
        let second = normalized(votes);
        let pool = pool(total_units as u128, first.len());

        prop_assert_eq!(
            split_allocation(&pool, &first).unwrap(),
            split_allocation(&pool, &second).unwrap()
        );
    }

    #[test]
    fn larger_share_never_gets_less(
        weights in prop::collection::vec(1u64..1_000, 2..10),
        pick in any::<prop::sample::Index>(),
        bump in 1u64..1_000,
        total_units in any::<u64>(),
    ) {
        let i = pick.index(weights.len());
        let mut bumped = weights.clone();
        bumped[i] += bump;

        let before = shares_out_of(&weights, 1_000);
        let after = shares_out_of(&bumped, 1_000);
        let pool = AllocationPool { total_units: total_units as u128, max_votes: 1_000 };

        let before = split_allocation(&pool, &before).unwrap();
        let after = split_allocation(&pool, &after).unwrap();
        prop_assert!(after.amounts[i] >= before.amounts[i]);
    }
}

// Scale weights proportionally so they sum to `max_votes`
fn shares_out_of(weights: &[u64], max_votes: u64) -> Vec<BigRational> {
    let total: u64 = weights.iter().sum();
    weights
        .iter()
        .map(|w| BigRational::new(BigInt::from(*w) * BigInt::from(max_votes), BigInt::from(total)))
        .collect()
}
