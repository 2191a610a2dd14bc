use log::{debug, info};
use num_bigint::BigInt;
use num_rational::BigRational;
use std::collections::HashSet;

use crate::error::{SplitError, SplitResult};
use crate::models::ContributorVote;
use crate::voting::sum_rationals;

/// Spread every contributor's unsent votes evenly over all the other contributors.
///
/// A contributor who sent `sent_max` votes contributes nothing; everyone,
/// including contributors with leftovers of their own, receives a share of
/// the others' leftovers. On success the received totals add up to exactly
/// `sent_max * contributors.len()`, and that is checked before returning.
pub fn normalize_votes(contributors: &mut [ContributorVote], sent_max: u64) -> SplitResult<()> {
    let count = contributors.len();
    if count <= 1 {
        return Err(SplitError::InvalidInput(format!(
            "normalization requires at least 2 contributors, got {}",
            count
        )));
    }

    validate_contributors(contributors, sent_max)?;

    let leftovers: Vec<u64> = contributors.iter().map(|c| sent_max - c.sent).collect();
    let total_leftover: BigInt = leftovers.iter().map(|l| BigInt::from(*l)).sum();
    let recipients = BigInt::from(count - 1);

    // Everyone receives (all leftovers - own leftover) / (n - 1), which is the
    // sum over every other sender of leftover / (n - 1).
    for (contributor, own_leftover) in contributors.iter_mut().zip(&leftovers) {
        let from_others = &total_leftover - BigInt::from(*own_leftover);
        let bonus = BigRational::new(from_others, recipients.clone());
        debug!("Contributor {} receives {} redistributed votes", contributor.id, bonus);
        contributor.received += bonus;
    }

    let max_votes = BigInt::from(sent_max) * BigInt::from(count);
    let total_received = sum_rationals(contributors.iter().map(|c| &c.received));
    if !total_received.is_integer() || total_received.numer() != &max_votes {
        return Err(SplitError::NormalizationInvariantViolation(format!(
            "received votes sum to {} but {} were expected",
            total_received, max_votes
        )));
    }

    info!(
        "Normalized votes for {} contributors ({} leftover votes redistributed, {} total)",
        count, total_leftover, max_votes
    );
    Ok(())
}

fn validate_contributors(contributors: &[ContributorVote], sent_max: u64) -> SplitResult<()> {
    let mut seen: HashSet<&str> = HashSet::new();

    for contributor in contributors {
        if !seen.insert(contributor.id.as_str()) {
            return Err(SplitError::InvalidInput(format!(
                "duplicate contributor id {}",
                contributor.id
            )));
        }
        if contributor.sent > sent_max {
            return Err(SplitError::InvalidInput(format!(
                "contributor {} sent {} votes, more than the maximum of {}",
                contributor.id, contributor.sent, sent_max
            )));
        }
        if contributor.received < BigRational::from_integer(BigInt::from(0)) {
            return Err(SplitError::InvalidInput(format!(
                "contributor {} has negative received votes {}",
                contributor.id, contributor.received
            )));
        }
    }

    Ok(())
}
