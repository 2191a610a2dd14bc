use num_rational::BigRational;
use serde::{Deserialize, Serialize};

use crate::error::{SplitError, SplitResult};

/// One contributor's votes for the round.
///
/// `received` is parsed once from the source row, adjusted in place by the
/// normalizer and read-only from then on.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributorVote {
    pub id: String,
    pub address: String,
    pub sent: u64,
    pub received: BigRational,
}

impl ContributorVote {
    pub fn new(
        id: impl Into<String>,
        address: impl Into<String>,
        sent: u64,
        received: BigRational,
    ) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            sent,
            received,
        }
    }
}

/// The pool being divided and the vote total it is divided against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationPool {
    pub total_units: u128,
    pub max_votes: u128,
}

impl AllocationPool {
    pub fn new(total_units: u128, sent_max: u64, contributor_count: usize) -> SplitResult<Self> {
        let max_votes = (sent_max as u128)
            .checked_mul(contributor_count as u128)
            .ok_or_else(|| SplitError::InvalidInput("max votes overflows".to_string()))?;

        Ok(Self { total_units, max_votes })
    }
}

/// Final integer amount owed to one contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub contributor_id: String,
    pub address: String,
    pub amount: u128,
}

/// How the number of units to disperse is determined for a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingMode {
    /// `total_units` is taken as configured.
    Literal { total_units: u128 },
    /// Deposit the underlying into the share vault and disperse the measured share increase.
    Deposit { underlying_units: u128 },
    /// Convert the underlying to shares with the vault's quoted price, without depositing.
    Quote { underlying_units: u128 },
}

impl FundingMode {
    pub fn name(&self) -> &'static str {
        match self {
            FundingMode::Literal { .. } => "literal",
            FundingMode::Deposit { .. } => "deposit",
            FundingMode::Quote { .. } => "quote",
        }
    }
}
