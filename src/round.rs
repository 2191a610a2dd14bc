use log::info;
use num_rational::BigRational;

use crate::disburse::{DisbursementPlan, DisbursementReceipt, DisbursementSink};
use crate::error::{SplitError, SplitResult};
use crate::funding::{derive_total_units, verify_reconstruction, ShareVault};
use crate::models::{Allocation, AllocationPool, FundingMode};
use crate::source::VoteSource;
use crate::voting::{normalize_votes, split_allocation};

/// Settings for a single allocation round.
#[derive(Debug, Clone)]
pub struct RoundSettings {
    pub token: String,
    pub sent_max: u64,
    pub funding: FundingMode,
    pub share_decimals: u32,
}

#[derive(Debug, Clone)]
pub struct ContributorResult {
    pub allocation: Allocation,
    pub sent: u64,
    pub normalized_votes: BigRational,
}

#[derive(Debug, Clone)]
pub struct RoundReport {
    pub pool: AllocationPool,
    pub dust: u128,
    pub contributors: Vec<ContributorResult>,
    pub receipt: DisbursementReceipt,
}

/// Everything up to, but not including, disbursement. Has no side effects
/// beyond the vault deposit in deposit mode.
#[derive(Debug, Clone)]
pub struct PreparedRound {
    pub pool: AllocationPool,
    pub dust: u128,
    pub contributors: Vec<ContributorResult>,
    pub plan: DisbursementPlan,
}

pub async fn prepare_round(
    settings: &RoundSettings,
    source: &dyn VoteSource,
    vault: Option<&dyn ShareVault>,
) -> SplitResult<PreparedRound> {
    info!("Loading votes from {}", source.describe());
    let mut votes = source.fetch_votes().await?;
    normalize_votes(&mut votes, settings.sent_max)?;

    let funding = derive_total_units(settings.funding, vault).await?;
    let pool = AllocationPool::new(funding.total_units, settings.sent_max, votes.len())?;

    let received: Vec<BigRational> = votes.iter().map(|v| v.received.clone()).collect();
    let outcome = split_allocation(&pool, &received)?;
    verify_reconstruction(&funding, outcome.total(), settings.share_decimals)?;

    let contributors: Vec<ContributorResult> = votes
        .into_iter()
        .zip(outcome.amounts)
        .map(|(vote, amount)| ContributorResult {
            allocation: Allocation {
                contributor_id: vote.id,
                address: vote.address,
                amount,
            },
            sent: vote.sent,
            normalized_votes: vote.received,
        })
        .collect();

    let allocations: Vec<Allocation> = contributors.iter().map(|c| c.allocation.clone()).collect();
    let plan = DisbursementPlan::new(settings.token.clone(), &allocations, pool.total_units)?;

    Ok(PreparedRound {
        pool,
        dust: outcome.dust,
        contributors,
        plan,
    })
}

/// Run one round end to end. The sink is called once, only after every check has passed.
pub async fn run_round(
    settings: &RoundSettings,
    source: &dyn VoteSource,
    vault: Option<&dyn ShareVault>,
    sink: &dyn DisbursementSink,
) -> SplitResult<RoundReport> {
    let prepared = prepare_round(settings, source, vault).await?;

    let receipt = sink.disperse(&prepared.plan).await.map_err(|e| match e {
        failed @ SplitError::Disbursement(_) => failed,
        other => SplitError::Disbursement(other.to_string()),
    })?;
    info!(
        "Batch {} dispersed {} units to {} recipients",
        receipt.batch_id, receipt.total_units, receipt.transfer_count
    );

    Ok(RoundReport {
        pool: prepared.pool,
        dust: prepared.dust,
        contributors: prepared.contributors,
        receipt,
    })
}

impl RoundReport {
    /// Human-readable breakdown of the round.
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!(
            "**Batch {}** ({})\n\n",
            self.receipt.batch_id, self.receipt.reference
        ));
        for result in &self.contributors {
            summary.push_str(&format!(
                "{} ({}): sent {}, votes {:.4}, amount {}\n",
                result.allocation.contributor_id,
                result.allocation.address,
                result.sent,
                to_display(&result.normalized_votes),
                result.allocation.amount
            ));
        }
        summary.push_str(&format!(
            "\n{} units split across {} contributors out of {} votes, {} dust units assigned.",
            self.pool.total_units,
            self.contributors.len(),
            self.pool.max_votes,
            self.dust
        ));

        summary
    }
}

// Display only; every computation stays exact
fn to_display(value: &BigRational) -> f64 {
    use num_traits::ToPrimitive;
    value.to_f64().unwrap_or(f64::NAN)
}
