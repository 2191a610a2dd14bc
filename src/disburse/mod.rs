pub mod json_file;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{SplitError, SplitResult};
use crate::models::Allocation;

pub use json_file::JsonFileSink;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub address: String,
    pub amount: u128,
}

/// A validated batch of transfers, ready to hand to a sink.
///
/// Only constructible from allocations that add up to the stated total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisbursementPlan {
    token: String,
    transfers: Vec<Transfer>,
    total_units: u128,
}

impl DisbursementPlan {
    pub fn new(
        token: impl Into<String>,
        allocations: &[Allocation],
        total_units: u128,
    ) -> SplitResult<Self> {
        let transfers: Vec<Transfer> = allocations
            .iter()
            .map(|a| Transfer {
                address: a.address.clone(),
                amount: a.amount,
            })
            .collect();

        let sum = transfers.iter().try_fold(0u128, |acc, t| acc.checked_add(t.amount));
        if sum != Some(total_units) {
            return Err(SplitError::AllocationInvariantViolation(format!(
                "disbursement amounts sum to {:?}, expected {}",
                sum, total_units
            )));
        }

        Ok(Self {
            token: token.into(),
            transfers,
            total_units,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    pub fn total_units(&self) -> u128 {
        self.total_units
    }

    /// Index-aligned recipient and amount lists, as a batch transfer call takes them.
    pub fn columns(&self) -> (Vec<String>, Vec<u128>) {
        self.transfers
            .iter()
            .map(|t| (t.address.clone(), t.amount))
            .unzip()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisbursementReceipt {
    pub batch_id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub transfer_count: usize,
    pub total_units: u128,
    /// Where the batch went: a file path, a transaction reference, or "dry-run"
    pub reference: String,
}

impl DisbursementReceipt {
    pub fn for_plan(plan: &DisbursementPlan, reference: impl Into<String>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            transfer_count: plan.transfers().len(),
            total_units: plan.total_units(),
            reference: reference.into(),
        }
    }
}

/// Moves the whole batch or nothing. Called at most once per round and never retried.
#[async_trait]
pub trait DisbursementSink: Send + Sync {
    async fn disperse(&self, plan: &DisbursementPlan) -> SplitResult<DisbursementReceipt>;
}

/// Logs every transfer without moving anything.
pub struct DryRunSink;

#[async_trait]
impl DisbursementSink for DryRunSink {
    async fn disperse(&self, plan: &DisbursementPlan) -> SplitResult<DisbursementReceipt> {
        info!(
            "Dry run: {} transfers of {} totalling {} units",
            plan.transfers().len(),
            plan.token(),
            plan.total_units()
        );
        for transfer in plan.transfers() {
            info!("  {} -> {}", transfer.amount, transfer.address);
        }
        Ok(DisbursementReceipt::for_plan(plan, "dry-run"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(id: &str, amount: u128) -> Allocation {
        Allocation {
            contributor_id: id.to_string(),
            address: format!("0x{}", id),
            amount,
        }
    }

    #[test]
    fn plan_keeps_recipients_and_amounts_aligned() {
        let allocations = [allocation("a", 4), allocation("b", 3), allocation("c", 3)];
        let plan = DisbursementPlan::new("yvYFI", &allocations, 10).unwrap();
        let (recipients, amounts) = plan.columns();
        assert_eq!(recipients, vec!["0xa", "0xb", "0xc"]);
        assert_eq!(amounts, vec![4, 3, 3]);
    }

    #[test]
    fn plan_rejects_mismatched_total() {
        let allocations = [allocation("a", 4), allocation("b", 3)];
        let err = DisbursementPlan::new("yvYFI", &allocations, 10).unwrap_err();
        assert!(matches!(err, SplitError::AllocationInvariantViolation(_)));
    }

    #[tokio::test]
    async fn dry_run_reports_the_batch() {
        let allocations = [allocation("a", 7), allocation("b", 3)];
        let plan = DisbursementPlan::new("yvYFI", &allocations, 10).unwrap();
        let receipt = DryRunSink.disperse(&plan).await.unwrap();
        assert_eq!(receipt.transfer_count, 2);
        assert_eq!(receipt.total_units, 10);
        assert_eq!(receipt.reference, "dry-run");
    }
}
