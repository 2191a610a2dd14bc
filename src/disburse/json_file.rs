use async_trait::async_trait;
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

use crate::disburse::{DisbursementPlan, DisbursementReceipt, DisbursementSink};
use crate::error::{SplitError, SplitResult};

/// Writes the batch as a JSON instruction file for external submission tooling.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

// Amounts are strings: smallest-unit totals routinely exceed what JSON numbers hold exactly.
#[derive(Serialize)]
struct BatchFile<'a> {
    batch_id: String,
    created_at: String,
    token: &'a str,
    total_units: String,
    recipients: Vec<String>,
    amounts: Vec<String>,
}

#[async_trait]
impl DisbursementSink for JsonFileSink {
    async fn disperse(&self, plan: &DisbursementPlan) -> SplitResult<DisbursementReceipt> {
        let receipt = DisbursementReceipt::for_plan(plan, self.path.display().to_string());
        let (recipients, amounts) = plan.columns();

        let batch = BatchFile {
            batch_id: receipt.batch_id.to_string(),
            created_at: receipt.submitted_at.to_rfc3339(),
            token: plan.token(),
            total_units: plan.total_units().to_string(),
            recipients,
            amounts: amounts.iter().map(|amount| amount.to_string()).collect(),
        };
        let body = serde_json::to_vec_pretty(&batch)
            .map_err(|e| SplitError::Disbursement(format!("failed to encode batch: {}", e)))?;

        // create_new: never clobber a batch that may already have been submitted
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
            .map_err(|e| {
                SplitError::Disbursement(format!("cannot create {}: {}", self.path.display(), e))
            })?;
        file.write_all(&body)
            .await
            .map_err(|e| {
                SplitError::Disbursement(format!("failed to write {}: {}", self.path.display(), e))
            })?;
        file.flush()
            .await
            .map_err(|e| {
                SplitError::Disbursement(format!("failed to write {}: {}", self.path.display(), e))
            })?;

        info!(
            "Wrote batch {} with {} transfers to {}",
            receipt.batch_id,
            receipt.transfer_count,
            self.path.display()
        );
        Ok(receipt)
    }
}
