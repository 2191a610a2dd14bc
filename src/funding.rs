use async_trait::async_trait;
use log::{info, warn};
use num_bigint::BigInt;
use tokio::sync::Mutex;

use crate::error::{SplitError, SplitResult};
use crate::models::FundingMode;
use crate::voting::units_from_bigint;

/// Exchange between an underlying token and the share token that gets dispersed.
///
/// `price_per_share` is the amount of underlying units one whole share is
/// worth, scaled by `10^decimals`.
#[async_trait]
pub trait ShareVault: Send + Sync {
    async fn price_per_share(&self) -> SplitResult<u128>;

    fn decimals(&self) -> u32;

    /// Deposit underlying units and return the measured increase in share balance.
    async fn deposit(&self, underlying_units: u128) -> SplitResult<u128>;

    /// Shares currently held, if the vault can tell.
    async fn share_balance(&self) -> SplitResult<Option<u128>>;

    /// Underlying units available to deposit, if the vault can tell.
    async fn underlying_balance(&self) -> SplitResult<Option<u128>>;
}

/// The units to disperse for this round, with what they were derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Funding {
    pub total_units: u128,
    pub underlying_units: Option<u128>,
    pub price_per_share: Option<u128>,
}

pub async fn derive_total_units(
    mode: FundingMode,
    vault: Option<&dyn ShareVault>,
) -> SplitResult<Funding> {
    match mode {
        FundingMode::Literal { total_units } => Ok(Funding {
            total_units,
            underlying_units: None,
            price_per_share: None,
        }),
        FundingMode::Deposit { underlying_units } => {
            let vault = require_vault(vault, mode)?;
            match vault.underlying_balance().await? {
                Some(balance) if balance < underlying_units => {
                    return Err(SplitError::InvalidInput(format!(
                        "underlying balance {} cannot cover a deposit of {}",
                        balance, underlying_units
                    )));
                }
                Some(_) => {}
                None => warn!("Underlying balance unknown, skipping coverage check"),
            }

            let price = vault.price_per_share().await?;
            let minted = vault.deposit(underlying_units).await?;
            info!("Deposited {} underlying units, {} shares minted", underlying_units, minted);
            Ok(Funding {
                total_units: minted,
                underlying_units: Some(underlying_units),
                price_per_share: Some(price),
            })
        }
        FundingMode::Quote { underlying_units } => {
            let vault = require_vault(vault, mode)?;
            let price = vault.price_per_share().await?;
            let total_units = shares_for_underlying(underlying_units, price, vault.decimals())?;

            match vault.share_balance().await? {
                Some(balance) if balance < total_units => {
                    return Err(SplitError::InvalidInput(format!(
                        "share balance {} cannot cover {} quoted shares",
                        balance, total_units
                    )));
                }
                Some(_) => {}
                None => warn!("Share balance unknown, skipping coverage check"),
            }

            info!("Quoted {} shares for {} underlying units", total_units, underlying_units);
            Ok(Funding {
                total_units,
                underlying_units: Some(underlying_units),
                price_per_share: Some(price),
            })
        }
    }
}

fn require_vault(
    vault: Option<&dyn ShareVault>,
    mode: FundingMode,
) -> SplitResult<&dyn ShareVault> {
    vault.ok_or_else(|| {
        SplitError::Config(format!("funding mode '{}' needs a share vault", mode.name()))
    })
}

/// `floor(underlying * 10^decimals / price_per_share)`
pub fn shares_for_underlying(
    underlying_units: u128,
    price_per_share: u128,
    decimals: u32,
) -> SplitResult<u128> {
    if price_per_share == 0 {
        return Err(SplitError::InvalidInput("price per share must be positive".to_string()));
    }
    let shares = BigInt::from(underlying_units) * scale(decimals) / BigInt::from(price_per_share);
    units_from_bigint(&shares, "share amount")
}

/// `floor(shares * price_per_share / 10^decimals)`
pub fn underlying_for_shares(
    shares: u128,
    price_per_share: u128,
    decimals: u32,
) -> SplitResult<u128> {
    let underlying = BigInt::from(shares) * BigInt::from(price_per_share) / scale(decimals);
    units_from_bigint(&underlying, "underlying amount")
}

/// Check that the shares being dispersed convert back to the requested underlying.
///
/// Integer conversion can lose at most one share's worth of underlying, so
/// the reconstruction may fall short by up to `ceil(price_per_share / 10^decimals)`
/// but never exceed the request.
pub fn verify_reconstruction(
    funding: &Funding,
    dispersed_units: u128,
    decimals: u32,
) -> SplitResult<()> {
    let (Some(underlying), Some(price)) = (funding.underlying_units, funding.price_per_share) else {
        return Ok(());
    };

    if dispersed_units != funding.total_units {
        return Err(SplitError::AllocationInvariantViolation(format!(
            "dispersing {} units but {} were funded",
            dispersed_units, funding.total_units
        )));
    }

    let reconstructed = underlying_for_shares(dispersed_units, price, decimals)?;
    let scale = scale(decimals);
    let tolerance = (BigInt::from(price) + &scale - 1) / &scale;
    let shortfall = BigInt::from(underlying) - BigInt::from(reconstructed);

    if shortfall < BigInt::from(0) || shortfall > tolerance {
        return Err(SplitError::AllocationInvariantViolation(format!(
            "{} shares convert back to {} underlying units, expected {} (tolerance {})",
            dispersed_units, reconstructed, underlying, tolerance
        )));
    }

    Ok(())
}

fn scale(decimals: u32) -> BigInt {
    BigInt::from(10u32).pow(decimals)
}

/// A vault driven by a configured price; deposits are credited to an
/// in-memory share balance and measured as a balance delta.
pub struct ConfiguredVault {
    price_per_share: u128,
    decimals: u32,
    shares: Mutex<Option<u128>>,
    underlying: Mutex<Option<u128>>,
}

impl ConfiguredVault {
    pub fn new(price_per_share: u128, decimals: u32, share_balance: Option<u128>) -> Self {
        Self {
            price_per_share,
            decimals,
            shares: Mutex::new(share_balance),
            underlying: Mutex::new(None),
        }
    }

    pub fn with_underlying_balance(mut self, underlying_balance: Option<u128>) -> Self {
        self.underlying = Mutex::new(underlying_balance);
        self
    }
}

#[async_trait]
impl ShareVault for ConfiguredVault {
    async fn price_per_share(&self) -> SplitResult<u128> {
        Ok(self.price_per_share)
    }

    fn decimals(&self) -> u32 {
        self.decimals
    }

    async fn deposit(&self, underlying_units: u128) -> SplitResult<u128> {
        let mut underlying = self.underlying.lock().await;
        let remaining = match *underlying {
            Some(balance) => Some(balance.checked_sub(underlying_units).ok_or_else(|| {
                SplitError::InvalidInput(format!(
                    "underlying balance {} cannot cover a deposit of {}",
                    balance, underlying_units
                ))
            })?),
            None => None,
        };

        let mut shares = self.shares.lock().await;
        let before = shares.unwrap_or(0);
        let minted = shares_for_underlying(underlying_units, self.price_per_share, self.decimals)?;
        let after = before
            .checked_add(minted)
            .ok_or_else(|| SplitError::InvalidInput("share balance overflows".to_string()))?;

        // Both balances move together or not at all
        *underlying = remaining;
        *shares = Some(after);
        Ok(after - before)
    }

    async fn share_balance(&self) -> SplitResult<Option<u128>> {
        Ok(*self.shares.lock().await)
    }

    async fn underlying_balance(&self) -> SplitResult<Option<u128>> {
        Ok(*self.underlying.lock().await)
    }
}
