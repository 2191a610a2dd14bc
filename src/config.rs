use std::env;
use std::path::PathBuf;

use crate::error::{SplitError, SplitResult};
use crate::models::FundingMode;

pub const DEFAULT_SENT_MAX: u64 = 100;
pub const DEFAULT_SHARE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    DryRun,
    JsonFile(PathBuf),
}

/// Vault settings for the rate-based funding modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultConfig {
    pub price_per_share: u128,
    pub decimals: u32,
    pub share_balance: Option<u128>,
    pub underlying_balance: Option<u128>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: String,
    pub token: String,
    pub sent_max: u64,
    pub funding: FundingMode,
    pub vault: Option<VaultConfig>,
    pub sink: SinkKind,
}

impl Config {
    pub fn from_env() -> SplitResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup, so callers and tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> SplitResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require =
            |key: &str| get(key).ok_or_else(|| SplitError::Config(format!("{} is not set", key)));

        let source = require("SPLIT_SOURCE")?;
        let token = require("SPLIT_TOKEN")?;
        let sent_max = match get("SPLIT_SENT_MAX") {
            Some(raw) => parse_number::<u64>("SPLIT_SENT_MAX", &raw)?,
            None => DEFAULT_SENT_MAX,
        };

        let mode = get("SPLIT_FUNDING_MODE").unwrap_or_else(|| "literal".to_string());
        let funding = match mode.to_ascii_lowercase().as_str() {
            "literal" => FundingMode::Literal {
                total_units: parse_number("SPLIT_TOTAL_UNITS", &require("SPLIT_TOTAL_UNITS")?)?,
            },
            "deposit" => FundingMode::Deposit {
                underlying_units: parse_number(
                    "SPLIT_UNDERLYING_UNITS",
                    &require("SPLIT_UNDERLYING_UNITS")?,
                )?,
            },
            "quote" => FundingMode::Quote {
                underlying_units: parse_number(
                    "SPLIT_UNDERLYING_UNITS",
                    &require("SPLIT_UNDERLYING_UNITS")?,
                )?,
            },
            other => {
                return Err(SplitError::Config(format!(
                    "SPLIT_FUNDING_MODE must be literal, deposit or quote, got '{}'",
                    other
                )));
            }
        };

        let vault = match funding {
            FundingMode::Literal { .. } => None,
            _ => Some(VaultConfig {
                price_per_share: parse_number(
                    "SPLIT_PRICE_PER_SHARE",
                    &require("SPLIT_PRICE_PER_SHARE")?,
                )?,
                decimals: match get("SPLIT_SHARE_DECIMALS") {
                    Some(raw) => parse_number("SPLIT_SHARE_DECIMALS", &raw)?,
                    None => DEFAULT_SHARE_DECIMALS,
                },
                share_balance: match get("SPLIT_SHARE_BALANCE") {
                    Some(raw) => Some(parse_number("SPLIT_SHARE_BALANCE", &raw)?),
                    None => None,
                },
                underlying_balance: match get("SPLIT_UNDERLYING_BALANCE") {
                    Some(raw) => Some(parse_number("SPLIT_UNDERLYING_BALANCE", &raw)?),
                    None => None,
                },
            }),
        };

        let sink = match get("SPLIT_SINK") {
            None => SinkKind::DryRun,
            Some(raw) if raw == "dry-run" => SinkKind::DryRun,
            Some(raw) => match raw.strip_prefix("json:") {
                Some(path) if !path.is_empty() => SinkKind::JsonFile(PathBuf::from(path)),
                _ => {
                    return Err(SplitError::Config(format!(
                        "SPLIT_SINK must be dry-run or json:<path>, got '{}'",
                        raw
                    )));
                }
            },
        };

        Ok(Self {
            source,
            token,
            sent_max,
            funding,
            vault,
            sink,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> SplitResult<T> {
    raw.replace('_', "")
        .parse::<T>()
        .map_err(|_| {
            SplitError::Config(format!("{} must be a non-negative integer, got '{}'", key, raw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> SplitResult<Config> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn literal_defaults() {
        let cfg = config(&[
            ("SPLIT_SOURCE", "votes.csv"),
            ("SPLIT_TOKEN", "yvYFI"),
            ("SPLIT_TOTAL_UNITS", "24_440_000_000_000_000_000"),
        ])
        .unwrap();

        assert_eq!(cfg.sent_max, 100);
        assert_eq!(cfg.funding, FundingMode::Literal { total_units: 24_440_000_000_000_000_000 });
        assert_eq!(cfg.vault, None);
        assert_eq!(cfg.sink, SinkKind::DryRun);
    }

    #[test]
    fn quote_mode_reads_vault_settings() {
        let cfg = config(&[
            ("SPLIT_SOURCE", "https://example.org/votes.csv"),
            ("SPLIT_TOKEN", "yvYFI"),
            ("SPLIT_FUNDING_MODE", "Quote"),
            ("SPLIT_UNDERLYING_UNITS", "1000"),
            ("SPLIT_PRICE_PER_SHARE", "1250"),
            ("SPLIT_SHARE_DECIMALS", "3"),
            ("SPLIT_SENT_MAX", "50"),
            ("SPLIT_SINK", "json:out/batch.json"),
        ])
        .unwrap();

        assert_eq!(cfg.funding, FundingMode::Quote { underlying_units: 1000 });
        assert_eq!(
            cfg.vault,
            Some(VaultConfig {
                price_per_share: 1250,
                decimals: 3,
                share_balance: None,
                underlying_balance: None,
            })
        );
        assert_eq!(cfg.sent_max, 50);
        assert_eq!(cfg.sink, SinkKind::JsonFile(PathBuf::from("out/batch.json")));
    }

    #[test]
    fn deposit_mode_reads_underlying_balance() {
        let cfg = config(&[
            ("SPLIT_SOURCE", "votes.csv"),
            ("SPLIT_TOKEN", "yvYFI"),
            ("SPLIT_FUNDING_MODE", "deposit"),
            ("SPLIT_UNDERLYING_UNITS", "1000"),
            ("SPLIT_PRICE_PER_SHARE", "1250"),
            ("SPLIT_UNDERLYING_BALANCE", "900"),
        ])
        .unwrap();

        assert_eq!(cfg.funding, FundingMode::Deposit { underlying_units: 1000 });
        assert_eq!(cfg.vault.map(|v| v.underlying_balance), Some(Some(900)));
    }

    #[test]
    fn rejects_missing_and_malformed_values() {
        let err = config(&[("SPLIT_TOKEN", "yvYFI")]).unwrap_err();
        assert!(matches!(err, SplitError::Config(msg) if msg.contains("SPLIT_SOURCE")));

        let err = config(&[
            ("SPLIT_SOURCE", "v.csv"),
            ("SPLIT_TOKEN", "t"),
            ("SPLIT_TOTAL_UNITS", "-1"),
        ])
        .unwrap_err();
        assert!(matches!(err, SplitError::Config(_)));

        let err = config(&[
            ("SPLIT_SOURCE", "v.csv"),
            ("SPLIT_TOKEN", "t"),
            ("SPLIT_FUNDING_MODE", "deposit"),
            ("SPLIT_UNDERLYING_UNITS", "10"),
        ])
        .unwrap_err();
        assert!(matches!(err, SplitError::Config(msg) if msg.contains("SPLIT_PRICE_PER_SHARE")));

        let err = config(&[
            ("SPLIT_SOURCE", "v.csv"),
            ("SPLIT_TOKEN", "t"),
            ("SPLIT_TOTAL_UNITS", "1"),
            ("SPLIT_SINK", "stdout"),
        ])
        .unwrap_err();
        assert!(matches!(err, SplitError::Config(_)));
    }
}
