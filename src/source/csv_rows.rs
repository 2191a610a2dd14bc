use lazy_static::lazy_static;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Num, Zero};
use regex::Regex;
use serde::Deserialize;

use crate::error::{SplitError, SplitResult};
use crate::models::ContributorVote;

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"^(\d+)(?:\.(\d+))?$").unwrap();
    static ref FRACTION: Regex = Regex::new(r"^(\d+)/(\d+)$").unwrap();
    static ref DIGITS: Regex = Regex::new(r"^\d+$").unwrap();
}

// Only the columns the round needs; anything else in the export is ignored.
// Exports carry the id as `id`, `No.` or both; `id` wins when both are present.
#[derive(Debug, Deserialize)]
struct VoteRow {
    id: Option<String>,
    #[serde(rename = "No.")]
    number: Option<String>,
    address: String,
    sent: String,
    received: String,
}

/// Parse a vote export into contributor records, keeping row order.
pub fn parse_vote_csv(text: &str) -> SplitResult<Vec<ContributorVote>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut votes = Vec::new();
    for (line, row) in reader.deserialize::<VoteRow>().enumerate() {
        let row = row?;
        votes.push(parse_row(row).map_err(|e| match e {
            SplitError::InvalidInput(msg) => {
                SplitError::InvalidInput(format!("row {}: {}", line + 1, msg))
            }
            other => other,
        })?);
    }

    Ok(votes)
}

fn parse_row(row: VoteRow) -> SplitResult<ContributorVote> {
    let id = row
        .id
        .filter(|id| !id.is_empty())
        .or(row.number.filter(|number| !number.is_empty()))
        .ok_or_else(|| SplitError::InvalidInput("missing contributor id".to_string()))?;
    if row.address.is_empty() {
        return Err(SplitError::InvalidInput(format!("contributor {} has no address", id)));
    }

    let sent = parse_sent(&row.sent).ok_or_else(|| {
        SplitError::InvalidInput(format!(
            "contributor {} has invalid sent count '{}'",
            id, row.sent
        ))
    })?;
    let received = parse_received(&row.received)
        .map_err(|msg| SplitError::InvalidInput(format!("contributor {}: {}", id, msg)))?;

    Ok(ContributorVote::new(id, row.address, sent, received))
}

// Plain digits only, the same shape `parse_received` accepts for whole numbers
fn parse_sent(text: &str) -> Option<u64> {
    if !DIGITS.is_match(text) {
        return None;
    }
    text.parse::<u64>().ok()
}

/// Parse a non-negative vote count as an exact rational.
///
/// Accepts plain integers (`12`), decimals (`12.25`) and fractions (`49/4`).
/// No floating point is involved, so `0.1` is exactly one tenth.
pub fn parse_received(text: &str) -> Result<BigRational, String> {
    let text = text.trim();

    if let Some(caps) = DECIMAL.captures(text) {
        let whole = &caps[1];
        let fraction = caps.get(2).map_or("", |m| m.as_str());
        let digits = format!("{}{}", whole, fraction);
        let numer = BigInt::from_str_radix(&digits, 10).map_err(|e| e.to_string())?;
        let denom = BigInt::from(10u32).pow(fraction.len() as u32);
        return Ok(BigRational::new(numer, denom));
    }

    if let Some(caps) = FRACTION.captures(text) {
        let numer = BigInt::from_str_radix(&caps[1], 10).map_err(|e| e.to_string())?;
        let denom = BigInt::from_str_radix(&caps[2], 10).map_err(|e| e.to_string())?;
        if denom.is_zero() {
            return Err(format!("received votes '{}' has a zero denominator", text));
        }
        return Ok(BigRational::new(numer, denom));
    }

    Err(format!("received votes '{}' is not a non-negative number", text))
}
