//! Share calculation for new expenses.
//!
//! Splits are computed once, when an expense is recorded; the balance engine
//! only ever sees the resulting [`Share`]s.

use crate::core::currency::round_money;
use crate::core::expense::Share;
use crate::core::member::MemberId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest gap tolerated between the sum of shares and the expense total.
pub const SHARE_SUM_TOLERANCE: Decimal = dec!(0.02);

/// How an expense total is divided among members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "members", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SplitRule {
    /// Everyone pays the same, rounded to cents.
    Equal(Vec<MemberId>),
    /// Each member pays a percentage (0–100) of the total.
    Percentage(Vec<(MemberId, Decimal)>),
    /// Amounts are given explicitly.
    Exact(Vec<(MemberId, Decimal)>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("an expense needs at least one participant")]
    NoParticipants,
    #[error("percentage for {member} must be within 0..=100, got {percentage}")]
    InvalidPercentage { member: MemberId, percentage: Decimal },
    #[error("share for {member} must not be negative, got {amount}")]
    NegativeShare { member: MemberId, amount: Decimal },
    #[error("shares sum to {shares}, expected {total}")]
    SharesDoNotSumToTotal { total: Decimal, shares: Decimal },
}

/// Compute the shares of `total` under `rule`.
///
/// # Examples
///
/// ```
/// use group_ledger::core::split::{compute_shares, SplitRule};
/// use group_ledger::core::member::MemberId;
/// use rust_decimal_macros::dec;
///
/// let shares = compute_shares(
///     dec!(90),
///     &SplitRule::Equal(vec![MemberId::new("a"), MemberId::new("b"), MemberId::new("c")]),
/// ).unwrap();
/// assert!(shares.iter().all(|s| s.amount == dec!(30)));
/// ```
pub fn compute_shares(total: Decimal, rule: &SplitRule) -> Result<Vec<Share>, SplitError> {
    let shares = match rule {
        SplitRule::Equal(members) => {
            if members.is_empty() {
                return Err(SplitError::NoParticipants);
            }
            let each = round_money(total / Decimal::from(members.len()));
            members
                .iter()
                .map(|m| Share::new(m.clone(), each))
                .collect::<Vec<_>>()
        }
        SplitRule::Percentage(entries) => {
            if entries.is_empty() {
                return Err(SplitError::NoParticipants);
            }
            let mut shares = Vec::with_capacity(entries.len());
            for (member, percentage) in entries {
                if *percentage < Decimal::ZERO || *percentage > Decimal::ONE_HUNDRED {
                    return Err(SplitError::InvalidPercentage {
                        member: member.clone(),
                        percentage: *percentage,
                    });
                }
                let amount = round_money(total * percentage / Decimal::ONE_HUNDRED);
                shares.push(Share::new(member.clone(), amount));
            }
            shares
        }
        SplitRule::Exact(entries) => {
            if entries.is_empty() {
                return Err(SplitError::NoParticipants);
            }
            let mut shares = Vec::with_capacity(entries.len());
            for (member, amount) in entries {
                if *amount < Decimal::ZERO {
                    return Err(SplitError::NegativeShare {
                        member: member.clone(),
                        amount: *amount,
                    });
                }
                shares.push(Share::new(member.clone(), *amount));
            }
            shares
        }
    };

    let sum: Decimal = shares.iter().map(|s| s.amount).sum();
    if (sum - total).abs() > SHARE_SUM_TOLERANCE {
        return Err(SplitError::SharesDoNotSumToTotal { total, shares: sum });
    }

    Ok(shares)
}
