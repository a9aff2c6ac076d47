use crate::core::currency::round_money;
use crate::core::member::MemberId;
use crate::settlement::balances::Balance;
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Balances within this distance of zero count as settled. Absorbs the cent
/// noise left behind by repeated currency conversion.
pub const SETTLED_THRESHOLD: Decimal = dec!(0.01);

/// A payment that would move a debtor and a creditor toward zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementSuggestion {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Decimal,
}

struct Party<'a> {
    member: &'a MemberId,
    remaining: Decimal,
}

/// Suggest payments that bring every balance to zero with few transactions.
///
/// # Algorithm
///
/// Greedy matching, largest first:
///
/// 1. Split balances into debtors (below −0.01) and creditors (above 0.01);
///    anything in between is already settled.
/// 2. Sort both sides by outstanding amount, largest first. The sort is
///    stable, so ties keep their input order.
/// 3. Each debtor in turn pays the first creditor that still has more than
///    0.01 outstanding, `min(debt, credit)` at a time, until the debtor is
///    within 0.01 of zero.
///
/// Creditors are not re-sorted as they are paid down. The result is at most
/// `debtors + creditors - 1` payments, which is minimal for typical groups but
/// not in every case.
pub fn calculate_optimal_settlements(balances: &[Balance]) -> Vec<SettlementSuggestion> {
    let mut debtors: Vec<Party> = balances
        .iter()
        .filter(|b| b.amount < -SETTLED_THRESHOLD)
        .map(|b| Party {
            member: &b.member,
            remaining: b.amount.abs(),
        })
        .collect();
    let mut creditors: Vec<Party> = balances
        .iter()
        .filter(|b| b.amount > SETTLED_THRESHOLD)
        .map(|b| Party {
            member: &b.member,
            remaining: b.amount,
        })
        .collect();

    debtors.sort_by(|a, b| b.remaining.cmp(&a.remaining));
    creditors.sort_by(|a, b| b.remaining.cmp(&a.remaining));

    let mut suggestions = Vec::new();

    for debtor in &mut debtors {
        while debtor.remaining > SETTLED_THRESHOLD {
            let Some(creditor) = creditors
                .iter_mut()
                .find(|c| c.remaining > SETTLED_THRESHOLD)
            else {
                debug!(
                    "no creditor left for {} with {} outstanding",
                    debtor.member, debtor.remaining
                );
                break;
            };

            let amount = debtor.remaining.min(creditor.remaining);
            suggestions.push(SettlementSuggestion {
                from: debtor.member.clone(),
                to: creditor.member.clone(),
                amount: round_money(amount),
            });

            debtor.remaining -= amount;
            creditor.remaining -= amount;
        }
    }

    suggestions
}
