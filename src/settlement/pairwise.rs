use crate::core::currency::{convert, round_money, CurrencyCode, FxError, RateTable};
use crate::core::expense::{ExpenseRecord, SettlementRecord};
use crate::core::member::MemberId;
use rust_decimal::Decimal;

/// How much `b` owes `a`, in `currency`, straight from the raw records.
///
/// Positive means `b` owes `a`; negative means `a` owes `b`. Only expenses
/// paid by one of the two with a share held by the other, and settlements
/// between the two, count. A payment from `a` to `b` moves the result up,
/// the same way it credits `a` in the aggregate balances. The result is
/// rounded to cents.
///
/// For a ledger that only involves `a` and `b`, this agrees with `a`'s
/// balance from [`calculate_balances`](crate::settlement::balances::calculate_balances)
/// up to per-conversion rounding.
///
/// # Examples
///
/// ```
/// use group_ledger::prelude::*;
/// use rust_decimal_macros::dec;
///
/// let usd = CurrencyCode::new("USD");
/// let (a, b) = (MemberId::new("a"), MemberId::new("b"));
/// let lunch = ExpenseRecord::new(
///     a.clone(),
///     dec!(40),
///     usd.clone(),
///     vec![Share::new(a.clone(), dec!(20)), Share::new(b.clone(), dec!(20))],
/// );
///
/// let owed = balance_between(&[lunch], &[], &a, &b, &usd, &RateTable::default()).unwrap();
/// assert_eq!(owed, dec!(20));
/// ```
pub fn balance_between(
    expenses: &[ExpenseRecord],
    settlements: &[SettlementRecord],
    a: &MemberId,
    b: &MemberId,
    currency: &CurrencyCode,
    rates: &RateTable,
) -> Result<Decimal, FxError> {
    let mut balance = Decimal::ZERO;
    let mut add = |delta: Decimal| -> Result<(), FxError> {
        balance = balance
            .checked_add(delta)
            .ok_or_else(|| FxError::BalanceOverflow {
                member: a.clone(),
                currency: currency.clone(),
            })?;
        Ok(())
    };

    for expense in expenses {
        if expense.payer() == a {
            if let Some(share) = expense.share_of(b) {
                add(convert(share, expense.currency(), currency, rates)?)?;
            }
        } else if expense.payer() == b {
            if let Some(share) = expense.share_of(a) {
                add(-convert(share, expense.currency(), currency, rates)?)?;
            }
        }
    }

    for settlement in settlements {
        if settlement.payer() == a && settlement.receiver() == b {
            add(convert(settlement.amount(), settlement.currency(), currency, rates)?)?;
        } else if settlement.payer() == b && settlement.receiver() == a {
            add(-convert(settlement.amount(), settlement.currency(), currency, rates)?)?;
        }
    }

    Ok(round_money(balance))
}
