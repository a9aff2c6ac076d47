use crate::core::currency::{convert, round_money, CurrencyCode, FxError, RateTable};
use crate::core::expense::{ExpenseRecord, SettlementRecord};
use crate::core::ledger::BalanceSheet;
use crate::core::member::MemberId;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A member's net position in the settlement currency.
///
/// Positive: the group owes this member. Negative: this member owes the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub member: MemberId,
    pub amount: Decimal,
}

impl Balance {
    pub fn new(member: MemberId, amount: Decimal) -> Self {
        Self { member, amount }
    }
}

/// Fold expenses and direct settlements into one balance per member,
/// expressed in `target`.
///
/// # Algorithm
///
/// 1. Each expense credits its payer with the converted total and debits every
///    share holder with their share, converted from the expense's currency.
/// 2. Each settlement credits the payer (their debt shrinks) and debits the
///    receiver (their credit shrinks).
/// 3. Every member seen gets a balance rounded to cents, zero balances
///    included, in first-seen order.
///
/// Any conversion failure aborts the whole computation; there are no partial
/// results.
pub fn calculate_balances(
    expenses: &[ExpenseRecord],
    settlements: &[SettlementRecord],
    target: &CurrencyCode,
    rates: &RateTable,
) -> Result<Vec<Balance>, FxError> {
    let sheet = build_sheet(expenses, settlements, target, rates)?;

    debug!(
        "aggregated {} expenses and {} settlements into {} balances in {}",
        expenses.len(),
        settlements.len(),
        sheet.len(),
        target
    );

    Ok(sheet
        .into_iter()
        .map(|(member, amount)| Balance::new(member, round_money(amount)))
        .collect())
}

/// Unrounded running totals behind [`calculate_balances`].
///
/// A position that leaves the `Decimal` range fails with
/// [`FxError::BalanceOverflow`].
pub fn build_sheet(
    expenses: &[ExpenseRecord],
    settlements: &[SettlementRecord],
    target: &CurrencyCode,
    rates: &RateTable,
) -> Result<BalanceSheet, FxError> {
    let mut sheet = BalanceSheet::new();
    let overflow = |member: &MemberId| FxError::BalanceOverflow {
        member: member.clone(),
        currency: target.clone(),
    };

    for expense in expenses {
        let paid = convert(expense.amount(), expense.currency(), target, rates)?;
        sheet
            .credit(expense.payer(), paid)
            .ok_or_else(|| overflow(expense.payer()))?;

        for share in expense.shares() {
            let owed = convert(share.amount, expense.currency(), target, rates)?;
            sheet
                .debit(&share.member, owed)
                .ok_or_else(|| overflow(&share.member))?;
        }
    }

    for settlement in settlements {
        let moved = convert(settlement.amount(), settlement.currency(), target, rates)?;
        sheet
            .credit(settlement.payer(), moved)
            .ok_or_else(|| overflow(settlement.payer()))?;
        sheet
            .debit(settlement.receiver(), moved)
            .ok_or_else(|| overflow(settlement.receiver()))?;
    }

    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expense::Share;
    use rust_decimal_macros::dec;

    fn usd() -> CurrencyCode {
        CurrencyCode::new("USD")
    }

    fn balance_of(balances: &[Balance], member: &str) -> Option<Decimal> {
        balances
            .iter()
            .find(|b| b.member.as_str() == member)
            .map(|b| b.amount)
    }

    #[test]
    fn test_single_expense_split_in_half() {
        let expenses = vec![ExpenseRecord::new(
            MemberId::new("M1"),
            dec!(100),
            usd(),
            vec![
                Share::new(MemberId::new("M1"), dec!(50)),
                Share::new(MemberId::new("M2"), dec!(50)),
            ],
        )];

        let balances = calculate_balances(&expenses, &[], &usd(), &RateTable::default()).unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balance_of(&balances, "M1"), Some(dec!(50.00)));
        assert_eq!(balance_of(&balances, "M2"), Some(dec!(-50.00)));
    }

    #[test]
    fn test_settlement_moves_balances_toward_zero() {
        let expenses = vec![ExpenseRecord::new(
            MemberId::new("A"),
            dec!(60),
            usd(),
            vec![
                Share::new(MemberId::new("A"), dec!(30)),
                Share::new(MemberId::new("B"), dec!(30)),
            ],
        )];
        let settlements = vec![SettlementRecord::new(
            MemberId::new("B"),
            MemberId::new("A"),
            dec!(20),
            usd(),
        )];

        let balances =
            calculate_balances(&expenses, &settlements, &usd(), &RateTable::default()).unwrap();
        assert_eq!(balance_of(&balances, "A"), Some(dec!(10)));
        assert_eq!(balance_of(&balances, "B"), Some(dec!(-10)));
    }

    #[test]
    fn test_share_only_member_and_zero_balance_are_emitted() {
        let expenses = vec![
            ExpenseRecord::new(
                MemberId::new("A"),
                dec!(10),
                usd(),
                vec![Share::new(MemberId::new("B"), dec!(10))],
            ),
            ExpenseRecord::new(
                MemberId::new("B"),
                dec!(10),
                usd(),
                vec![Share::new(MemberId::new("A"), dec!(10))],
            ),
        ];

        let balances = calculate_balances(&expenses, &[], &usd(), &RateTable::default()).unwrap();
        assert_eq!(balance_of(&balances, "A"), Some(Decimal::ZERO));
        assert_eq!(balance_of(&balances, "B"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_shares_convert_from_expense_currency() {
        let mut rates = RateTable::default();
        rates.set_rate(CurrencyCode::new("EUR"), dec!(0.5)).unwrap();

        let expenses = vec![ExpenseRecord::new(
            MemberId::new("A"),
            dec!(10),
            CurrencyCode::new("EUR"),
            vec![Share::new(MemberId::new("B"), dec!(10))],
        )];

        let balances = calculate_balances(&expenses, &[], &usd(), &rates).unwrap();
        assert_eq!(balance_of(&balances, "A"), Some(dec!(20)));
        assert_eq!(balance_of(&balances, "B"), Some(dec!(-20)));
    }

    #[test]
    fn test_unknown_currency_aborts() {
        let expenses = vec![
            ExpenseRecord::new(
                MemberId::new("A"),
                dec!(10),
                usd(),
                vec![Share::new(MemberId::new("B"), dec!(10))],
            ),
            ExpenseRecord::new(
                MemberId::new("A"),
                dec!(10),
                CurrencyCode::new("GBP"),
                vec![Share::new(MemberId::new("B"), dec!(10))],
            ),
        ];

        let result = calculate_balances(&expenses, &[], &usd(), &RateTable::default());
        assert_eq!(
            result,
            Err(FxError::UnknownCurrency(CurrencyCode::new("GBP")))
        );
    }

    #[test]
    fn test_empty_ledger() {
        let balances = calculate_balances(&[], &[], &usd(), &RateTable::default()).unwrap();
        assert!(balances.is_empty());
    }

    #[test]
    fn test_overflow_is_an_error_not_a_panic() {
        let huge = || {
            ExpenseRecord::new(
                MemberId::new("A"),
                Decimal::MAX,
                usd(),
                vec![Share::new(MemberId::new("B"), Decimal::MAX)],
            )
        };

        let result = calculate_balances(&[huge(), huge()], &[], &usd(), &RateTable::default());
        assert_eq!(
            result,
            Err(FxError::BalanceOverflow {
                member: MemberId::new("A"),
                currency: usd(),
            })
        );
    }
}
