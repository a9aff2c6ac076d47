use crate::core::currency::{format_amount, CurrencyCode, FxError, RateTable};
use crate::core::expense::{ExpenseRecord, SettlementRecord};
use crate::core::member::MemberId;
use crate::settlement::balances::{calculate_balances, Balance};
use crate::settlement::suggestions::{calculate_optimal_settlements, SettlementSuggestion};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balances and suggested payments for one group, in its settlement currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    currency: CurrencyCode,
    balances: Vec<Balance>,
    suggestions: Vec<SettlementSuggestion>,
}

impl GroupSummary {
    /// Aggregate the records and derive the payments that would settle them.
    pub fn compute(
        expenses: &[ExpenseRecord],
        settlements: &[SettlementRecord],
        currency: &CurrencyCode,
        rates: &RateTable,
    ) -> Result<Self, FxError> {
        let balances = calculate_balances(expenses, settlements, currency, rates)?;
        let suggestions = calculate_optimal_settlements(&balances);
        Ok(Self {
            currency: currency.clone(),
            balances,
            suggestions,
        })
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn balances(&self) -> &[Balance] {
        &self.balances
    }

    pub fn suggestions(&self) -> &[SettlementSuggestion] {
        &self.suggestions
    }

    pub fn balance_of(&self, member: &MemberId) -> Option<Decimal> {
        self.balances
            .iter()
            .find(|b| &b.member == member)
            .map(|b| b.amount)
    }

    /// Total still owed to creditors.
    pub fn total_outstanding(&self) -> Decimal {
        self.balances
            .iter()
            .map(|b| b.amount)
            .filter(|a| *a > Decimal::ZERO)
            .sum()
    }

    /// Sum of all balances. Non-zero only through conversion rounding.
    pub fn imbalance(&self) -> Decimal {
        self.balances.iter().map(|b| b.amount).sum()
    }

    pub fn is_settled(&self) -> bool {
        self.suggestions.is_empty()
    }
}

impl std::fmt::Display for GroupSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Group Balances ({}) ===", self.currency)?;
        let mut balances: Vec<&Balance> = self.balances.iter().collect();
        balances.sort_by(|a, b| a.member.cmp(&b.member));
        for balance in balances {
            let status = if balance.amount > Decimal::ZERO {
                "is owed"
            } else if balance.amount < Decimal::ZERO {
                "owes"
            } else {
                "settled"
            };
            writeln!(
                f,
                "  {:<16} {:>14}  {}",
                balance.member.as_str(),
                format_amount(balance.amount, &self.currency),
                status
            )?;
        }
        writeln!(
            f,
            "Outstanding:     {}",
            format_amount(self.total_outstanding(), &self.currency)
        )?;

        writeln!(f, "\n=== Suggested Payments ===")?;
        if self.suggestions.is_empty() {
            writeln!(f, "  Everyone is settled up.")?;
        }
        for s in &self.suggestions {
            writeln!(
                f,
                "  {} -> {}: {}",
                s.from,
                s.to,
                format_amount(s.amount, &self.currency)
            )?;
        }
        Ok(())
    }
}
