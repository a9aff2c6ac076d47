use crate::core::currency::CurrencyCode;
use crate::core::member::MemberId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A record read from storage or JSON that breaks a record invariant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("{kind} amount must be positive, got {amount}")]
    NonPositiveAmount { kind: &'static str, amount: Decimal },
}

fn positive(kind: &'static str, amount: Decimal) -> Result<Decimal, RecordError> {
    if amount > Decimal::ZERO {
        Ok(amount)
    } else {
        Err(RecordError::NonPositiveAmount { kind, amount })
    }
}

/// One member's portion of an expense, in the expense's currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub member: MemberId,
    pub amount: Decimal,
}

impl Share {
    pub fn new(member: MemberId, amount: Decimal) -> Self {
        Self { member, amount }
    }
}

/// A shared expense: one member paid, several members owe a share.
///
/// The shares are taken as recorded. Whether they sum to the total is checked
/// when the expense is written (see [`crate::core::split`]), not here.
///
/// # Examples
///
/// ```
/// use group_ledger::core::expense::{ExpenseRecord, Share};
/// use group_ledger::core::member::MemberId;
/// use group_ledger::core::currency::CurrencyCode;
/// use rust_decimal_macros::dec;
///
/// let dinner = ExpenseRecord::new(
///     MemberId::new("alice"),
///     dec!(90),
///     CurrencyCode::new("EUR"),
///     vec![
///         Share::new(MemberId::new("alice"), dec!(30)),
///         Share::new(MemberId::new("bob"), dec!(30)),
///         Share::new(MemberId::new("carol"), dec!(30)),
///     ],
/// );
///
/// assert_eq!(dinner.share_of(&MemberId::new("bob")), Some(dec!(30)));
/// ```
///
/// Deserializing goes through the same positive-amount check as the
/// constructors and fails instead of panicking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ExpenseRow")]
pub struct ExpenseRecord {
    id: Uuid,
    payer: MemberId,
    /// Total paid. Must be positive.
    amount: Decimal,
    currency: CurrencyCode,
    shares: Vec<Share>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expense_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ExpenseRow {
    id: Uuid,
    payer: MemberId,
    amount: Decimal,
    currency: CurrencyCode,
    shares: Vec<Share>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    expense_date: Option<DateTime<Utc>>,
}

impl TryFrom<ExpenseRow> for ExpenseRecord {
    type Error = RecordError;

    fn try_from(row: ExpenseRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            payer: row.payer,
            amount: positive("expense", row.amount)?,
            currency: row.currency,
            shares: row.shares,
            description: row.description,
            expense_date: row.expense_date,
        })
    }
}

impl ExpenseRecord {
    /// Create a new expense with a fresh id.
    ///
    /// # Panics
    ///
    /// Panics if `amount` is not positive.
    pub fn new(
        payer: MemberId,
        amount: Decimal,
        currency: CurrencyCode,
        shares: Vec<Share>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), payer, amount, currency, shares)
    }

    /// Create an expense with a known id, e.g. one loaded from storage.
    pub fn with_id(
        id: Uuid,
        payer: MemberId,
        amount: Decimal,
        currency: CurrencyCode,
        shares: Vec<Share>,
    ) -> Self {
        assert!(
            amount > Decimal::ZERO,
            "Expense amount must be positive, got {}",
            amount
        );
        Self {
            id,
            payer,
            amount,
            currency,
            shares,
            description: None,
            expense_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_expense_date(mut self, date: DateTime<Utc>) -> Self {
        self.expense_date = Some(date);
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn payer(&self) -> &MemberId {
        &self.payer
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn expense_date(&self) -> Option<DateTime<Utc>> {
        self.expense_date
    }

    /// Total share held by `member`, or `None` if they hold no share.
    pub fn share_of(&self, member: &MemberId) -> Option<Decimal> {
        let mut held = self.shares.iter().filter(|s| &s.member == member).peekable();
        held.peek()?;
        Some(held.map(|s| s.amount).sum())
    }
}

/// Money that has already moved directly from one member to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SettlementRow")]
pub struct SettlementRecord {
    payer: MemberId,
    receiver: MemberId,
    amount: Decimal,
    currency: CurrencyCode,
}

#[derive(Deserialize)]
struct SettlementRow {
    payer: MemberId,
    receiver: MemberId,
    amount: Decimal,
    currency: CurrencyCode,
}

impl TryFrom<SettlementRow> for SettlementRecord {
    type Error = RecordError;

    fn try_from(row: SettlementRow) -> Result<Self, Self::Error> {
        Ok(Self {
            payer: row.payer,
            receiver: row.receiver,
            amount: positive("settlement", row.amount)?,
            currency: row.currency,
        })
    }
}

impl SettlementRecord {
    /// # Panics
    ///
    /// Panics if `amount` is not positive.
    pub fn new(
        payer: MemberId,
        receiver: MemberId,
        amount: Decimal,
        currency: CurrencyCode,
    ) -> Self {
        assert!(
            amount > Decimal::ZERO,
            "Settlement amount must be positive, got {}",
            amount
        );
        Self {
            payer,
            receiver,
            amount,
            currency,
        }
    }

    pub fn payer(&self) -> &MemberId {
        &self.payer
    }

    pub fn receiver(&self) -> &MemberId {
        &self.receiver
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }
}

/// Every expense and settlement recorded for one group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRecords {
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub settlements: Vec<SettlementRecord>,
}

impl GroupRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_expense(&mut self, expense: ExpenseRecord) {
        self.expenses.push(expense);
    }

    pub fn add_settlement(&mut self, settlement: SettlementRecord) {
        self.settlements.push(settlement);
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty() && self.settlements.is_empty()
    }

    /// All unique members referenced by any record.
    pub fn members(&self) -> Vec<MemberId> {
        let mut members: Vec<MemberId> = self
            .expenses
            .iter()
            .flat_map(|e| {
                std::iter::once(e.payer().clone()).chain(e.shares().iter().map(|s| s.member.clone()))
            })
            .chain(
                self.settlements
                    .iter()
                    .flat_map(|s| vec![s.payer().clone(), s.receiver().clone()]),
            )
            .collect();
        members.sort();
        members.dedup();
        members
    }

    /// All unique currencies referenced by any record.
    pub fn currencies(&self) -> Vec<CurrencyCode> {
        let mut currencies: Vec<CurrencyCode> = self
            .expenses
            .iter()
            .map(|e| e.currency().clone())
            .chain(self.settlements.iter().map(|s| s.currency().clone()))
            .collect();
        currencies.sort();
        currencies.dedup();
        currencies
    }
}
