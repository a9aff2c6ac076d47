use crate::core::member::MemberId;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Running net position of each member, in a single currency.
///
/// A positive position means the group owes the member (net creditor).
/// A negative position means the member owes the group (net debtor).
///
/// Members are kept in the order they were first touched, so anything built
/// from the sheet is reproducible for a given record order. A member that has
/// never been touched has no position at all, which is not the same as a
/// position of zero.
#[derive(Debug, Clone, Default)]
pub struct BalanceSheet {
    positions: Vec<(MemberId, Decimal)>,
    index: HashMap<MemberId, usize>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increase `member`'s position: the group owes them more.
    ///
    /// Returns the new position, or `None` on overflow, in which case the
    /// position is left as it was.
    pub fn credit(&mut self, member: &MemberId, amount: Decimal) -> Option<Decimal> {
        let slot = self.slot(member);
        *slot = slot.checked_add(amount)?;
        Some(*slot)
    }

    /// Decrease `member`'s position: they owe the group more.
    ///
    /// Returns the new position, or `None` on overflow.
    pub fn debit(&mut self, member: &MemberId, amount: Decimal) -> Option<Decimal> {
        let slot = self.slot(member);
        *slot = slot.checked_sub(amount)?;
        Some(*slot)
    }

    /// Net position of `member`, or `None` if they never appeared.
    pub fn position(&self, member: &MemberId) -> Option<Decimal> {
        self.index.get(member).map(|&i| self.positions[i].1)
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.index.contains_key(member)
    }

    /// All positions in first-touched order.
    pub fn positions(&self) -> &[(MemberId, Decimal)] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Sum of every position, or `None` if it overflows. Zero for a closed
    /// ledger in one currency.
    pub fn total(&self) -> Option<Decimal> {
        self.positions
            .iter()
            .try_fold(Decimal::ZERO, |acc, (_, v)| acc.checked_add(*v))
    }

    pub fn is_balanced(&self) -> bool {
        self.total() == Some(Decimal::ZERO)
    }

    fn slot(&mut self, member: &MemberId) -> &mut Decimal {
        let i = match self.index.get(member) {
            Some(&i) => i,
            None => {
                self.positions.push((member.clone(), Decimal::ZERO));
                let i = self.positions.len() - 1;
                self.index.insert(member.clone(), i);
                i
            }
        };
        &mut self.positions[i].1
    }
}

impl IntoIterator for BalanceSheet {
    type Item = (MemberId, Decimal);
    type IntoIter = std::vec::IntoIter<(MemberId, Decimal)>;

    fn into_iter(self) -> Self::IntoIter {
        self.positions.into_iter()
    }
}
