//! Foundational types: members, currencies and rate tables, expense and
//! settlement records, share splitting, and the running balance sheet.

pub mod currency;
pub mod expense;
pub mod ledger;
pub mod member;
pub mod split;
