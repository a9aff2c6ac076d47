//! The balance and settlement engine.
//!
//! - **balances** — fold expenses and settlements into per-member balances
//! - **suggestions** — greedy debtor/creditor matching
//! - **pairwise** — what one member owes another, from the raw records
//! - **summary** — balances and suggestions bundled for a group

pub mod balances;
pub mod pairwise;
pub mod suggestions;
pub mod summary;
