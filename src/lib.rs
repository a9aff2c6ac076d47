//! # group-ledger
//!
//! Multi-currency balance and settlement engine for shared group expenses.
//!
//! Given the expenses a group has recorded (each paid by one member and split
//! across several), the payments members have already made to each other, and
//! a table of exchange rates, the engine computes every member's net balance
//! in one settlement currency and a short list of payments that would settle
//! the group.
//!
//! ## Architecture
//!
//! - **core** — Members, currencies and rate tables, expense/settlement records
//! - **rates** — Rate provider with a persistent cache and stale fallback
//! - **settlement** — Balance aggregation, settlement suggestions, pairwise queries
//! - **simulation** — Random ledgers for benchmarks and property tests

pub mod core;
pub mod rates;
pub mod settlement;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::currency::{convert, CurrencyCode, FxError, RateTable};
    pub use crate::core::expense::{ExpenseRecord, GroupRecords, SettlementRecord, Share};
    pub use crate::core::member::MemberId;
    pub use crate::rates::{CachingRateProvider, RateProvider, RateProviderConfig};
    pub use crate::settlement::balances::{calculate_balances, Balance};
    pub use crate::settlement::pairwise::balance_between;
    pub use crate::settlement::suggestions::{calculate_optimal_settlements, SettlementSuggestion};
    pub use crate::settlement::summary::GroupSummary;
}
