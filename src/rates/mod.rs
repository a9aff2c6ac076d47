//! Exchange rate supply.
//!
//! - **provider** — the [`RateProvider`] contract and its caching implementation
//! - **store** — where fetched rates are persisted
//! - **upstream** — where fresh rates come from

pub mod error;
pub mod provider;
pub mod store;
pub mod upstream;

pub use error::{RateError, RateResult};
pub use provider::{CachingRateProvider, RateProvider, RateProviderConfig};
pub use store::{CachedRate, CachedRates, InMemoryRateStore, RateStore};
pub use upstream::{JsonFileRateUpstream, RateUpstream, RatesDocument, StaticRateUpstream};
