//! Persistence seam for fetched rates.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::core::currency::{CurrencyCode, FxError, RateTable};
use crate::rates::error::RateResult;

/// One persisted rate and when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRate {
    pub target: CurrencyCode,
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
}

/// Every row persisted for one base currency.
///
/// Rows age independently: a currency the upstream stopped quoting, or one
/// whose last write failed, keeps its old timestamp without making the
/// rest of the table stale.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRates {
    pub base: CurrencyCode,
    pub rows: Vec<CachedRate>,
}

impl CachedRates {
    /// Fetch time of the most recent row.
    pub fn newest(&self) -> Option<DateTime<Utc>> {
        self.rows.iter().map(|r| r.fetched_at).max()
    }

    /// The rows fetched no longer than `window` before `now`, or `None` when
    /// no row is that recent.
    pub fn fresh(&self, now: DateTime<Utc>, window: Duration) -> Option<RateTable> {
        let table = self.collect(|row| now.signed_duration_since(row.fetched_at) <= window);
        (!table.is_empty()).then_some(table)
    }

    /// Every row, however old.
    pub fn table(&self) -> RateTable {
        self.collect(|_| true)
    }

    fn collect(&self, keep: impl Fn(&CachedRate) -> bool) -> RateTable {
        let mut table = RateTable::new(self.base.clone());
        for row in self.rows.iter().filter(|r| keep(r)) {
            if let Err(e) = table.set_rate(row.target.clone(), row.rate) {
                warn!("skipping cached rate {}/{}: {}", self.base, row.target, e);
            }
        }
        table
    }
}

/// Where fetched rates are kept between calls.
///
/// Rows are keyed by base and target currency.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Every stored rate for `base`, or `None` if nothing has been stored.
    async fn read_cached(&self, base: &CurrencyCode) -> RateResult<Option<CachedRates>>;

    /// Insert or replace one rate.
    async fn upsert(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        rate: Decimal,
        fetched_at: DateTime<Utc>,
    ) -> RateResult<()>;
}

#[derive(Debug, Clone, Copy)]
struct StoredRate {
    rate: Decimal,
    fetched_at: DateTime<Utc>,
}

/// Process-local rate store.
#[derive(Debug, Default)]
pub struct InMemoryRateStore {
    rows: RwLock<HashMap<(CurrencyCode, CurrencyCode), StoredRate>>,
}

impl InMemoryRateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows across all bases.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl RateStore for InMemoryRateStore {
    async fn read_cached(&self, base: &CurrencyCode) -> RateResult<Option<CachedRates>> {
        let rows = self.rows.read().await;

        let mut cached: Vec<CachedRate> = rows
            .iter()
            .filter(|((row_base, _), _)| row_base == base)
            .map(|((_, target), stored)| CachedRate {
                target: target.clone(),
                rate: stored.rate,
                fetched_at: stored.fetched_at,
            })
            .collect();

        if cached.is_empty() {
            return Ok(None);
        }
        cached.sort_by(|a, b| a.target.cmp(&b.target));

        Ok(Some(CachedRates {
            base: base.clone(),
            rows: cached,
        }))
    }

    async fn upsert(
        &self,
        base: &CurrencyCode,
        target: &CurrencyCode,
        rate: Decimal,
        fetched_at: DateTime<Utc>,
    ) -> RateResult<()> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate {
                currency: target.clone(),
                rate,
            }
            .into());
        }

        self.rows
            .write()
            .await
            .insert((base.clone(), target.clone()), StoredRate { rate, fetched_at });
        Ok(())
    }
}
