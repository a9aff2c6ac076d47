//! Cached access to exchange rates with stale fallback.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;

use crate::core::currency::{CurrencyCode, RateTable};
use crate::rates::error::{RateError, RateResult};
use crate::rates::store::{CachedRates, RateStore};
use crate::rates::upstream::RateUpstream;

/// Anything that can hand the engine a rate table.
///
/// Never fails: an empty table means no rates are available, and conversions
/// out of the base currency will then report the missing currency.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn get_rates(&self) -> RateTable;
}

/// Configuration for [`CachingRateProvider`].
#[derive(Debug, Clone)]
pub struct RateProviderConfig {
    /// Currency all rates are quoted against.
    pub base_currency: CurrencyCode,
    /// How old cached rates may be before a refresh is attempted.
    pub staleness_window: Duration,
    /// Upper bound on a single upstream fetch.
    pub fetch_timeout: StdDuration,
}

impl Default for RateProviderConfig {
    fn default() -> Self {
        Self {
            base_currency: CurrencyCode::base(),
            staleness_window: Duration::hours(24),
            fetch_timeout: StdDuration::from_secs(10),
        }
    }
}

/// Serves rates from a store, refreshing from an upstream once they go stale.
///
/// On every call:
///
/// - cached rows fetched within the staleness window are returned as they
///   are, without older rows;
/// - otherwise the upstream is asked (bounded by `fetch_timeout`), and a
///   successful answer is written back to the store row by row;
/// - if the fetch fails, every cached row is returned however old, or an
///   empty table when nothing was ever cached.
///
/// Refreshes are single-flight. Callers that queue up behind a refresh take
/// its outcome instead of asking the upstream again, so a failing or hung
/// upstream is asked once per wave of callers and nobody waits longer than
/// one `fetch_timeout` for it.
pub struct CachingRateProvider<S, U> {
    store: S,
    upstream: U,
    config: RateProviderConfig,
    refresh: Mutex<Option<RateTable>>,
    attempts: AtomicU64,
}

impl<S: RateStore, U: RateUpstream> CachingRateProvider<S, U> {
    pub fn new(store: S, upstream: U) -> Self {
        Self::with_config(store, upstream, RateProviderConfig::default())
    }

    pub fn with_config(store: S, upstream: U, config: RateProviderConfig) -> Self {
        Self {
            store,
            upstream,
            config,
            refresh: Mutex::new(None),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RateProviderConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// A store that cannot be read is treated like an empty one.
    async fn read_cache(&self) -> Option<CachedRates> {
        match self.store.read_cached(&self.config.base_currency).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(
                    "reading cached rates for {} failed: {}",
                    self.config.base_currency, e
                );
                None
            }
        }
    }

    fn fresh(&self, cached: &Option<CachedRates>) -> Option<RateTable> {
        cached
            .as_ref()
            .and_then(|c| c.fresh(Utc::now(), self.config.staleness_window))
    }

    fn fallback(&self, cached: Option<CachedRates>) -> RateTable {
        match cached {
            Some(stale) => {
                warn!(
                    "serving rates for {} last fetched at {:?}",
                    self.config.base_currency,
                    stale.newest()
                );
                stale.table()
            }
            None => RateTable::new(self.config.base_currency.clone()),
        }
    }

    async fn fetch(&self) -> RateResult<RateTable> {
        let base = &self.config.base_currency;
        let table = tokio::time::timeout(
            self.config.fetch_timeout,
            self.upstream.fetch_latest(base),
        )
        .await
        .map_err(|_| RateError::Timeout(self.config.fetch_timeout))??;

        if table.base() != base {
            return Err(RateError::BaseMismatch {
                expected: base.clone(),
                actual: table.base().clone(),
            });
        }
        Ok(table)
    }

    async fn persist(&self, table: &RateTable) {
        let fetched_at = Utc::now();
        for (target, rate) in table.rates() {
            if let Err(e) = self
                .store
                .upsert(table.base(), target, *rate, fetched_at)
                .await
            {
                warn!("storing rate {}/{} failed: {}", table.base(), target, e);
            }
        }
    }
}

#[async_trait]
impl<S: RateStore, U: RateUpstream> RateProvider for CachingRateProvider<S, U> {
    async fn get_rates(&self) -> RateTable {
        let seen = self.attempts.load(Ordering::Acquire);

        let cached = self.read_cache().await;
        if let Some(rates) = self.fresh(&cached) {
            debug!("using cached rates for {}", self.config.base_currency);
            return rates;
        }

        let mut last_fetched = self.refresh.lock().await;

        // A refresh finished while we were waiting: take its outcome.
        if self.attempts.load(Ordering::Acquire) != seen {
            let cached = self.read_cache().await;
            if let Some(rates) = self.fresh(&cached) {
                debug!("rates for {} refreshed concurrently", self.config.base_currency);
                return rates;
            }
            return match last_fetched.as_ref() {
                Some(table) => table.clone(),
                None => {
                    debug!(
                        "concurrent refresh for {} failed, not retrying",
                        self.config.base_currency
                    );
                    self.fallback(cached)
                }
            };
        }

        let outcome = self.fetch().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        match outcome {
            Ok(table) => {
                info!(
                    "fetched {} rates for {} from {}",
                    table.len(),
                    self.config.base_currency,
                    self.upstream.name()
                );
                self.persist(&table).await;
                *last_fetched = Some(table.clone());
                table
            }
            Err(e) => {
                warn!(
                    "fetching rates for {} from {} failed: {}",
                    self.config.base_currency,
                    self.upstream.name(),
                    e
                );
                *last_fetched = None;
                self.fallback(cached)
            }
        }
    }
}
