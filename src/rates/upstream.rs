//! Sources of fresh exchange rates.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::core::currency::{CurrencyCode, RateTable};
use crate::rates::error::{RateError, RateResult};

/// A source that returns a full rate table relative to a base currency.
#[async_trait]
pub trait RateUpstream: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Fetch every rate quoted against `base`.
    async fn fetch_latest(&self, base: &CurrencyCode) -> RateResult<RateTable>;
}

/// Always answers with the same table.
#[derive(Debug, Clone)]
pub struct StaticRateUpstream {
    table: RateTable,
}

impl StaticRateUpstream {
    pub fn new(table: RateTable) -> Self {
        Self { table }
    }
}

#[async_trait]
impl RateUpstream for StaticRateUpstream {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_latest(&self, base: &CurrencyCode) -> RateResult<RateTable> {
        if self.table.base() != base {
            return Err(RateError::BaseMismatch {
                expected: base.clone(),
                actual: self.table.base().clone(),
            });
        }
        Ok(self.table.clone())
    }
}

/// The document shape published by common "latest rates" endpoints:
/// `{"base": "USD", "rates": {"EUR": 0.92, ...}}`.
#[derive(Debug, Deserialize)]
pub struct RatesDocument {
    pub base: CurrencyCode,
    pub rates: HashMap<CurrencyCode, Decimal>,
}

impl RatesDocument {
    /// Turn the document into a table, checking it is quoted against `base`.
    pub fn into_table(self, base: &CurrencyCode) -> RateResult<RateTable> {
        if &self.base != base {
            return Err(RateError::BaseMismatch {
                expected: base.clone(),
                actual: self.base,
            });
        }
        Ok(RateTable::from_rates(self.base, self.rates)?)
    }
}

/// Reads a [`RatesDocument`] from disk on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileRateUpstream {
    path: PathBuf,
}

impl JsonFileRateUpstream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RateUpstream for JsonFileRateUpstream {
    fn name(&self) -> &str {
        "json-file"
    }

    async fn fetch_latest(&self, base: &CurrencyCode) -> RateResult<RateTable> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let document: RatesDocument = serde_json::from_str(&content)?;
        document.into_table(base)
    }
}
