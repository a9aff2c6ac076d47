//! Rate provider behaviour when the upstream goes away.
//!
//! Fetches rates once, then ages the cache past the staleness window and
//! points the provider at a failing upstream: the old rates keep being
//! served instead of an error.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use group_ledger::core::currency::{convert, CurrencyCode, RateTable};
use group_ledger::rates::{
    CachingRateProvider, InMemoryRateStore, RateError, RateProvider, RateResult, RateStore,
    RateUpstream, StaticRateUpstream,
};
use rust_decimal_macros::dec;

struct OfflineUpstream;

#[async_trait]
impl RateUpstream for OfflineUpstream {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_latest(&self, _base: &CurrencyCode) -> RateResult<RateTable> {
        Err(RateError::Upstream {
            source_name: self.name().to_string(),
            message: "network unreachable".to_string(),
        })
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("╔══════════════════════════════════════════╗");
    println!("║  group-ledger: Stale Rate Fallback       ║");
    println!("╚══════════════════════════════════════════╝\n");

    let usd = CurrencyCode::base();
    let eur = CurrencyCode::new("EUR");

    let mut published = RateTable::default();
    published.set_rate(eur.clone(), dec!(0.92)).unwrap();
    published.set_rate(CurrencyCode::new("JPY"), dec!(149.5)).unwrap();

    // --- Cold cache: fetch and persist ---
    println!("━━━ Cold cache ━━━\n");
    let online = CachingRateProvider::new(InMemoryRateStore::new(), StaticRateUpstream::new(published));
    let rates = online.get_rates().await;
    println!("  fetched {} rates, {} rows stored", rates.len(), online.store().len().await);

    // --- Two days later, upstream offline ---
    println!("\n━━━ Two days later, upstream offline ━━━\n");
    let aged = InMemoryRateStore::new();
    let two_days_ago = Utc::now() - Duration::days(2);
    for (target, rate) in rates.rates() {
        aged.upsert(&usd, target, *rate, two_days_ago).await.unwrap();
    }

    let offline = CachingRateProvider::new(aged, OfflineUpstream);
    let stale = offline.get_rates().await;
    println!(
        "  still serving {} rates; 90 EUR = {} USD",
        stale.len(),
        convert(dec!(90), &eur, &usd, &stale).unwrap()
    );

    // --- Never fetched, upstream offline ---
    println!("\n━━━ Never fetched, upstream offline ━━━\n");
    let empty = CachingRateProvider::new(InMemoryRateStore::new(), OfflineUpstream)
        .get_rates()
        .await;
    match convert(dec!(90), &eur, &usd, &empty) {
        Ok(amount) => println!("  90 EUR = {} USD", amount),
        Err(e) => println!("  conversion failed: {}", e),
    }
}
