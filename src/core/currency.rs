use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::member::MemberId;

/// The pivot currency every rate table is quoted against.
pub const BASE_CURRENCY: &str = "USD";

/// Number of decimal places money is rounded to at output boundaries.
pub const MONEY_SCALE: u32 = 2;

/// Display metadata for a supported currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
}

const fn info(code: &'static str, name: &'static str, symbol: &'static str) -> CurrencyInfo {
    CurrencyInfo { code, name, symbol }
}

/// Every currency a group can record expenses in. The base currency comes first.
pub const SUPPORTED_CURRENCIES: [CurrencyInfo; 26] = [
    info("USD", "US Dollar", "$"),
    info("EUR", "Euro", "\u{20ac}"),
    info("GBP", "British Pound", "\u{00a3}"),
    info("PLN", "Polish Zloty", "z\u{0142}"),
    info("CHF", "Swiss Franc", "CHF"),
    info("JPY", "Japanese Yen", "\u{00a5}"),
    info("CAD", "Canadian Dollar", "CA$"),
    info("AUD", "Australian Dollar", "A$"),
    info("CNY", "Chinese Yuan", "\u{00a5}"),
    info("INR", "Indian Rupee", "\u{20b9}"),
    info("BRL", "Brazilian Real", "R$"),
    info("MXN", "Mexican Peso", "MX$"),
    info("SEK", "Swedish Krona", "kr"),
    info("NOK", "Norwegian Krone", "kr"),
    info("DKK", "Danish Krone", "kr"),
    info("CZK", "Czech Koruna", "K\u{010d}"),
    info("HUF", "Hungarian Forint", "Ft"),
    info("RON", "Romanian Leu", "lei"),
    info("TRY", "Turkish Lira", "\u{20ba}"),
    info("THB", "Thai Baht", "\u{0e3f}"),
    info("SGD", "Singapore Dollar", "S$"),
    info("HKD", "Hong Kong Dollar", "HK$"),
    info("NZD", "New Zealand Dollar", "NZ$"),
    info("ZAR", "South African Rand", "R"),
    info("RUB", "Russian Ruble", "\u{20bd}"),
    info("KRW", "South Korean Won", "\u{20a9}"),
];

/// ISO 4217-style currency code.
///
/// Codes are case-sensitive. [`CurrencyCode::new`] accepts anything so that
/// records handed over by the storage layer are taken as-is; use
/// [`CurrencyCode::parse`] where input still needs validating.
///
/// # Examples
///
/// ```
/// use group_ledger::core::currency::CurrencyCode;
///
/// let eur: CurrencyCode = "EUR".parse().unwrap();
/// assert!(eur.is_supported());
/// assert!("eur".parse::<CurrencyCode>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The base currency, `USD`.
    pub fn base() -> Self {
        Self::new(BASE_CURRENCY)
    }

    /// Validate a code against the supported set.
    pub fn parse(code: &str) -> Result<Self, ParseCurrencyError> {
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ParseCurrencyError::Malformed(code.to_string()));
        }
        let code = Self::new(code);
        if !code.is_supported() {
            return Err(ParseCurrencyError::Unsupported(code));
        }
        Ok(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == BASE_CURRENCY
    }

    pub fn is_supported(&self) -> bool {
        self.info().is_some()
    }

    /// Display metadata, if this is a supported currency.
    pub fn info(&self) -> Option<&'static CurrencyInfo> {
        SUPPORTED_CURRENCIES.iter().find(|c| c.code == self.0)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl FromStr for CurrencyCode {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Rejected currency code at an input boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCurrencyError {
    #[error("currency code must be exactly 3 uppercase letters, got {0:?}")]
    Malformed(String),
    #[error("unsupported currency: {0}")]
    Unsupported(CurrencyCode),
}

/// Errors arising from currency conversion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FxError {
    #[error("unknown currency: {0}")]
    UnknownCurrency(CurrencyCode),
    #[error("FX rate must be positive, got {rate} for {currency}")]
    InvalidRate { currency: CurrencyCode, rate: Decimal },
    #[error("converting {amount} {from} -> {to} overflows")]
    Overflow {
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    },
    #[error("balance of {member} in {currency} overflows")]
    BalanceOverflow {
        member: MemberId,
        currency: CurrencyCode,
    },
}

/// Exchange rates quoted against a single base currency.
///
/// Each entry reads "1 unit of the base currency buys `rate` units of this
/// currency". The base currency itself is implicitly 1 and is never stored.
///
/// # Examples
///
/// ```
/// use group_ledger::core::currency::{convert, CurrencyCode, RateTable};
/// use rust_decimal_macros::dec;
///
/// let mut rates = RateTable::new(CurrencyCode::base());
/// rates.set_rate(CurrencyCode::new("EUR"), dec!(0.92)).unwrap();
///
/// let usd = convert(
///     dec!(92),
///     &CurrencyCode::new("EUR"),
///     &CurrencyCode::new("USD"),
///     &rates,
/// ).unwrap();
/// assert_eq!(usd, dec!(100.00));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    base: CurrencyCode,
    rates: HashMap<CurrencyCode, Decimal>,
}

impl RateTable {
    pub fn new(base: CurrencyCode) -> Self {
        Self {
            base,
            rates: HashMap::new(),
        }
    }

    /// Build a table from upstream quotes. Entries for the base currency are
    /// dropped; a non-positive rate fails the whole table.
    pub fn from_rates(
        base: CurrencyCode,
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
    ) -> Result<Self, FxError> {
        let mut table = Self::new(base);
        for (currency, rate) in rates {
            table.set_rate(currency, rate)?;
        }
        Ok(table)
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    /// Set the rate for `currency`. Setting the base currency is a no-op.
    pub fn set_rate(&mut self, currency: CurrencyCode, rate: Decimal) -> Result<(), FxError> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate { currency, rate });
        }
        if currency != self.base {
            self.rates.insert(currency, rate);
        }
        Ok(())
    }

    /// Rate of `currency` against the base: 1 for the base itself.
    pub fn rate(&self, currency: &CurrencyCode) -> Result<Decimal, FxError> {
        if *currency == self.base {
            return Ok(Decimal::ONE);
        }
        self.rates
            .get(currency)
            .copied()
            .ok_or_else(|| FxError::UnknownCurrency(currency.clone()))
    }

    /// Stored (non-base) entries.
    pub fn rates(&self) -> &HashMap<CurrencyCode, Decimal> {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    /// An empty table means no rates are available, not "base currency only".
    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new(CurrencyCode::base())
    }
}

/// Round a money amount to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert `amount` from one currency to another by pivoting through the
/// table's base currency.
///
/// Same-currency conversion returns `amount` untouched. Any other result is
/// rounded to cents with [`round_money`].
pub fn convert(
    amount: Decimal,
    from: &CurrencyCode,
    to: &CurrencyCode,
    rates: &RateTable,
) -> Result<Decimal, FxError> {
    if from == to {
        return Ok(amount);
    }

    let from_rate = rates.rate(from)?;
    let to_rate = rates.rate(to)?;

    let converted = amount
        .checked_div(from_rate)
        .and_then(|in_base| in_base.checked_mul(to_rate))
        .ok_or_else(|| FxError::Overflow {
            amount,
            from: from.clone(),
            to: to.clone(),
        })?;

    Ok(round_money(converted))
}

/// A conversion together with the rate it effectively applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionQuote {
    pub amount: Decimal,
    pub from: CurrencyCode,
    pub converted: Decimal,
    pub to: CurrencyCode,
}

impl ConversionQuote {
    /// `converted / amount`, or zero for a zero amount.
    pub fn effective_rate(&self) -> Decimal {
        if self.amount.is_zero() {
            return Decimal::ZERO;
        }
        self.converted / self.amount
    }
}

/// Convert and keep both sides of the conversion.
pub fn quote(
    amount: Decimal,
    from: &CurrencyCode,
    to: &CurrencyCode,
    rates: &RateTable,
) -> Result<ConversionQuote, FxError> {
    let converted = convert(amount, from, to, rates)?;
    Ok(ConversionQuote {
        amount,
        from: from.clone(),
        converted,
        to: to.clone(),
    })
}

/// Render an amount for display, e.g. `-€1,234.50`.
pub fn format_amount(amount: Decimal, currency: &CurrencyCode) -> String {
    let mut rounded = round_money(amount);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    rounded = rounded.abs();
    rounded.rescale(MONEY_SCALE);

    let digits = rounded.to_string();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let prefix = match currency.info() {
        Some(info) if info.symbol.ends_with(|c: char| c.is_alphabetic()) => {
            format!("{} ", info.symbol)
        }
        Some(info) => info.symbol.to_string(),
        None => format!("{} ", currency),
    };

    format!(
        "{}{}{}.{}",
        if negative { "-" } else { "" },
        prefix,
        grouped,
        fraction
    )
}
