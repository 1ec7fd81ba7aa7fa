use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// Quote assets recognised when a pair arrives without a separator
/// (exchange form, e.g. `BTCUSDT`). Longest suffix wins.
const KNOWN_QUOTE_ASSETS: &[&str] = &[
    "FDUSD", "USDT", "USDC", "BUSD", "TUSD", "DAI", "USD", "EUR", "GBP", "TRY", "BTC", "ETH",
    "BNB",
];

const SEPARATORS: &[char] = &['/', '-', '_', ':', ' '];

const MAX_ASSET_LEN: usize = 20;

/// Normalized trading pair, e.g. `BTC/USDT`.
///
/// Every textual variant of a pair (`btc-usdt`, `BTC_USDT`, `BTCUSDT`, ...)
/// parses to the same value, and formatting a `Symbol` then parsing it again
/// yields an equal `Symbol`. This makes it safe to use as a cache key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    base: String,
    quote: String,
}

impl Symbol {
    /// Parse and normalize a raw symbol.
    pub fn parse(raw: &str) -> Result<Self, MarketDataError> {
        let upper = raw.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return Err(MarketDataError::InvalidParameter(
                "Symbol must not be empty".to_string(),
            ));
        }

        let parts: Vec<&str> = upper.split(SEPARATORS).filter(|p| !p.is_empty()).collect();
        let (base, quote) = match parts.as_slice() {
            [base, quote] => (*base, *quote),
            [joined] => split_joined(joined).ok_or_else(|| {
                MarketDataError::InvalidParameter(format!(
                    "Cannot determine quote asset of symbol '{}'",
                    raw.trim()
                ))
            })?,
            _ => {
                return Err(MarketDataError::InvalidParameter(format!(
                    "Symbol '{}' is not a BASE/QUOTE pair",
                    raw.trim()
                )))
            }
        };

        validate_asset(base, raw)?;
        validate_asset(quote, raw)?;

        Ok(Self {
            base: base.to_string(),
            quote: quote.to_string(),
        })
    }

    /// Base asset, e.g. `BTC`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Quote asset, e.g. `USDT`.
    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Pair joined with the given separator, e.g. `BTCUSDT` or `BTC-USDT`.
    pub fn joined(&self, separator: &str) -> String {
        format!("{}{}{}", self.base, separator, self.quote)
    }
}

fn split_joined(joined: &str) -> Option<(&str, &str)> {
    KNOWN_QUOTE_ASSETS
        .iter()
        .filter(|quote| joined.len() > quote.len() && joined.ends_with(*quote))
        .max_by_key(|quote| quote.len())
        .map(|quote| joined.split_at(joined.len() - quote.len()))
}

fn validate_asset(asset: &str, raw: &str) -> Result<(), MarketDataError> {
    if asset.len() > MAX_ASSET_LEN || !asset.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MarketDataError::InvalidParameter(format!(
            "Invalid symbol '{}'",
            raw.trim()
        )));
    }
    Ok(())
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

impl FromStr for Symbol {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = MarketDataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textual_variants_normalize_identically() {
        let expected = Symbol::parse("BTC/USDT").unwrap();
        for raw in [
            "btc/usdt",
            "BTC-USDT",
            "btc_usdt",
            "BTC:USDT",
            " btc usdt ",
            "BTCUSDT",
            "btcusdt",
        ] {
            assert_eq!(Symbol::parse(raw).unwrap(), expected, "variant {raw}");
        }
        assert_eq!(expected.to_string(), "BTC/USDT");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = Symbol::parse("eth-btc").unwrap();
        let twice = Symbol::parse(&once.to_string()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice.to_string(), "ETH/BTC");
    }

    #[test]
    fn test_joined_form_prefers_longest_quote() {
        let symbol = Symbol::parse("ETHFDUSD").unwrap();
        assert_eq!(symbol.base(), "ETH");
        assert_eq!(symbol.quote(), "FDUSD");

        let symbol = Symbol::parse("SOLUSDT").unwrap();
        assert_eq!(symbol.quote(), "USDT");
    }

    #[test]
    fn test_joined_helper() {
        let symbol = Symbol::parse("btc/usdt").unwrap();
        assert_eq!(symbol.joined(""), "BTCUSDT");
        assert_eq!(symbol.joined("-"), "BTC-USDT");
    }

    #[test]
    fn test_rejects_malformed_symbols() {
        for raw in ["", "   ", "BTC/USDT/ETH", "USDT", "BTC/US$", "XYZ", "A/"] {
            let err = Symbol::parse(raw).unwrap_err();
            assert!(
                matches!(err, MarketDataError::InvalidParameter(_)),
                "expected invalid parameter for {raw:?}"
            );
        }
    }

    #[test]
    fn test_rejects_overlong_asset() {
        let raw = format!("{}/USDT", "A".repeat(MAX_ASSET_LEN + 1));
        assert!(Symbol::parse(&raw).is_err());
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let symbol = Symbol::parse("btc-usdt").unwrap();
        let json = serde_json::to_string(&symbol).unwrap();
        assert_eq!(json, "\"BTC/USDT\"");

        let back: Symbol = serde_json::from_str("\"eth_usdt\"").unwrap();
        assert_eq!(back.to_string(), "ETH/USDT");
    }
}
