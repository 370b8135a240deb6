//! Type-safe price representation.
//!
//! Prices are stored in the smallest currency unit (cents for USD) so that
//! sorting and comparison stay exact integer operations. Conversion to a
//! decimal amount only happens for display.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the smallest currency unit (e.g. cents).
    pub amount_minor: i64,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price from minor units.
    #[must_use]
    pub const fn from_minor(amount_minor: i64, currency_code: CurrencyCode) -> Self {
        Self {
            amount_minor,
            currency_code,
        }
    }

    /// Amount in the currency's standard unit (e.g. dollars, not cents).
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.amount_minor, 2)
    }

    /// Format for display (e.g. "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Currency symbol used when rendering prices.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_from_minor_units() {
        assert_eq!(Price::from_minor(19999, CurrencyCode::USD).display(), "$199.99");
        assert_eq!(Price::from_minor(2499, CurrencyCode::USD).display(), "$24.99");
        assert_eq!(Price::from_minor(500, CurrencyCode::EUR).display(), "€5.00");
        assert_eq!(Price::from_minor(7, CurrencyCode::GBP).to_string(), "£0.07");
    }

    #[test]
    fn test_amount_is_exact() {
        let price = Price::from_minor(1000, CurrencyCode::USD);
        assert_eq!(price.amount(), Decimal::new(10, 0));
    }

    #[test]
    fn test_currency_serializes_as_code() {
        let json = serde_json::to_string(&CurrencyCode::USD).unwrap();
        assert_eq!(json, "\"USD\"");
        assert_eq!(CurrencyCode::CAD.code(), "CAD");
    }
}
