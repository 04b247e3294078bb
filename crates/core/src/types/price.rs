//! Type-safe price representation using decimal arithmetic.
//!
//! Marche sells in Franc CFA, which has no minor unit in practice, so
//! amounts are whole `Decimal` values and display formatting groups
//! thousands the French way: `14 950 FCFA`.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create an XOF (FCFA) price from a whole amount.
    #[must_use]
    pub fn fcfa(amount: i64) -> Self {
        Self::new(Decimal::from(amount), CurrencyCode::XOF)
    }

    /// A zero price in the given currency.
    #[must_use]
    pub fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Format for display (e.g., `14 950 FCFA`, `$19.99`).
    #[must_use]
    pub fn display(&self) -> String {
        match self.currency_code {
            CurrencyCode::XOF => format!("{} FCFA", group_thousands(self.amount)),
            code => format!("{}{:.2}", code.symbol(), self.amount),
        }
    }

    /// Percentage saved relative to `original`, rounded to the nearest
    /// whole percent. Returns `None` when `original` is not strictly
    /// positive or the currencies differ.
    #[must_use]
    pub fn discount_percent(&self, original: &Self) -> Option<u32> {
        if self.currency_code != original.currency_code || original.amount <= Decimal::ZERO {
            return None;
        }
        let ratio = (original.amount - self.amount) / original.amount * Decimal::from(100);
        ratio.round().to_u32()
    }
}

/// Group a whole decimal amount by thousands with spaces (fr-FR style).
fn group_thousands(amount: Decimal) -> String {
    let rounded = amount.round();
    let raw = rounded.abs().to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    if rounded.is_sign_negative() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// West African CFA franc - the marketplace's primary currency.
    #[default]
    XOF,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::XOF => "FCFA",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// ISO 4217 code string.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::XOF => "XOF",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fcfa_display_groups_thousands() {
        assert_eq!(Price::fcfa(14950).display(), "14 950 FCFA");
        assert_eq!(Price::fcfa(950).display(), "950 FCFA");
        assert_eq!(Price::fcfa(1_250_000).display(), "1 250 000 FCFA");
        assert_eq!(Price::fcfa(0).display(), "0 FCFA");
    }

    #[test]
    fn test_usd_display() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$19.99");
    }

    #[test]
    fn test_discount_percent() {
        let current = Price::fcfa(150);
        let original = Price::fcfa(170);
        // (170 - 150) / 170 = 11.76% -> 12
        assert_eq!(current.discount_percent(&original), Some(12));
    }

    #[test]
    fn test_discount_percent_rejects_mismatched_currency() {
        let current = Price::fcfa(150);
        let original = Price::new(Decimal::from(170), CurrencyCode::USD);
        assert_eq!(current.discount_percent(&original), None);
    }

    #[test]
    fn test_discount_percent_rejects_zero_original() {
        let current = Price::fcfa(150);
        assert_eq!(current.discount_percent(&Price::fcfa(0)), None);
    }
}
