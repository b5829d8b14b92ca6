//! Value objects shared across the storefront domain.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() {
            return Err(SkuError::Empty);
        }
        if value.len() > 50 {
            return Err(SkuError::TooLong);
        }
        Ok(Self(value))
    }

    /// Generates a catalog SKU in the `ABY-` series used by the shop.
    pub fn generate() -> Self {
        Self(format!("ABY-{:06}", rand::random::<u32>() % 1_000_000))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum SkuError {
    Empty,
    TooLong,
}
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "SKU empty"),
            Self::TooLong => write!(f, "SKU too long"),
        }
    }
}

/// Money value object. The shop trades in a single currency (SAR), so the
/// amount is the whole state; formatting picks the currency marker per language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn from_major(units: i64) -> Self {
        Self(Decimal::new(units, 0))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn add(&self, other: Money) -> Money {
        Money(self.0 + other.0)
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Money(self.0 * Decimal::from(qty))
    }

    /// Applies a percentage discount, rounding to halalas (2 dp).
    pub fn discounted(&self, percent: u32) -> Money {
        if percent == 0 {
            return *self;
        }
        let factor = Decimal::new(100 - percent.min(100) as i64, 2);
        Money((self.0 * factor).round_dp(2))
    }

    pub fn round_dp(&self, dp: u32) -> Money {
        Money(self.0.round_dp(dp))
    }

    /// Amount with the localized riyal marker, e.g. `299.00 SAR` / `299.00 ر.س`.
    pub fn display(&self, language: Language) -> String {
        match language {
            Language::Ar => format!("{:.2} ر.س", self.0),
            Language::En => format!("{:.2} SAR", self.0),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Storefront language. Arabic is the default to match the shop's audience.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl Language {
    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Ar)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::En => "en",
        }
    }
}

/// A name or description carried in both storefront languages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bilingual {
    pub ar: String,
    pub en: String,
}

impl Bilingual {
    pub fn new(ar: impl Into<String>, en: impl Into<String>) -> Self {
        Self { ar: ar.into(), en: en.into() }
    }

    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Ar => &self.ar,
            Language::En => &self.en,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() {
        let sku = Sku::new("aby-001").unwrap();
        assert_eq!(sku.as_str(), "ABY-001");
        assert!(Sku::new("   ").is_err());
    }

    #[test]
    fn test_money_discount() {
        let price = Money::from_major(400);
        assert_eq!(price.discounted(10).amount(), Decimal::new(36000, 2));
        assert_eq!(price.discounted(0), price);
    }

    #[test]
    fn test_money_display() {
        let price = Money::from_major(299);
        assert_eq!(price.display(Language::En), "299.00 SAR");
        assert!(price.display(Language::Ar).contains("ر.س"));
    }

    #[test]
    fn test_bilingual_lookup() {
        let name = Bilingual::new("عباية سوداء", "Black Abaya");
        assert_eq!(name.get(Language::En), "Black Abaya");
        assert_eq!(name.get(Language::Ar), "عباية سوداء");
    }
}
