//! Value Objects for the catalog

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 50 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }

    /// Size-stock rows may leave the SKU blank; anything else is normalized.
    pub fn normalize_optional(value: &str) -> Result<String, SkuError> {
        if value.trim().is_empty() { return Ok(String::new()); }
        Sku::new(value).map(|s| s.0)
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU empty"), Self::TooLong => write!(f, "SKU too long") }
    }
}

/// URL-friendly handle derived from a display name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slug(String);

impl Slug {
    pub fn from_name(name: &str) -> Self {
        Self(name.trim().to_lowercase().split_whitespace().collect::<Vec<_>>().join("-"))
    }
    pub fn as_str(&self) -> &str { &self.0 }
    pub fn into_inner(self) -> String { self.0 }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Percentage discount taken off the listed price.
///
/// Raw form input is coerced, never rejected: blank, non-numeric and negative
/// values become 0. Fractions and values above 100 are kept as entered;
/// [`Discount::apply`] caps the effective percentage instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Discount(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Discount {
    pub const NONE: Discount = Discount(Decimal::ZERO);

    pub fn new(percent: impl Into<Decimal>) -> Self { Self(percent.into().max(Decimal::ZERO).normalize()) }

    pub fn coerce(raw: &str) -> Self {
        let raw = raw.trim();
        let parsed = raw
            .parse::<Decimal>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().filter(|v| v.is_finite()).and_then(Decimal::from_f64));
        match parsed {
            Some(v) if v > Decimal::ZERO => Self(v.normalize()),
            _ => Self::NONE,
        }
    }

    pub fn percent(&self) -> Decimal { self.0 }

    pub fn apply(&self, price: Decimal) -> Decimal {
        let pct = self.0.min(Decimal::ONE_HUNDRED);
        (price - price * pct / Decimal::ONE_HUNDRED).round_dp(2)
    }
}

impl fmt::Display for Discount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku() { let sku = Sku::new("prod-001").unwrap(); assert_eq!(sku.as_str(), "PROD-001"); }

    #[test]
    fn test_blank_sku_allowed_on_rows() {
        assert_eq!(Sku::normalize_optional("  ").unwrap(), "");
        assert_eq!(Sku::normalize_optional(" ts-red-m ").unwrap(), "TS-RED-M");
        assert_eq!(Sku::normalize_optional(&"x".repeat(51)), Err(SkuError::TooLong));
    }

    #[test]
    fn test_slug() {
        assert_eq!(Slug::from_name("Cool  T-Shirt").as_str(), "cool-t-shirt");
        assert_eq!(Slug::from_name(" Men\tShoes ").as_str(), "men-shoes");
    }

    #[test]
    fn test_discount_coercion() {
        assert_eq!(Discount::coerce("-5"), Discount::NONE);
        assert_eq!(Discount::coerce("abc"), Discount::NONE);
        assert_eq!(Discount::coerce(""), Discount::NONE);
        assert_eq!(Discount::coerce("NaN"), Discount::NONE);
        assert_eq!(Discount::coerce("42").percent(), Decimal::from(42));
        assert_eq!(Discount::coerce("150").percent(), Decimal::from(150));
        assert_eq!(Discount::coerce("12.9").percent(), Decimal::new(129, 1));
        assert_eq!(Discount::coerce("2.5e1").percent(), Decimal::from(25));
        assert_eq!(Discount::coerce("12.50").to_string(), "12.5");
    }

    #[test]
    fn test_discount_apply() {
        assert_eq!(Discount::new(10).apply(Decimal::new(2000, 2)), Decimal::new(1800, 2));
        assert_eq!(Discount::new(150).apply(Decimal::new(50, 0)), Decimal::ZERO);
        assert_eq!(Discount::NONE.apply(Decimal::new(50, 0)), Decimal::new(50, 0));
        assert_eq!(Discount::coerce("12.5").apply(Decimal::new(40, 0)), Decimal::new(35, 0));
    }

    #[test]
    fn test_discount_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Discount::coerce("12.5")).unwrap(), "12.5");
        let back: Discount = serde_json::from_str("42").unwrap();
        assert_eq!(back.percent(), Decimal::from(42));
    }
}
