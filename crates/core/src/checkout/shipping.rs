//! Shipping options offered at checkout.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// A fixed-price shipping tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingOption {
    #[default]
    Standard,
    Express,
    Overnight,
}

impl ShippingOption {
    /// All tiers, cheapest first.
    pub const ALL: &'static [Self] = &[Self::Standard, Self::Express, Self::Overnight];

    /// Form and URL value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Overnight => "overnight",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard Shipping",
            Self::Express => "Express Shipping",
            Self::Overnight => "Overnight Shipping",
        }
    }

    /// Delivery estimate shown next to the price.
    #[must_use]
    pub const fn estimate(self) -> &'static str {
        match self {
            Self::Standard => "5-7 business days",
            Self::Express => "2-3 business days",
            Self::Overnight => "Next business day",
        }
    }

    /// Flat price of the tier.
    #[must_use]
    pub fn price(self) -> Price {
        match self {
            Self::Standard => Price::from_cents(499),
            Self::Express => Price::from_cents(999),
            Self::Overnight => Price::from_cents(1999),
        }
    }
}

impl fmt::Display for ShippingOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShippingOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|option| option.as_str() == s)
            .ok_or_else(|| format!("invalid shipping option: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_tier_prices() {
        assert_eq!(ShippingOption::Standard.price().display(), "$4.99");
        assert_eq!(ShippingOption::Express.price().display(), "$9.99");
        assert_eq!(ShippingOption::Overnight.price().display(), "$19.99");
    }

    #[test]
    fn test_parse() {
        assert_eq!("express".parse::<ShippingOption>(), Ok(ShippingOption::Express));
        assert!("drone".parse::<ShippingOption>().is_err());
    }
}
