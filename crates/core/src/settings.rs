//! Store settings edited from the admin.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::totals::DEFAULT_TAX_RATE;
use crate::types::Price;

/// Validation failures for settings forms.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("tax rate must be between 0% and 100%")]
    TaxRateOutOfRange,
    #[error("{0} must be a valid amount")]
    InvalidAmount(&'static str),
}

/// Search engine metadata for the storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeoSettings {
    pub site_title: String,
    pub meta_description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub og_image: Option<String>,
    #[serde(default)]
    pub allow_indexing: bool,
}

impl SeoSettings {
    pub const MAX_TITLE: usize = 70;
    pub const MAX_DESCRIPTION: usize = 160;

    /// Split a comma-separated keyword list.
    #[must_use]
    pub fn parse_keywords(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// # Errors
    ///
    /// Returns the first field that is missing or too long.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.site_title.trim().is_empty() {
            return Err(SettingsError::Required("Site title"));
        }
        if self.site_title.chars().count() > Self::MAX_TITLE {
            return Err(SettingsError::TooLong {
                field: "Site title",
                max: Self::MAX_TITLE,
            });
        }
        if self.meta_description.chars().count() > Self::MAX_DESCRIPTION {
            return Err(SettingsError::TooLong {
                field: "Meta description",
                max: Self::MAX_DESCRIPTION,
            });
        }
        Ok(())
    }
}

/// A shipping zone with its own flat rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingZone {
    pub name: String,
    /// ISO country codes covered by the zone.
    pub countries: Vec<String>,
    pub rate: Price,
}

/// Shipping configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingSettings {
    /// Orders at or above this subtotal ship free, when set.
    #[serde(default)]
    pub free_shipping_threshold: Option<Price>,
    pub origin_country: String,
    pub handling_days: u32,
    #[serde(default)]
    pub zones: Vec<ShippingZone>,
}

impl ShippingSettings {
    /// # Errors
    ///
    /// Returns an error if the origin country is blank.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.origin_country.trim().is_empty() {
            return Err(SettingsError::Required("Origin country"));
        }
        Ok(())
    }
}

/// Tax configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxSettings {
    /// Rate as a fraction, e.g. `0.08`.
    pub rate: Decimal,
    pub prices_include_tax: bool,
    pub charge_tax_on_shipping: bool,
    #[serde(default)]
    pub tax_id: Option<String>,
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            rate: DEFAULT_TAX_RATE,
            prices_include_tax: false,
            charge_tax_on_shipping: false,
            tax_id: None,
        }
    }
}

impl TaxSettings {
    /// Parse a percentage as typed in the admin, e.g. `8` or `8.25%`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number in `0..=100`.
    pub fn parse_percent(raw: &str) -> Result<Decimal, SettingsError> {
        let pct: Decimal = raw
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidAmount("Tax rate"))?;
        let rate = pct / Decimal::ONE_HUNDRED;
        if rate < Decimal::ZERO || rate > Decimal::ONE {
            return Err(SettingsError::TaxRateOutOfRange);
        }
        Ok(rate)
    }

    /// Rate as a percentage for display, e.g. `8`.
    #[must_use]
    pub fn percent(&self) -> Decimal {
        (self.rate * Decimal::ONE_HUNDRED).normalize()
    }

    /// # Errors
    ///
    /// Returns an error if the rate is outside `0..=1`.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.rate < Decimal::ZERO || self.rate > Decimal::ONE {
            return Err(SettingsError::TaxRateOutOfRange);
        }
        Ok(())
    }
}

/// All editable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub seo: SeoSettings,
    pub shipping: ShippingSettings,
    pub tax: TaxSettings,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_percent_parsing() {
        assert_eq!(
            TaxSettings::parse_percent("8.25%"),
            Ok(Decimal::new(825, 4))
        );
        assert_eq!(
            TaxSettings::parse_percent("150"),
            Err(SettingsError::TaxRateOutOfRange)
        );
        assert_eq!(
            TaxSettings::parse_percent("-1"),
            Err(SettingsError::TaxRateOutOfRange)
        );
        assert_eq!(
            TaxSettings::parse_percent("eight"),
            Err(SettingsError::InvalidAmount("Tax rate"))
        );
        assert_eq!(TaxSettings::default().percent(), Decimal::from(8));
    }

    #[test]
    fn test_seo_validation() {
        let mut seo = SeoSettings {
            site_title: "Meridian".to_string(),
            meta_description: "Goods for everyday".to_string(),
            keywords: SeoSettings::parse_keywords("home, , apparel "),
            og_image: None,
            allow_indexing: true,
        };
        assert_eq!(seo.keywords, vec!["home", "apparel"]);
        assert_eq!(seo.validate(), Ok(()));

        seo.site_title = "x".repeat(71);
        assert_eq!(
            seo.validate(),
            Err(SettingsError::TooLong {
                field: "Site title",
                max: 70
            })
        );
        seo.site_title = " ".to_string();
        assert_eq!(seo.validate(), Err(SettingsError::Required("Site title")));
    }
}
