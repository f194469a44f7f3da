//! Store settings repository.

use meridian_core::settings::{
    SeoSettings, SettingsError, ShippingSettings, StoreSettings, TaxSettings,
};

use super::AdminStore;

impl AdminStore {
    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Replace the SEO settings.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; the stored settings are unchanged.
    pub fn update_seo(&mut self, seo: SeoSettings) -> Result<(), SettingsError> {
        seo.validate()?;
        self.settings.seo = seo;
        Ok(())
    }

    /// Replace the shipping settings.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; the stored settings are unchanged.
    pub fn update_shipping(&mut self, shipping: ShippingSettings) -> Result<(), SettingsError> {
        shipping.validate()?;
        self.settings.shipping = shipping;
        Ok(())
    }

    /// Replace the tax settings.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; the stored settings are unchanged.
    pub fn update_tax(&mut self, tax: TaxSettings) -> Result<(), SettingsError> {
        tax.validate()?;
        self.settings.tax = tax;
        Ok(())
    }
}
