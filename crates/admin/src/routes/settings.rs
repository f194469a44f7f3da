//! Store settings routes: SEO, shipping and tax.
//!
//! Each tab is a plain form. Valid input replaces the stored settings and
//! redirects back with a success message; invalid input re-renders the form
//! with what was typed and answers 422.

use askama::Template;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use meridian_core::Price;
use meridian_core::settings::{
    SeoSettings, SettingsError, ShippingSettings, ShippingZone, TaxSettings,
};

use crate::{error::AppError, filters, state::AppState};

use super::{Flash, FlashQuery, non_empty, redirect_with, render};

/// Answer a settings form: redirect on success, re-render with 422 on error.
fn respond(
    result: Result<(), SettingsError>,
    path: &str,
    page: impl FnOnce(String) -> Result<Html<String>, AppError>,
) -> Result<Response, AppError> {
    match result {
        Ok(()) => {
            tracing::info!(settings = path, "Settings updated");
            Ok(redirect_with(path, "success", "Settings saved").into_response())
        }
        Err(e) => {
            tracing::debug!(settings = path, error = %e, "Settings rejected");
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page(e.to_string())?).into_response())
        }
    }
}

// =============================================================================
// SEO
// =============================================================================

/// SEO form input.
#[derive(Debug, Default, Deserialize)]
pub struct SeoForm {
    #[serde(default)]
    pub site_title: String,
    #[serde(default)]
    pub meta_description: String,
    /// Comma-separated.
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub og_image: String,
    /// Checkbox, present only when ticked.
    pub allow_indexing: Option<String>,
}

impl SeoForm {
    fn from_settings(seo: &SeoSettings) -> Self {
        Self {
            site_title: seo.site_title.clone(),
            meta_description: seo.meta_description.clone(),
            keywords: seo.keywords.join(", "),
            og_image: seo.og_image.clone().unwrap_or_default(),
            allow_indexing: seo.allow_indexing.then(|| "on".to_string()),
        }
    }

    fn to_settings(&self) -> SeoSettings {
        SeoSettings {
            site_title: self.site_title.trim().to_string(),
            meta_description: self.meta_description.trim().to_string(),
            keywords: SeoSettings::parse_keywords(&self.keywords),
            og_image: non_empty(Some(self.og_image.clone())),
            allow_indexing: self.allow_indexing.is_some(),
        }
    }
}

/// SEO settings template.
#[derive(Template)]
#[template(path = "settings/seo.html")]
pub struct SeoTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub form: SeoForm,
    pub max_title: usize,
    pub max_description: usize,
}

fn seo_page(form: SeoForm, flash: Flash) -> Result<Html<String>, AppError> {
    render(&SeoTemplate {
        current_path: "/settings/seo".to_string(),
        flash,
        form,
        max_title: SeoSettings::MAX_TITLE,
        max_description: SeoSettings::MAX_DESCRIPTION,
    })
}

/// SEO settings page.
#[instrument(skip(state))]
pub async fn seo(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let form = SeoForm::from_settings(&state.store().await.settings().seo);
    seo_page(form, flash.into())
}

/// Update SEO settings.
#[instrument(skip(state, form))]
pub async fn update_seo(
    State(state): State<AppState>,
    Form(form): Form<SeoForm>,
) -> Result<Response, AppError> {
    let result = state.store_mut().await.update_seo(form.to_settings());
    respond(result, "/settings/seo", |error| {
        seo_page(form, Flash::new(None, Some(error)))
    })
}

// =============================================================================
// Shipping
// =============================================================================

/// Shipping form input.
#[derive(Debug, Default, Deserialize)]
pub struct ShippingForm {
    /// Blank for no free shipping.
    #[serde(default)]
    pub free_shipping_threshold: String,
    #[serde(default)]
    pub origin_country: String,
    #[serde(default)]
    pub handling_days: String,
}

impl ShippingForm {
    fn from_settings(shipping: &ShippingSettings) -> Self {
        Self {
            free_shipping_threshold: shipping
                .free_shipping_threshold
                .map(|t| t.amount().to_string())
                .unwrap_or_default(),
            origin_country: shipping.origin_country.clone(),
            handling_days: shipping.handling_days.to_string(),
        }
    }

    /// Merge the form into `current`, which supplies the zones.
    fn to_settings(&self, current: &ShippingSettings) -> Result<ShippingSettings, SettingsError> {
        let free_shipping_threshold = match self.free_shipping_threshold.trim() {
            "" => None,
            raw => Some(
                Price::parse(raw).map_err(|_| SettingsError::InvalidAmount("Free shipping threshold"))?,
            ),
        };
        let handling_days = self
            .handling_days
            .trim()
            .parse()
            .map_err(|_| SettingsError::InvalidAmount("Handling days"))?;

        Ok(ShippingSettings {
            free_shipping_threshold,
            origin_country: self.origin_country.trim().to_uppercase(),
            handling_days,
            zones: current.zones.clone(),
        })
    }
}

/// Shipping zone row.
#[derive(Debug, Clone)]
pub struct ZoneView {
    pub name: String,
    pub countries: String,
    pub rate: String,
}

impl From<&ShippingZone> for ZoneView {
    fn from(zone: &ShippingZone) -> Self {
        Self {
            name: zone.name.clone(),
            countries: zone.countries.join(", "),
            rate: zone.rate.to_string(),
        }
    }
}

/// Shipping settings template.
#[derive(Template)]
#[template(path = "settings/shipping.html")]
pub struct ShippingTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub form: ShippingForm,
    pub zones: Vec<ZoneView>,
}

fn shipping_page(
    form: ShippingForm,
    zones: Vec<ZoneView>,
    flash: Flash,
) -> Result<Html<String>, AppError> {
    render(&ShippingTemplate {
        current_path: "/settings/shipping".to_string(),
        flash,
        form,
        zones,
    })
}

/// Shipping settings page.
#[instrument(skip(state))]
pub async fn shipping(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let store = state.store().await;
    let shipping = &store.settings().shipping;
    let form = ShippingForm::from_settings(shipping);
    let zones = shipping.zones.iter().map(ZoneView::from).collect();
    drop(store);
    shipping_page(form, zones, flash.into())
}

/// Update shipping settings.
#[instrument(skip(state, form))]
pub async fn update_shipping(
    State(state): State<AppState>,
    Form(form): Form<ShippingForm>,
) -> Result<Response, AppError> {
    let mut store = state.store_mut().await;
    let zones: Vec<ZoneView> = store
        .settings()
        .shipping
        .zones
        .iter()
        .map(ZoneView::from)
        .collect();
    let result = form
        .to_settings(&store.settings().shipping)
        .and_then(|shipping| store.update_shipping(shipping));
    drop(store);

    respond(result, "/settings/shipping", |error| {
        shipping_page(form, zones, Flash::new(None, Some(error)))
    })
}

// =============================================================================
// Tax
// =============================================================================

/// Tax form input.
#[derive(Debug, Default, Deserialize)]
pub struct TaxForm {
    /// Percentage, e.g. `8` or `8.25%`.
    #[serde(default)]
    pub rate: String,
    pub prices_include_tax: Option<String>,
    pub charge_tax_on_shipping: Option<String>,
    #[serde(default)]
    pub tax_id: String,
}

impl TaxForm {
    fn from_settings(tax: &TaxSettings) -> Self {
        Self {
            rate: tax.percent().to_string(),
            prices_include_tax: tax.prices_include_tax.then(|| "on".to_string()),
            charge_tax_on_shipping: tax.charge_tax_on_shipping.then(|| "on".to_string()),
            tax_id: tax.tax_id.clone().unwrap_or_default(),
        }
    }

    fn to_settings(&self) -> Result<TaxSettings, SettingsError> {
        Ok(TaxSettings {
            rate: TaxSettings::parse_percent(&self.rate)?,
            prices_include_tax: self.prices_include_tax.is_some(),
            charge_tax_on_shipping: self.charge_tax_on_shipping.is_some(),
            tax_id: non_empty(Some(self.tax_id.clone())),
        })
    }
}

/// Tax settings template.
#[derive(Template)]
#[template(path = "settings/tax.html")]
pub struct TaxTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub form: TaxForm,
}

fn tax_page(form: TaxForm, flash: Flash) -> Result<Html<String>, AppError> {
    render(&TaxTemplate {
        current_path: "/settings/tax".to_string(),
        flash,
        form,
    })
}

/// Tax settings page.
#[instrument(skip(state))]
pub async fn tax(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let form = TaxForm::from_settings(&state.store().await.settings().tax);
    tax_page(form, flash.into())
}

/// Update tax settings.
#[instrument(skip(state, form))]
pub async fn update_tax(
    State(state): State<AppState>,
    Form(form): Form<TaxForm>,
) -> Result<Response, AppError> {
    let result = match form.to_settings() {
        Ok(tax) => state.store_mut().await.update_tax(tax),
        Err(e) => Err(e),
    };
    respond(result, "/settings/tax", |error| {
        tax_page(form, Flash::new(None, Some(error)))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_seo_form_round_trip() {
        let seo = SeoSettings {
            site_title: "Meridian".to_string(),
            meta_description: "Everyday goods".to_string(),
            keywords: vec!["linen".to_string(), "knitwear".to_string()],
            og_image: None,
            allow_indexing: true,
        };
        let form = SeoForm::from_settings(&seo);
        assert_eq!(form.keywords, "linen, knitwear");
        assert_eq!(form.to_settings(), seo);
    }

    #[test]
    fn test_tax_form_rejects_out_of_range() {
        let form = TaxForm {
            rate: "120".to_string(),
            ..TaxForm::default()
        };
        assert_eq!(form.to_settings(), Err(SettingsError::TaxRateOutOfRange));

        let form = TaxForm {
            rate: "8.25%".to_string(),
            charge_tax_on_shipping: Some("on".to_string()),
            ..TaxForm::default()
        };
        let tax = form.to_settings().unwrap();
        assert_eq!(tax.rate, Decimal::new(825, 4));
        assert!(tax.charge_tax_on_shipping && !tax.prices_include_tax);
    }

    #[test]
    fn test_shipping_form_keeps_zones() {
        let current = ShippingSettings {
            free_shipping_threshold: None,
            origin_country: "US".to_string(),
            handling_days: 1,
            zones: vec![ShippingZone {
                name: "Domestic".to_string(),
                countries: vec!["US".to_string()],
                rate: Price::parse("4.99").unwrap(),
            }],
        };
        let form = ShippingForm {
            free_shipping_threshold: "75".to_string(),
            origin_country: " ca ".to_string(),
            handling_days: "2".to_string(),
        };
        let updated = form.to_settings(&current).unwrap();
        assert_eq!(updated.origin_country, "CA");
        assert_eq!(updated.zones, current.zones);
        assert_eq!(
            updated.free_shipping_threshold,
            Some(Price::parse("75").unwrap())
        );

        let bad = ShippingForm {
            handling_days: "soon".to_string(),
            ..form
        };
        assert!(bad.to_settings(&current).is_err());
    }
}
