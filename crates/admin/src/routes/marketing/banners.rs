//! Banner management route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use meridian_core::BannerId;
use meridian_core::marketing::Banner;
use meridian_core::media::{MediaKind, MediaQuery};

use crate::{
    components::data_table::{DataTableConfig, banners_table_config},
    db::NewBanner,
    error::AppError,
    filters,
    routes::{BulkInput, Flash, FlashQuery, non_empty, parse_datetime, redirect_with, render},
    state::AppState,
};

use super::{bulk_switch, toggle_response};

const LIST_PATH: &str = "/marketing/banners";

/// Where a banner can appear on the storefront.
pub const PLACEMENTS: &[(&str, &str)] = &[("hero", "Home hero"), ("announcement", "Announcement bar")];

/// Banner row for templates.
#[derive(Debug, Clone)]
pub struct BannerRow {
    pub id: i32,
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub link: String,
    pub placement: String,
    pub schedule: String,
    pub active: bool,
    /// Showing on the storefront right now.
    pub live: bool,
}

impl BannerRow {
    fn new(banner: &Banner, now: chrono::DateTime<Utc>) -> Self {
        let fmt = |at: chrono::DateTime<Utc>| at.format("%b %-d, %Y").to_string();
        let schedule = match (banner.starts_at, banner.ends_at) {
            (None, None) => "Always".to_string(),
            (Some(start), None) => format!("From {}", fmt(start)),
            (None, Some(end)) => format!("Until {}", fmt(end)),
            (Some(start), Some(end)) => format!("{} to {}", fmt(start), fmt(end)),
        };
        Self {
            id: banner.id.as_i32(),
            title: banner.title.clone(),
            subtitle: banner.subtitle.clone().unwrap_or_default(),
            image: banner.image.clone(),
            link: banner.link.clone(),
            placement: PLACEMENTS
                .iter()
                .find(|(key, _)| *key == banner.placement)
                .map_or_else(|| banner.placement.clone(), |(_, label)| (*label).to_string()),
            schedule,
            active: banner.active,
            live: banner.is_live(now),
        }
    }
}

/// Banners list page template.
#[derive(Template)]
#[template(path = "marketing/banners/index.html")]
pub struct BannersIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub table: DataTableConfig,
    pub banners: Vec<BannerRow>,
}

/// Banners list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(flash): Query<FlashQuery>,
) -> Result<Html<String>, AppError> {
    let now = Utc::now();
    let banners = state
        .store()
        .await
        .banners()
        .iter()
        .map(|b| BannerRow::new(b, now))
        .collect();

    render(&BannersIndexTemplate {
        current_path: LIST_PATH.to_string(),
        flash: flash.into(),
        table: banners_table_config(),
        banners,
    })
}

/// Form input for creating banners.
#[derive(Debug, Default, Deserialize)]
pub struct BannerForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub placement: String,
    /// Checkbox, present only when ticked.
    pub active: Option<String>,
    #[serde(default)]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: String,
}

impl BannerForm {
    fn validate(&self) -> Result<NewBanner, String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err("Title is required".to_string());
        }
        let image = self.image.trim();
        if image.is_empty() {
            return Err("Image is required".to_string());
        }
        let link = self.link.trim();
        if !(link.starts_with('/') || link.starts_with("https://") || link.starts_with("http://")) {
            return Err("Link must be a site path like /products or a full URL".to_string());
        }
        if !PLACEMENTS.iter().any(|(key, _)| *key == self.placement) {
            return Err(format!("Unknown placement: {}", self.placement));
        }
        let starts_at = parse_datetime("Start", Some(&self.starts_at))?;
        let ends_at = parse_datetime("End", Some(&self.ends_at))?;
        if let (Some(start), Some(end)) = (starts_at, ends_at)
            && end <= start
        {
            return Err("End must be after the start".to_string());
        }

        Ok(NewBanner {
            title: title.to_string(),
            subtitle: non_empty(Some(self.subtitle.clone())),
            image: image.to_string(),
            link: link.to_string(),
            placement: self.placement.clone(),
            active: self.active.is_some(),
            starts_at,
            ends_at,
        })
    }
}

/// New banner form template.
#[derive(Template)]
#[template(path = "marketing/banners/new.html")]
pub struct BannerNewTemplate {
    pub current_path: String,
    pub form: BannerForm,
    pub placements: Vec<(&'static str, &'static str)>,
    /// Image URLs from the media library, offered as suggestions.
    pub image_urls: Vec<String>,
    pub error: Option<String>,
}

impl BannerNewTemplate {
    async fn new(state: &AppState, form: BannerForm, error: Option<String>) -> Self {
        let query = MediaQuery {
            kind: Some(MediaKind::Image),
            ..MediaQuery::default()
        };
        let image_urls = state
            .store()
            .await
            .media(&query)
            .into_iter()
            .map(|asset| asset.url.clone())
            .collect();
        Self {
            current_path: LIST_PATH.to_string(),
            form,
            placements: PLACEMENTS.to_vec(),
            image_urls,
            error,
        }
    }
}

/// New banner form handler.
#[instrument(skip(state))]
pub async fn new_banner(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let form = BannerForm {
        placement: "hero".to_string(),
        active: Some("on".to_string()),
        ..BannerForm::default()
    };
    render(&BannerNewTemplate::new(&state, form, None).await)
}

/// Create banner handler.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<BannerForm>,
) -> Result<Response, AppError> {
    match form.validate() {
        Ok(new) => {
            let id = state.store_mut().await.create_banner(new);
            tracing::info!(banner_id = %id, "Banner created");
            Ok(redirect_with(LIST_PATH, "success", &format!("Created {}", form.title.trim()))
                .into_response())
        }
        Err(message) => {
            let page = render(&BannerNewTemplate::new(&state, form, Some(message)).await)?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Switch a banner on or off.
#[instrument(skip(state, headers))]
pub async fn toggle(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<BannerId>,
) -> Result<Response, AppError> {
    let active = state.store_mut().await.toggle_banner(id)?;
    tracing::info!(banner_id = %id, active, "Banner toggled");
    toggle_response(&headers, LIST_PATH, id, "Banner", active)
}

/// Delete a banner.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<BannerId>,
) -> Result<Redirect, AppError> {
    let banner = state.store_mut().await.delete_banner(id)?;
    tracing::info!(banner_id = %id, "Banner deleted");
    Ok(redirect_with(LIST_PATH, "success", &format!("Deleted {}", banner.title)))
}

/// Bulk activate, deactivate or delete banners.
#[instrument(skip(state))]
pub async fn bulk(
    State(state): State<AppState>,
    Form(input): Form<BulkInput>,
) -> Result<Response, AppError> {
    bulk_switch(
        &state,
        &input,
        LIST_PATH,
        |store, id: BannerId, active| store.set_banner_active(id, active),
        |store, id: BannerId| store.delete_banner(id),
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> BannerForm {
        BannerForm {
            title: " Autumn ".to_string(),
            image: "/static/img/banners/summer.svg".to_string(),
            link: "/products".to_string(),
            placement: "hero".to_string(),
            ..BannerForm::default()
        }
    }

    #[test]
    fn test_valid_form() {
        let new = form().validate().unwrap();
        assert_eq!(new.title, "Autumn");
        assert_eq!(new.subtitle, None);
        assert!(!new.active);
    }

    #[test]
    fn test_rejects_bad_input() {
        let bad_link = BannerForm {
            link: "javascript:alert(1)".to_string(),
            ..form()
        };
        assert!(bad_link.validate().is_err());

        let backwards = BannerForm {
            starts_at: "2030-02-01T00:00".to_string(),
            ends_at: "2030-01-01T00:00".to_string(),
            ..form()
        };
        assert_eq!(
            backwards.validate().unwrap_err(),
            "End must be after the start"
        );

        let placement = BannerForm {
            placement: "footer".to_string(),
            ..form()
        };
        assert!(placement.validate().is_err());
    }
}
