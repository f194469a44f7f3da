//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use meridian_core::catalog::{Category, Product};
use meridian_core::marketing::Banner;

use crate::filters;
use crate::state::AppState;

/// Number of featured products on the home page.
const FEATURED_LIMIT: usize = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub site_title: String,
    pub meta_description: String,
    pub announcement: Option<Banner>,
    pub hero_banners: Vec<Banner>,
    pub categories: Vec<Category>,
    pub featured_products: Vec<Product>,
}

/// Display the home page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> HomeTemplate {
    let now = chrono::Utc::now();
    let live = state.banners().iter().filter(|b| b.is_live(now));

    HomeTemplate {
        site_title: state.seo().site_title.clone(),
        meta_description: state.seo().meta_description.clone(),
        announcement: live
            .clone()
            .find(|b| b.placement == "announcement")
            .cloned(),
        hero_banners: live.filter(|b| b.placement == "hero").cloned().collect(),
        categories: state.catalog().categories().to_vec(),
        featured_products: state
            .catalog()
            .featured(FEATURED_LIMIT)
            .into_iter()
            .cloned()
            .collect(),
    }
}
