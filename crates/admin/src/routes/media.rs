//! Media library route handlers.
//!
//! Uploads are recorded as metadata only; the file itself is not stored and
//! every asset points at a placeholder image served from `/static`.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use meridian_core::MediaId;
use meridian_core::media::{MediaAsset, MediaKind, MediaQuery, format_bytes};

use crate::{
    components::data_table::{DataTableConfig, Page, media_table_config},
    db::NewMediaAsset,
    error::AppError,
    filters,
    state::AppState,
};

use super::{
    BulkInput, BulkOutcome, Flash, non_empty, parse_filter, products::filter_query,
    redirect_with, render, unknown_action,
};

/// Largest file accepted, in bytes.
pub const MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024;

/// Media list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct MediaListQuery {
    pub search: Option<String>,
    pub kind: Option<String>,
    pub folder: Option<String>,
    pub page: Option<usize>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Media tile for templates.
#[derive(Debug, Clone)]
pub struct MediaTile {
    pub id: i32,
    pub file_name: String,
    pub kind: &'static str,
    pub kind_label: &'static str,
    pub folder: String,
    pub url: String,
    pub alt_text: String,
    pub size: String,
    pub dimensions: Option<String>,
    pub uploaded_at: String,
}

impl From<&MediaAsset> for MediaTile {
    fn from(asset: &MediaAsset) -> Self {
        Self {
            id: asset.id.as_i32(),
            file_name: asset.file_name.clone(),
            kind: asset.kind.as_str(),
            kind_label: asset.kind.label(),
            folder: asset.folder.clone(),
            url: asset.url.clone(),
            alt_text: asset.alt_text.clone(),
            size: asset.size(),
            dimensions: asset.dimensions(),
            uploaded_at: asset.uploaded_at.format("%b %-d, %Y").to_string(),
        }
    }
}

/// Media library page template.
#[derive(Template)]
#[template(path = "media/index.html")]
pub struct MediaIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub table: DataTableConfig,
    pub page: Page<MediaTile>,
    pub filter_query: String,
    pub storage_used: String,
    pub asset_count: usize,
}

/// Media library page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<MediaListQuery>,
) -> Result<Html<String>, AppError> {
    let media_query = MediaQuery {
        search: query.search.clone(),
        kind: parse_filter::<MediaKind>(query.kind.as_deref()),
        folder: non_empty(query.folder.clone()),
    };

    let store = state.store().await;
    let tiles: Vec<MediaTile> = store
        .media(&media_query)
        .into_iter()
        .map(MediaTile::from)
        .collect();
    let table = media_table_config(&store.media_folders())
        .with_value("search", media_query.search.as_deref())
        .with_value("kind", media_query.kind.map(MediaKind::as_str))
        .with_value("folder", media_query.folder.as_deref());
    let storage_used = format_bytes(store.storage_used());
    let asset_count = store.media(&MediaQuery::default()).len();
    drop(store);

    render(&MediaIndexTemplate {
        current_path: "/media".to_string(),
        flash: Flash::new(query.success, query.error),
        filter_query: filter_query(&table),
        table,
        page: Page::paginate(tiles, query.page.unwrap_or(1), state.config().page_size),
        storage_used,
        asset_count,
    })
}

/// Form input for adding an asset.
#[derive(Debug, Default, Deserialize)]
pub struct MediaForm {
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub folder: String,
    #[serde(default)]
    pub size_bytes: String,
    #[serde(default)]
    pub alt_text: String,
}

impl MediaForm {
    fn validate(&self) -> Result<NewMediaAsset, String> {
        let file_name = self.file_name.trim();
        if file_name.is_empty() {
            return Err("File name is required".to_string());
        }
        if file_name.contains(['/', '\\']) {
            return Err("File name must not contain a path".to_string());
        }
        let size_bytes: u64 = self
            .size_bytes
            .trim()
            .parse()
            .map_err(|_| "Size must be a whole number of bytes".to_string())?;
        if size_bytes == 0 || size_bytes > MAX_UPLOAD_BYTES {
            return Err(format!(
                "Size must be between 1 byte and {}",
                format_bytes(MAX_UPLOAD_BYTES)
            ));
        }

        Ok(NewMediaAsset {
            file_name: file_name.to_string(),
            folder: self.folder.trim().to_lowercase(),
            url: placeholder_url(MediaKind::from_file_name(file_name)).to_string(),
            size_bytes,
            alt_text: self.alt_text.trim().to_string(),
        })
    }
}

/// Placeholder served for uploads, by kind.
const fn placeholder_url(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "/static/img/media/image.svg",
        MediaKind::Video => "/static/img/media/video.svg",
        MediaKind::Document => "/static/img/media/document.svg",
    }
}

/// Add asset form template.
#[derive(Template)]
#[template(path = "media/new.html")]
pub struct MediaNewTemplate {
    pub current_path: String,
    pub form: MediaForm,
    pub folders: Vec<String>,
    pub error: Option<String>,
}

async fn form_page(
    state: &AppState,
    form: MediaForm,
    error: Option<String>,
) -> Result<Html<String>, AppError> {
    let folders = state
        .store()
        .await
        .media_folders()
        .into_iter()
        .map(str::to_string)
        .collect();
    render(&MediaNewTemplate {
        current_path: "/media".to_string(),
        form,
        folders,
        error,
    })
}

/// Add asset form handler.
#[instrument(skip(state))]
pub async fn new_asset(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    form_page(&state, MediaForm::default(), None).await
}

/// Add asset handler.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<MediaForm>,
) -> Result<Response, AppError> {
    match form.validate() {
        Ok(new) => {
            let name = new.file_name.clone();
            let id = state.store_mut().await.create_media(new, Utc::now());
            tracing::info!(media_id = %id, file_name = %name, "Media asset added");
            Ok(redirect_with("/media", "success", &format!("Added {name}")).into_response())
        }
        Err(message) => {
            let page = form_page(&state, form, Some(message)).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Delete an asset.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<MediaId>,
) -> Result<Redirect, AppError> {
    let asset = state.store_mut().await.delete_media(id)?;
    tracing::info!(media_id = %id, "Media asset deleted");
    Ok(redirect_with(
        "/media",
        "success",
        &format!("Deleted {}", asset.file_name),
    ))
}

/// Bulk delete assets.
#[instrument(skip(state))]
pub async fn bulk(
    State(state): State<AppState>,
    Form(input): Form<BulkInput>,
) -> Result<Response, AppError> {
    if input.action != "delete" {
        return Err(unknown_action(&input.action));
    }
    let ids: Vec<MediaId> = input.parse_ids()?;
    let mut outcome = BulkOutcome::default();
    let mut store = state.store_mut().await;
    for id in ids {
        outcome.record(id, store.delete_media(id));
    }
    drop(store);

    Ok(outcome.into_response("/media", "deleted"))
}
