//! Email campaign route handlers.
//!
//! Campaigns are never delivered; "send" only records the send time.

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

use meridian_core::marketing::EmailCampaign;
use meridian_core::{CampaignId, CampaignStatus, Email};

use crate::{
    components::data_table::{DataTableConfig, campaigns_table_config},
    db::{NewCampaign, RepositoryError},
    error::AppError,
    filters,
    routes::{
        BulkInput, BulkOutcome, Flash, parse_datetime, parse_filter, redirect_with, render,
        unknown_action,
    },
    state::AppState,
};

const LIST_PATH: &str = "/marketing/campaigns";

/// Audience segments and their subscriber counts.
pub const SEGMENTS: &[(&str, u32)] = &[
    ("All subscribers", 12_480),
    ("Repeat customers", 4_210),
    ("Lapsed 90 days", 3_120),
    ("VIP customers", 860),
];

/// Default sender address for new campaigns.
const DEFAULT_FROM: &str = "hello@meridian.example";

/// Campaign list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CampaignsQuery {
    pub status: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Campaign row for templates.
#[derive(Debug, Clone)]
pub struct CampaignRow {
    pub id: i32,
    pub name: String,
    pub subject: String,
    pub from: String,
    pub segment: String,
    pub status: &'static str,
    pub status_label: &'static str,
    pub recipients: u32,
    pub open_rate: String,
    /// When it was or will be sent.
    pub when: String,
    pub can_schedule: bool,
    pub can_send: bool,
}

impl From<&EmailCampaign> for CampaignRow {
    fn from(campaign: &EmailCampaign) -> Self {
        let when = match campaign.status {
            CampaignStatus::Sent => campaign.sent_at,
            CampaignStatus::Scheduled => campaign.scheduled_at,
            CampaignStatus::Draft => None,
        };
        Self {
            id: campaign.id.as_i32(),
            name: campaign.name.clone(),
            subject: campaign.subject.clone(),
            from: campaign.from.to_string(),
            segment: campaign.segment.clone(),
            status: campaign.status.as_str(),
            status_label: campaign.status.label(),
            recipients: campaign.recipients,
            open_rate: campaign
                .open_rate
                .map_or_else(|| "-".to_string(), |rate| format!("{:.1}%", rate * 100.0)),
            when: when.map_or_else(String::new, |at| at.format("%b %-d, %Y %H:%M").to_string()),
            can_schedule: campaign.status == CampaignStatus::Draft,
            can_send: campaign.status != CampaignStatus::Sent,
        }
    }
}

/// Campaigns list page template.
#[derive(Template)]
#[template(path = "marketing/campaigns/index.html")]
pub struct CampaignsIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub table: DataTableConfig,
    pub campaigns: Vec<CampaignRow>,
}

/// Campaigns list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CampaignsQuery>,
) -> Result<Html<String>, AppError> {
    let status = parse_filter::<CampaignStatus>(query.status.as_deref());
    let campaigns = state
        .store()
        .await
        .campaigns(status)
        .into_iter()
        .map(CampaignRow::from)
        .collect();

    render(&CampaignsIndexTemplate {
        current_path: LIST_PATH.to_string(),
        flash: Flash::new(query.success, query.error),
        table: campaigns_table_config().with_value("status", status.map(|s| s.as_str())),
        campaigns,
    })
}

/// Form input for new campaigns.
#[derive(Debug, Default, Deserialize)]
pub struct CampaignForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub segment: String,
}

impl CampaignForm {
    fn validate(&self) -> Result<NewCampaign, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required".to_string());
        }
        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err("Subject is required".to_string());
        }
        let from = Email::parse(&self.from).map_err(|e| format!("From address: {e}"))?;
        let (segment, recipients) = SEGMENTS
            .iter()
            .find(|(segment, _)| *segment == self.segment)
            .ok_or_else(|| format!("Unknown segment: {}", self.segment))?;

        Ok(NewCampaign {
            name: name.to_string(),
            subject: subject.to_string(),
            from,
            segment: (*segment).to_string(),
            recipients: *recipients,
        })
    }
}

/// New campaign form template.
#[derive(Template)]
#[template(path = "marketing/campaigns/new.html")]
pub struct CampaignNewTemplate {
    pub current_path: String,
    pub form: CampaignForm,
    pub segments: Vec<(&'static str, u32)>,
    pub error: Option<String>,
}

fn form_template(form: CampaignForm, error: Option<String>) -> CampaignNewTemplate {
    CampaignNewTemplate {
        current_path: LIST_PATH.to_string(),
        form,
        segments: SEGMENTS.to_vec(),
        error,
    }
}

/// New campaign form handler.
#[instrument]
pub async fn new_campaign() -> Result<Html<String>, AppError> {
    render(&form_template(
        CampaignForm {
            from: DEFAULT_FROM.to_string(),
            segment: "All subscribers".to_string(),
            ..CampaignForm::default()
        },
        None,
    ))
}

/// Create a campaign draft.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<CampaignForm>,
) -> Result<Response, AppError> {
    match form.validate() {
        Ok(new) => {
            let id = state.store_mut().await.create_campaign(new, Utc::now());
            tracing::info!(campaign_id = %id, "Campaign draft created");
            Ok(redirect_with(
                LIST_PATH,
                "success",
                &format!("Saved draft {}", form.name.trim()),
            )
            .into_response())
        }
        Err(message) => {
            let page = render(&form_template(form, Some(message)))?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}

/// Form input for scheduling.
#[derive(Debug, Deserialize)]
pub struct ScheduleInput {
    #[serde(default)]
    pub scheduled_at: String,
}

/// Schedule a draft campaign.
#[instrument(skip(state))]
pub async fn schedule(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
    Form(input): Form<ScheduleInput>,
) -> Result<Redirect, AppError> {
    let at = match parse_datetime("Send time", Some(&input.scheduled_at)) {
        Ok(Some(at)) => at,
        Ok(None) => return Ok(redirect_with(LIST_PATH, "error", "Pick a send time")),
        Err(message) => return Ok(redirect_with(LIST_PATH, "error", &message)),
    };

    let result = state
        .store_mut()
        .await
        .schedule_campaign(id, at, Utc::now());
    transition_redirect(result, id, "scheduled")
}

/// Mark a campaign as sent.
#[instrument(skip(state))]
pub async fn send(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
) -> Result<Redirect, AppError> {
    let result = state.store_mut().await.send_campaign(id, Utc::now());
    transition_redirect(result, id, "sent")
}

fn transition_redirect(
    result: Result<(), RepositoryError>,
    id: CampaignId,
    done: &str,
) -> Result<Redirect, AppError> {
    match result {
        Ok(()) => {
            tracing::info!(campaign_id = %id, status = done, "Campaign updated");
            Ok(redirect_with(
                LIST_PATH,
                "success",
                &format!("Campaign #{id} {done}"),
            ))
        }
        Err(RepositoryError::InvalidState(message)) => {
            Ok(redirect_with(LIST_PATH, "error", &message))
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete a campaign.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<CampaignId>,
) -> Result<Redirect, AppError> {
    let campaign = state.store_mut().await.delete_campaign(id)?;
    tracing::info!(campaign_id = %id, "Campaign deleted");
    Ok(redirect_with(
        LIST_PATH,
        "success",
        &format!("Deleted {}", campaign.name),
    ))
}

/// Bulk delete campaigns.
#[instrument(skip(state))]
pub async fn bulk(
    State(state): State<AppState>,
    Form(input): Form<BulkInput>,
) -> Result<Response, AppError> {
    if input.action != "delete" {
        return Err(unknown_action(&input.action));
    }
    let ids: Vec<CampaignId> = input.parse_ids()?;
    let mut outcome = BulkOutcome::default();
    let mut store = state.store_mut().await;
    for id in ids {
        outcome.record(id, store.delete_campaign(id));
    }
    drop(store);

    Ok(outcome.into_response(LIST_PATH, "deleted"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_sets_recipients() {
        let form = CampaignForm {
            name: "Restock".to_string(),
            subject: "Back in stock".to_string(),
            from: DEFAULT_FROM.to_string(),
            segment: "VIP customers".to_string(),
        };
        let new = form.validate().unwrap();
        assert_eq!(new.recipients, 860);
    }

    #[test]
    fn test_rejects_bad_sender_and_segment() {
        let form = CampaignForm {
            name: "Restock".to_string(),
            subject: "Back in stock".to_string(),
            from: "not-an-email".to_string(),
            segment: "VIP customers".to_string(),
        };
        assert!(form.validate().unwrap_err().starts_with("From address"));

        let form = CampaignForm {
            from: DEFAULT_FROM.to_string(),
            segment: "Everyone".to_string(),
            ..form
        };
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_row_actions_follow_status() {
        let seed = meridian_core::seed::SeedData::load().unwrap();
        let rows: Vec<CampaignRow> = seed.campaigns.iter().map(CampaignRow::from).collect();
        let sent = rows.iter().find(|r| r.status == "sent").unwrap();
        assert!(!sent.can_send && !sent.can_schedule);
        assert_eq!(sent.open_rate, "41.0%");
        let draft = rows.iter().find(|r| r.status == "draft").unwrap();
        assert!(draft.can_send && draft.can_schedule);
    }
}
