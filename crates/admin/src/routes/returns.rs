//! Return request route handlers.

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, Redirect},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use meridian_core::order::ReturnRequest;
use meridian_core::{ReturnId, ReturnStatus};

use crate::{
    components::data_table::{DataTableConfig, returns_table_config},
    db::RepositoryError,
    error::AppError,
    filters,
    state::AppState,
};

use super::{Flash, orders::StatusOption, parse_filter, redirect_with, render};

/// Returns list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnsQuery {
    pub status: Option<String>,
    pub success: Option<String>,
    pub error: Option<String>,
}

/// Return row for templates.
#[derive(Debug, Clone)]
pub struct ReturnRow {
    pub id: i32,
    pub order_number: String,
    pub customer: String,
    pub reason: String,
    pub item_count: u32,
    pub refund_amount: String,
    pub requested_at: String,
    pub resolved_at: Option<String>,
    pub status: &'static str,
    pub status_label: &'static str,
    /// Decisions available from the current status.
    pub actions: Vec<StatusOption>,
}

impl From<&ReturnRequest> for ReturnRow {
    fn from(request: &ReturnRequest) -> Self {
        Self {
            id: request.id.as_i32(),
            order_number: request.order_number.to_string(),
            customer: request.customer.clone(),
            reason: request.reason.clone(),
            item_count: request.item_count,
            refund_amount: request.refund_amount.to_string(),
            requested_at: request.requested_at.format("%b %-d, %Y").to_string(),
            resolved_at: request
                .resolved_at
                .map(|at| at.format("%b %-d, %Y").to_string()),
            status: request.status.as_str(),
            status_label: request.status.label(),
            actions: ReturnStatus::ALL
                .iter()
                .filter(|next| request.status.can_transition_to(**next))
                .map(|next| StatusOption {
                    value: next.as_str(),
                    label: action_label(*next),
                })
                .collect(),
        }
    }
}

const fn action_label(status: ReturnStatus) -> &'static str {
    match status {
        ReturnStatus::Approved => "Approve",
        ReturnStatus::Rejected => "Reject",
        ReturnStatus::Refunded => "Mark refunded",
        ReturnStatus::Requested => "Reopen",
    }
}

/// Returns list page template.
#[derive(Template)]
#[template(path = "returns/index.html")]
pub struct ReturnsIndexTemplate {
    pub current_path: String,
    pub flash: Flash,
    pub table: DataTableConfig,
    pub returns: Vec<ReturnRow>,
}

/// Returns list page handler.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ReturnsQuery>,
) -> Result<Html<String>, AppError> {
    let status = parse_filter::<ReturnStatus>(query.status.as_deref());
    let returns: Vec<ReturnRow> = state
        .store()
        .await
        .returns(status)
        .into_iter()
        .map(ReturnRow::from)
        .collect();

    let template = ReturnsIndexTemplate {
        current_path: "/returns".to_string(),
        flash: Flash::new(query.success, query.error),
        table: returns_table_config().with_value("status", status.map(|s| s.as_str())),
        returns,
    };

    render(&template)
}

/// Form input for return decisions.
#[derive(Debug, Deserialize)]
pub struct ReturnStatusInput {
    pub status: String,
}

/// Approve, reject or refund a return request.
#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<ReturnId>,
    Form(input): Form<ReturnStatusInput>,
) -> Result<Redirect, AppError> {
    let status: ReturnStatus = input
        .status
        .parse()
        .map_err(|e: meridian_core::InvalidStatus| AppError::BadRequest(e.to_string()))?;

    let result = state
        .store_mut()
        .await
        .update_return_status(id, status, Utc::now());
    match result {
        Ok(()) => {
            tracing::info!(return_id = %id, status = %status, "Return status updated");
            Ok(redirect_with(
                "/returns",
                "success",
                &format!("Return #{id} {}", status.label().to_lowercase()),
            ))
        }
        Err(RepositoryError::InvalidState(message)) => {
            Ok(redirect_with("/returns", "error", &message))
        }
        Err(e) => Err(e.into()),
    }
}
