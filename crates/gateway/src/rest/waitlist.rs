//! Waitlist and contact form intake, plus the admin inbox

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tutorhub_database::{CreateWaitlistEntryRequest, WaitlistEntry, WaitlistStatus};
use tutorhub_mailer::{ContactMessage, MailOutcome};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::Caller;
use crate::state::GatewayState;

pub const DEFAULT_SOURCE: &str = "website";
pub const CONTACT_SOURCE: &str = "contact_form";

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinWaitlistRequest {
    pub name: String,
    pub email: String,
    pub message: String,
    pub source: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWaitlistRequest {
    /// `new`, `contacted` or `closed`.
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WaitlistEntryResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
    pub source: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContactResponse {
    pub entry: WaitlistEntryResponse,
    /// False when mail is not configured and the message was only stored.
    pub emailed: bool,
}

impl From<WaitlistEntry> for WaitlistEntryResponse {
    fn from(entry: WaitlistEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            email: entry.email,
            subject: entry.subject,
            message: entry.message,
            source: entry.source,
            status: entry.status.to_string(),
            created_at: entry.created_at,
        }
    }
}

pub fn create_waitlist_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/waitlist", post(join_waitlist))
        .route("/api/contact", post(contact))
        .route("/api/admin/waitlist", get(list_entries))
        .route(
            "/api/admin/waitlist/:entry_id",
            patch(update_entry).delete(delete_entry),
        )
}

fn required(field: &str, value: &str) -> GatewayResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(GatewayError::InvalidRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn required_email(value: &str) -> GatewayResult<String> {
    let email = required("email", value)?;
    if !email.contains('@') {
        return Err(GatewayError::InvalidRequest(
            "email must be a valid address".to_string(),
        ));
    }
    Ok(email)
}

#[utoipa::path(
    post,
    path = "/api/waitlist",
    tag = "Waitlist",
    request_body = JoinWaitlistRequest,
    responses(
        (status = 201, description = "Entry stored", body = WaitlistEntryResponse),
        (status = 400, description = "Missing field", body = ErrorResponse)
    )
)]
pub async fn join_waitlist(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<JoinWaitlistRequest>,
) -> GatewayResult<(StatusCode, Json<WaitlistEntryResponse>)> {
    let source = payload
        .source
        .as_deref()
        .map(str::trim)
        .filter(|source| !source.is_empty())
        .unwrap_or(DEFAULT_SOURCE)
        .to_string();

    let request = CreateWaitlistEntryRequest {
        name: required("name", &payload.name)?,
        email: required_email(&payload.email)?,
        subject: None,
        message: required("message", &payload.message)?,
        source,
    };

    let entry = state.waitlist().create(&request).await?;
    info!(entry = %entry.id, source = %entry.source, "waitlist entry received");
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    tag = "Waitlist",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message stored and relayed", body = ContactResponse),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 502, description = "Message stored but the e-mail could not be sent", body = ErrorResponse)
    )
)]
pub async fn contact(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<ContactRequest>,
) -> GatewayResult<(StatusCode, Json<ContactResponse>)> {
    let message = ContactMessage {
        name: required("name", &payload.name)?,
        email: required_email(&payload.email)?,
        subject: required("subject", &payload.subject)?,
        message: required("message", &payload.message)?,
    };

    let entry = state
        .waitlist()
        .create(&CreateWaitlistEntryRequest {
            name: message.name.clone(),
            email: message.email.clone(),
            subject: Some(message.subject.clone()),
            message: message.message.clone(),
            source: CONTACT_SOURCE.to_string(),
        })
        .await?;
    info!(entry = %entry.id, "contact message stored");

    let outcome = state.mailer().send_contact_message(&message).await?;

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            entry: entry.into(),
            emailed: outcome == MailOutcome::Sent,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/waitlist",
    tag = "Waitlist",
    responses(
        (status = 200, description = "Entries, newest first", body = Vec<WaitlistEntryResponse>),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn list_entries(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
) -> GatewayResult<Json<Vec<WaitlistEntryResponse>>> {
    caller.admin()?;
    let entries = state.waitlist().list().await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/api/admin/waitlist/{entry_id}",
    tag = "Waitlist",
    params(("entry_id" = String, Path, description = "Entry ID")),
    request_body = UpdateWaitlistRequest,
    responses(
        (status = 200, description = "Status changed", body = WaitlistEntryResponse),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    )
)]
pub async fn update_entry(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path(entry_id): Path<String>,
    Json(payload): Json<UpdateWaitlistRequest>,
) -> GatewayResult<Json<WaitlistEntryResponse>> {
    caller.admin()?;
    let status: WaitlistStatus = payload
        .status
        .parse()
        .map_err(GatewayError::InvalidRequest)?;

    let entry = state.waitlist().update_status(&entry_id, status).await?;
    Ok(Json(entry.into()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/waitlist/{entry_id}",
    tag = "Waitlist",
    params(("entry_id" = String, Path, description = "Entry ID")),
    responses(
        (status = 204, description = "Entry removed"),
        (status = 404, description = "Entry not found", body = ErrorResponse)
    )
)]
pub async fn delete_entry(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path(entry_id): Path<String>,
) -> GatewayResult<StatusCode> {
    caller.admin()?;
    state.waitlist().delete(&entry_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
