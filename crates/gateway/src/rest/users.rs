//! Admin user management endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use serde::Deserialize;
use tracing::info;
use tutorhub_database::{Role, UpdateUserRequest, UserStatus};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::Caller;
use crate::rest::auth::UserResponse;
use crate::state::GatewayState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    /// `pending`, `active` or `inactive`.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApproveUserRequest {
    pub courses: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserBody {
    pub role: Option<String>,
    pub status: Option<String>,
    pub assigned_courses: Option<Vec<String>>,
}

impl TryFrom<UpdateUserBody> for UpdateUserRequest {
    type Error = GatewayError;

    fn try_from(body: UpdateUserBody) -> Result<Self, Self::Error> {
        Ok(UpdateUserRequest {
            role: body.role.map(Role::from),
            status: body.status.as_deref().map(parse_status).transpose()?,
            assigned_courses: body.assigned_courses,
        })
    }
}

fn parse_status(raw: &str) -> GatewayResult<UserStatus> {
    raw.parse().map_err(GatewayError::InvalidRequest)
}

pub fn create_user_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/:user_id", patch(update_user))
        .route("/api/admin/users/:user_id/approve", post(approve_user))
        .route("/api/admin/users/:user_id/decline", post(decline_user))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users, oldest first", body = Vec<UserResponse>),
        (status = 400, description = "Unknown status filter", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<ListUsersQuery>,
) -> GatewayResult<Json<Vec<UserResponse>>> {
    caller.admin()?;
    let status = query.status.as_deref().map(parse_status).transpose()?;

    let users = state.user_service().list_users(status).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{user_id}/approve",
    tag = "Users",
    params(("user_id" = String, Path, description = "User public ID")),
    request_body = ApproveUserRequest,
    responses(
        (status = 200, description = "User approved as a student", body = UserResponse),
        (status = 400, description = "No course selected", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User is not pending", body = ErrorResponse)
    )
)]
pub async fn approve_user(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(payload): Json<ApproveUserRequest>,
) -> GatewayResult<Json<UserResponse>> {
    let admin = caller.admin()?;
    let user = state
        .user_service()
        .approve_user(&user_id, payload.courses)
        .await?;

    info!(admin = %admin.public_id, user = %user.public_id, courses = ?user.assigned_courses, "approved user");
    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/{user_id}/decline",
    tag = "Users",
    params(("user_id" = String, Path, description = "User public ID")),
    responses(
        (status = 204, description = "Pending user removed"),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User is not pending", body = ErrorResponse)
    )
)]
pub async fn decline_user(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
) -> GatewayResult<StatusCode> {
    let admin = caller.admin()?;
    state.user_service().decline_user(&user_id).await?;

    info!(admin = %admin.public_id, user = %user_id, "declined user");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{user_id}",
    tag = "Users",
    params(("user_id" = String, Path, description = "User public ID")),
    request_body = UpdateUserBody,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid edit", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "User is still pending", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserBody>,
) -> GatewayResult<Json<UserResponse>> {
    caller.admin()?;
    let request = UpdateUserRequest::try_from(payload)?;
    let user = state.user_service().update_user(&user_id, request).await?;
    Ok(Json(user.into()))
}
