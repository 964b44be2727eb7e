//! Guarded pages. Each handler runs only after the page guard allowed it.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    middleware,
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use tutorhub_database::{Role, UserStatus};
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayResult};
use crate::middleware::{page_guard, Caller};
use crate::rest::auth::UserResponse;
use crate::rest::courses::CourseResponse;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    pub file_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum DashboardResponse {
    Admin {
        courses: Vec<CourseSummary>,
        active_users: Vec<UserResponse>,
        pending_users: Vec<UserResponse>,
    },
    Student {
        name: String,
        assigned_courses: Vec<String>,
    },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingResponse {
    pub name: String,
    pub email: String,
    pub message: String,
}

pub fn create_page_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/pending", get(pending))
        .route("/courses/:course_id", get(course_page))
        .route_layer(middleware::from_fn(page_guard))
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Pages",
    responses(
        (status = 200, description = "Admin or student dashboard", body = DashboardResponse),
        (status = 202, description = "Profile still loading"),
        (status = 303, description = "Guard redirect")
    )
)]
pub async fn dashboard(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
) -> GatewayResult<Json<DashboardResponse>> {
    let user = caller.user()?;

    if user.role != Role::Admin {
        return Ok(Json(DashboardResponse::Student {
            name: user.name.clone(),
            assigned_courses: user.assigned_courses.clone(),
        }));
    }

    let courses = state
        .course_service()
        .list_for(user)
        .await?
        .into_iter()
        .map(|view| CourseSummary {
            file_count: view.course.files.len(),
            id: view.course.id,
            name: view.course.name,
        })
        .collect();

    let users = state.user_service();
    let active_users = users.list_users(Some(UserStatus::Active)).await?;
    let pending_users = users.list_users(Some(UserStatus::Pending)).await?;

    Ok(Json(DashboardResponse::Admin {
        courses,
        active_users: active_users.into_iter().map(UserResponse::from).collect(),
        pending_users: pending_users.into_iter().map(UserResponse::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/pending",
    tag = "Pages",
    responses(
        (status = 200, description = "Waiting page for pending accounts", body = PendingResponse),
        (status = 303, description = "Guard redirect")
    )
)]
pub async fn pending(Extension(caller): Extension<Caller>) -> GatewayResult<Json<PendingResponse>> {
    let user = caller.user()?;
    Ok(Json(PendingResponse {
        name: user.name.clone(),
        email: user.email.clone(),
        message: "Your account is waiting for approval. You will get access once an admin assigns you a course.".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/courses/{course_id}",
    tag = "Pages",
    params(("course_id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course page", body = CourseResponse),
        (status = 303, description = "Guard redirect"),
        (status = 403, description = "Not assigned to this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    )
)]
pub async fn course_page(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path(course_id): Path<String>,
) -> GatewayResult<Json<CourseResponse>> {
    let user = caller.user()?;
    let view = state.course_service().course_for(user, &course_id).await?;
    Ok(Json(view.into()))
}
