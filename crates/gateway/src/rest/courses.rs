//! Course and course file endpoints

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use tutorhub_courses::{CourseView, FileUpload};
use tutorhub_database::CourseFile;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::Caller;
use crate::state::GatewayState;

/// Slack on top of the upload limit for multipart framing and text fields.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub files: Vec<CourseFileResponse>,
    pub can_manage: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseFileResponse {
    pub id: String,
    pub name: String,
    pub url: String,
    pub size: i64,
    pub uploaded_at: String,
    pub uploaded_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_users: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePermissionsRequest {
    /// Student public ids. `null` or an empty list limits the file to admins.
    pub allowed_users: Option<Vec<String>>,
}

impl From<CourseView> for CourseResponse {
    fn from(view: CourseView) -> Self {
        let course = view.course;
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            files: course.files.into_iter().map(CourseFileResponse::from).collect(),
            can_manage: view.can_manage,
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

impl From<CourseFile> for CourseFileResponse {
    fn from(file: CourseFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            url: file.url,
            size: file.size,
            uploaded_at: file.uploaded_at,
            uploaded_by: file.uploaded_by,
            allowed_users: file.allowed_users,
        }
    }
}

pub fn create_course_routes(upload_limit: usize) -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/:course_id", get(get_course))
        .route(
            "/api/courses/:course_id/files",
            post(upload_file).layer(DefaultBodyLimit::max(
                upload_limit.saturating_add(MULTIPART_OVERHEAD),
            )),
        )
        .route("/api/courses/:course_id/files/:file_id", delete(delete_file))
        .route(
            "/api/courses/:course_id/files/:file_id/permissions",
            put(update_permissions),
        )
        .route(
            "/api/courses/:course_id/files/:file_id/download",
            get(download_file),
        )
}

#[utoipa::path(
    get,
    path = "/api/courses",
    tag = "Courses",
    responses(
        (status = 200, description = "Courses the caller may open", body = Vec<CourseResponse>),
        (status = 401, description = "Not signed in", body = ErrorResponse),
        (status = 403, description = "Role may not open courses", body = ErrorResponse)
    )
)]
pub async fn list_courses(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
) -> GatewayResult<Json<Vec<CourseResponse>>> {
    let user = caller.user()?;
    let views = state.course_service().list_for(user).await?;
    Ok(Json(views.into_iter().map(CourseResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    tag = "Courses",
    params(("course_id" = String, Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course with the files visible to the caller", body = CourseResponse),
        (status = 403, description = "Not assigned to this course", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse)
    )
)]
pub async fn get_course(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path(course_id): Path<String>,
) -> GatewayResult<Json<CourseResponse>> {
    let user = caller.user()?;
    let view = state.course_service().course_for(user, &course_id).await?;
    Ok(Json(view.into()))
}

#[utoipa::path(
    post,
    path = "/api/courses/{course_id}/files",
    tag = "Courses",
    params(("course_id" = String, Path, description = "Course ID")),
    request_body(
        content = String,
        content_type = "multipart/form-data",
        description = "`file` plus optional repeated `allowed_user` fields"
    ),
    responses(
        (status = 201, description = "File stored", body = CourseFileResponse),
        (status = 400, description = "Missing or invalid file", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path(course_id): Path<String>,
    multipart: Multipart,
) -> GatewayResult<(StatusCode, Json<CourseFileResponse>)> {
    let admin = caller.admin()?;
    let upload = read_upload(multipart).await?;

    let file = state
        .course_service()
        .upload_file(admin, &course_id, upload)
        .await?;
    Ok((StatusCode::CREATED, Json(file.into())))
}

async fn read_upload(mut multipart: Multipart) -> GatewayResult<FileUpload> {
    let mut file: Option<(String, Bytes)> = None;
    let mut allowed_users: Option<Vec<String>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| GatewayError::InvalidRequest(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| GatewayError::InvalidRequest(format!("invalid file: {err}")))?;
                file = Some((name, data));
            }
            "allowed_user" => {
                let id = field
                    .text()
                    .await
                    .map_err(|err| GatewayError::InvalidRequest(format!("invalid allowed_user: {err}")))?;
                allowed_users.get_or_insert_with(Vec::new).push(id);
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| GatewayError::InvalidRequest("file is required".to_string()))?;

    Ok(FileUpload {
        file_name,
        data,
        allowed_users,
    })
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}/files/{file_id}/permissions",
    tag = "Courses",
    params(
        ("course_id" = String, Path, description = "Course ID"),
        ("file_id" = String, Path, description = "File ID")
    ),
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Allow-list replaced", body = CourseFileResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Course or file not found", body = ErrorResponse)
    )
)]
pub async fn update_permissions(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path((course_id, file_id)): Path<(String, String)>,
    Json(payload): Json<UpdatePermissionsRequest>,
) -> GatewayResult<Json<CourseFileResponse>> {
    caller.admin()?;
    let file = state
        .course_service()
        .set_permissions(&course_id, &file_id, payload.allowed_users)
        .await?;
    Ok(Json(file.into()))
}

#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}/files/{file_id}",
    tag = "Courses",
    params(
        ("course_id" = String, Path, description = "Course ID"),
        ("file_id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "Blob and entry removed"),
        (status = 403, description = "Admin role required", body = ErrorResponse),
        (status = 404, description = "Course or file not found", body = ErrorResponse),
        (status = 500, description = "Entry could not be removed after the blob was deleted", body = ErrorResponse)
    )
)]
pub async fn delete_file(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path((course_id, file_id)): Path<(String, String)>,
) -> GatewayResult<StatusCode> {
    caller.admin()?;
    state.course_service().delete_file(&course_id, &file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}/files/{file_id}/download",
    tag = "Courses",
    params(
        ("course_id" = String, Path, description = "Course ID"),
        ("file_id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 403, description = "File not shared with the caller", body = ErrorResponse),
        (status = 404, description = "Course or file not found", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    Path((course_id, file_id)): Path<(String, String)>,
) -> GatewayResult<Response> {
    let user = caller.user()?;
    let (file, data) = state
        .course_service()
        .download(user, &course_id, &file_id)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&file.name)),
        ],
        Body::from(data),
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 `filename*`.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| match c {
            ' ' | '!' | '#'..='[' | ']'..='~' => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(name, NON_ALPHANUMERIC)
    )
}
