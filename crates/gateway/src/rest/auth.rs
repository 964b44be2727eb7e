//! Authentication REST endpoints

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tutorhub_auth::AuthSession;
use tutorhub_config::AuthConfig;
use tutorhub_database::User;
use tutorhub_mailer::RegistrationAlert;
use utoipa::ToSchema;

use crate::error::{ErrorResponse, GatewayError, GatewayResult};
use crate::middleware::{Caller, SESSION_COOKIE};
use crate::state::GatewayState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub assigned_courses: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl SessionResponse {
    pub fn new(session: AuthSession, user: User) -> Self {
        Self {
            token: session.token,
            user: user.into(),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.public_id,
            name: user.name,
            email: user.email,
            role: user.role.to_string(),
            status: user.status.to_string(),
            assigned_courses: user.assigned_courses,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Create authentication routes
pub fn create_auth_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
}

pub fn session_cookie(config: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies)
        .build()
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Pending account created and signed in", body = SessionResponse),
        (status = 400, description = "Invalid sign-up form", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> GatewayResult<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let authenticator = state.authenticator();
    let user = authenticator
        .register_with_password(&payload.name, &payload.email, &payload.password)
        .await?;
    let session = authenticator.issue_session(user.id).await?;

    let alert = RegistrationAlert {
        name: user.name.clone(),
        email: user.email.clone(),
        user_id: user.public_id.clone(),
    };
    if let Err(error) = state.mailer().send_registration_alert(&alert).await {
        warn!(user = %user.public_id, %error, "registration alert failed");
    }

    let jar = jar.add(session_cookie(state.auth_config(), session.token.clone()));
    Ok((StatusCode::CREATED, jar, Json(SessionResponse::new(session, user))))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<Arc<GatewayState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> GatewayResult<(CookieJar, Json<SessionResponse>)> {
    let authenticator = state.authenticator();
    let session = authenticator
        .login_with_password(&payload.email, &payload.password)
        .await?;
    let user = authenticator.user_profile(session.user_id).await?;
    info!(user = %user.public_id, "signed in");

    let jar = jar.add(session_cookie(state.auth_config(), session.token.clone()));
    Ok((jar, Json(SessionResponse::new(session, user))))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Session revoked"),
        (status = 401, description = "No session", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<Arc<GatewayState>>,
    Extension(caller): Extension<Caller>,
    jar: CookieJar,
) -> GatewayResult<(CookieJar, StatusCode)> {
    let token = caller.token().ok_or_else(GatewayError::unauthenticated)?;
    state.authenticator().revoke_session(token).await?;

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, StatusCode::NO_CONTENT))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user information", body = UserResponse),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
pub async fn me(Extension(caller): Extension<Caller>) -> GatewayResult<Json<UserResponse>> {
    let user = caller.user()?;
    Ok(Json(UserResponse::from(user.clone())))
}
